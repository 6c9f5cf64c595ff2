//! In-memory store for the files of an unpacked archive.
//!
//! Every operation normalizes its path first, so `OEBPS/./text/../chap1.xhtml`
//! and `OEBPS/chap1.xhtml` name the same entry.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Lexically clean a slash-separated path.
///
/// Repeated slashes collapse, `.` segments are dropped, `name/..` pairs cancel,
/// a trailing slash is removed. Leading `..` segments of a relative path are
/// kept; a `..` directly under the root is dropped. An empty result is `.`.
/// Case is preserved and backslashes are ordinary characters.
pub fn normalize(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Files of one archive, keyed by normalized path.
///
/// Reads run concurrently; writes and removals take the lock exclusively.
/// Directories are never stored, only the files under them.
#[derive(Debug, Default)]
pub struct VirtualArchive {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl VirtualArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.read().contains_key(&normalize(path))
    }

    /// Insert or replace an entry.
    pub fn write(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let path = normalize(path);
        let contents = contents.into();
        self.files.write().insert(path, contents);
    }

    /// A copy of an entry's bytes, or `None` if there is no such entry.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(&normalize(path)).cloned()
    }

    /// Remove exactly one entry, reporting whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.files.write().remove(&normalize(path)).is_some()
    }

    /// Remove every entry whose path starts with `prefix`, the prefix itself included.
    ///
    /// The match is on the string, not on path segments: `thumbs.db` also
    /// removes `thumbs.db.bak`. Returns whether anything was removed.
    pub fn remove_all(&self, prefix: &str) -> bool {
        let prefix = normalize(prefix);
        let mut files = self.files.write();
        let before = files.len();
        files.retain(|path, _| !path.starts_with(&prefix));
        files.len() != before
    }

    /// Every stored path, in no particular order.
    ///
    /// The listing is a snapshot; the store may be changed while it is walked.
    pub fn list(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}
