//! Removal of files other tools leave behind in EPUBs.

use tracing::debug;

use crate::archive::VirtualArchive;

/// Prefixes of bookkeeping files added by calibre, iTunes and desktop file managers.
pub const JUNK_PREFIXES: &[&str] = &[
    "META-INF/calibre_bookmarks.txt",
    "META-INF/iTunesMetadata.plist",
    "META-INF/iTunesArtwork.plist",
    "META-INF/.DS_STORE",
    "META-INF/thumbs.db",
    ".DS_STORE",
    "thumbs.db",
    "iTunesMetadata.plist",
    "iTunesArtwork.plist",
];

/// Remove every entry under a [`JUNK_PREFIXES`] prefix.
///
/// Cannot fail; missing junk is simply not removed. Returns how many of the
/// prefixes matched something.
pub fn sanitize(archive: &VirtualArchive) -> usize {
    JUNK_PREFIXES
        .iter()
        .filter(|prefix| {
            let removed = archive.remove_all(prefix);
            if removed {
                debug!(prefix, "removed junk");
            }
            removed
        })
        .count()
}
