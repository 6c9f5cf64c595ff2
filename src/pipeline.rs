//! Concurrent rewriting of an archive's content documents.
//!
//! The work set is fixed up front from a snapshot of the archive listing. A
//! pool of at most `parallelism` blocking workers drains it; every document is
//! attempted even after one fails, and only the first failure is reported.

use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinSet;
use tracing::debug;

use crate::archive::VirtualArchive;
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::transform::ContentTransform;

/// Suffixes of documents handed to the content transform. Matched case-sensitively.
pub const CONTENT_SUFFIXES: &[&str] = &[".html", ".xhtml", ".htm"];

pub fn is_content_file(path: &str) -> bool {
    CONTENT_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// The content documents currently in `archive`.
pub fn content_files(archive: &VirtualArchive) -> Vec<String> {
    archive
        .list()
        .into_iter()
        .filter(|path| is_content_file(path))
        .collect()
}

/// The first error any worker reports. Later errors are discarded, not queued.
#[derive(Default)]
struct FirstError(Mutex<Option<Error>>);

impl FirstError {
    fn record(&self, err: Error) {
        let mut slot = self.0.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn take(&self) -> Option<Error> {
        self.0.lock().take()
    }
}

/// Everything the workers share for one run.
struct Run {
    archive: Arc<VirtualArchive>,
    transform: Arc<dyn ContentTransform>,
    progress: Option<Arc<dyn Progress>>,
    queue: Mutex<std::vec::IntoIter<String>>,
    failure: FirstError,
    done: AtomicUsize,
    total: usize,
}

impl Run {
    fn next(&self) -> Option<String> {
        self.queue.lock().next()
    }

    fn work(&self) {
        while let Some(path) = self.next() {
            match self.process(&path) {
                Ok(()) => {
                    let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(progress) = &self.progress {
                        progress.content_processed(&path, done, self.total);
                    }
                }
                Err(err) => {
                    debug!(path = %path, error = %err, "content file failed");
                    self.failure.record(err);
                }
            }
        }
    }

    fn process(&self, path: &str) -> Result<()> {
        let bytes = self
            .archive
            .read(path)
            .ok_or_else(|| Error::ReadMissing(path.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|err| Error::ContentTransform {
            path: path.to_string(),
            source: Box::new(err),
        })?;
        let transformed =
            self.transform
                .transform(&text)
                .map_err(|source| Error::ContentTransform {
                    path: path.to_string(),
                    source,
                })?;
        self.archive.write(path, transformed);
        Ok(())
    }
}

/// Replace every content document in `archive` with its transformed text.
///
/// At most `parallelism` transforms run at once. All documents are attempted;
/// if any failed, the first recorded error is returned and the others are
/// dropped. Documents that succeeded keep their new content either way.
/// Returns how many documents were transformed.
pub async fn transform_content(
    archive: Arc<VirtualArchive>,
    transform: Arc<dyn ContentTransform>,
    parallelism: NonZeroUsize,
    progress: Option<Arc<dyn Progress>>,
) -> Result<usize> {
    let work = content_files(&archive);
    let total = work.len();
    let workers = parallelism.get().min(total);
    debug!(total, workers, "processing content files");

    let run = Arc::new(Run {
        archive,
        transform,
        progress,
        queue: Mutex::new(work.into_iter()),
        failure: FirstError::default(),
        done: AtomicUsize::new(0),
        total,
    });

    let mut pool = JoinSet::new();
    for _ in 0..workers {
        let run = Arc::clone(&run);
        pool.spawn_blocking(move || run.work());
    }

    let mut panicked = None;
    while let Some(joined) = pool.join_next().await {
        if let Err(err) = joined {
            if err.is_panic() && panicked.is_none() {
                panicked = Some(err.into_panic());
            }
        }
    }
    if let Some(payload) = panicked {
        panic::resume_unwind(payload);
    }

    match run.failure.take() {
        Some(err) => Err(err),
        None => Ok(run.done.load(Ordering::Relaxed)),
    }
}
