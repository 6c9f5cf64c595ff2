//! Progress notifications for whoever drives a conversion.

use tracing::{debug, info};

use crate::convert::Stage;

/// Receives milestones of a conversion.
///
/// Both methods default to doing nothing; a missing sink and a no-op sink
/// behave the same.
pub trait Progress: Send + Sync {
    /// A stage is about to run.
    fn stage(&self, _stage: Stage) {}

    /// A content document was transformed and written back.
    fn content_processed(&self, _path: &str, _done: usize, _total: usize) {}
}

/// Reports progress as `tracing` events.
#[derive(Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn stage(&self, stage: Stage) {
        info!("{stage}");
    }

    fn content_processed(&self, path: &str, done: usize, total: usize) {
        debug!(path, "processed content file {done}/{total}");
    }
}
