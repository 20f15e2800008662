//! Shared per-job state handed to every worker.

use std::sync::mpsc;
use std::sync::Arc;

use crate::job::UploadJob;
use crate::progress::ProgressAggregator;
use crate::tasks::TaskList;
use crate::uploader::Uploader;

/// Log-stream item emitted by workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Started {
        index: usize,
        destination: String,
        size: u64,
    },
    Uploaded {
        index: usize,
        destination: String,
        size: u64,
    },
    Failed {
        index: usize,
        destination: String,
        error: String,
    },
}

/// Everything a worker needs; there is no global job state.
pub struct JobContext {
    pub job: UploadJob,
    pub tasks: TaskList,
    pub progress: Arc<ProgressAggregator>,
    pub uploader: Arc<dyn Uploader>,
    pub events: Option<mpsc::Sender<UploadEvent>>,
}

impl JobContext {
    pub(super) fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            // Receiver gone just means nobody is watching.
            let _ = tx.send(event);
        }
    }
}
