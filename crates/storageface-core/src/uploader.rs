//! The seam between the upload driver and whatever moves bytes to the hub.

use std::path::Path;

use crate::error::{JobError, UploadError};
use crate::job::UploadJob;

/// One file as handed to the transport.
#[derive(Debug, Clone, Copy)]
pub struct FileUpload<'a> {
    pub local_path: &'a Path,
    /// `/`-separated destination inside the repository.
    pub destination: &'a str,
    pub size: u64,
}

/// Transport used by the driver. Implementations must be callable from
/// several worker threads at once.
pub trait Uploader: Send + Sync {
    /// Job-level checks run once before any worker starts (authenticate,
    /// make sure the repository exists). The default does nothing.
    fn prepare(&self, _job: &UploadJob) -> Result<(), JobError> {
        Ok(())
    }

    /// Uploads one file. `progress` receives the cumulative number of bytes
    /// of this file sent so far; it may be called any number of times,
    /// including with values that go backwards after an internal retry.
    fn upload_file(
        &self,
        job: &UploadJob,
        file: FileUpload<'_>,
        progress: &mut dyn FnMut(u64),
    ) -> Result<(), UploadError>;
}
