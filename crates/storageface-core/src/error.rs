//! Error types shared across the engine.
//!
//! `UploadError` is what the transport returns for a single request or file;
//! it is classified for retries and, in the driver, recorded on the failing
//! `FileTask`. `JobError` aborts a whole job before any worker starts.

use std::path::PathBuf;

/// Failure of one hub request or one file upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Hub answered with a non-2xx status.
    #[error("HTTP {status}{}", fmt_message(.message))]
    Http { status: u32, message: String },
    /// Reading the local file failed (permission denied, vanished, ...).
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// File exceeds the configured inline commit limit; it is never read.
    #[error("{}: {size} bytes exceeds the {limit} byte upload limit", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    /// Hub answered 2xx with a body we could not understand.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

fn fmt_message(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {}", message)
    }
}

impl UploadError {
    pub fn status(&self) -> Option<u32> {
        match self {
            UploadError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Job-level failure: nothing has been uploaded when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("a hub token is required (pass --token or set HF_TOKEN)")]
    MissingToken,
    #[error("repository id must look like 'owner/name', got '{0}'")]
    InvalidRepoId(String),
    #[error("folder '{}' does not exist or is not a directory", .0.display())]
    FolderNotFound(PathBuf),
    #[error("path in repository '{0}' must not contain '..' components")]
    InvalidPathInRepo(String),
    #[error("invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("authentication failed: {0}")]
    Auth(#[source] UploadError),
    #[error("repository '{repo}' unavailable: {source}")]
    Repo {
        repo: String,
        #[source]
        source: UploadError,
    },
    #[error("no files to upload in '{}' after applying ignore patterns", .0.display())]
    NothingToUpload(PathBuf),
    #[error("upload worker panicked")]
    WorkerPanicked,
}
