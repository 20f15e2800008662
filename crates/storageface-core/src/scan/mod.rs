//! Folder enumeration.
//!
//! Walks the job folder recursively (file-name order, symlinks not followed),
//! keeps regular files that no ignore pattern matches, and produces one
//! `FileTask` per file with its destination path in the repository.

mod ignore;

pub use ignore::{preset_pattern, IgnoreSet, PRESETS};

use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::error::JobError;
use crate::job::UploadJob;
use crate::tasks::FileTask;

/// Enumerates the files `job` would upload, in enumeration order.
///
/// Only an error on the job folder itself aborts the scan. Entries below it
/// that cannot be read (unreadable directory, file removed mid-walk) are
/// logged and skipped.
pub fn enumerate(job: &UploadJob) -> Result<Vec<FileTask>, JobError> {
    enumerate_entries(job, walker(&job.folder))
}

fn walker(folder: &Path) -> WalkDir {
    WalkDir::new(folder).follow_links(false).sort_by_file_name()
}

fn enumerate_entries<I>(job: &UploadJob, entries: I) -> Result<Vec<FileTask>, JobError>
where
    I: IntoIterator<Item = walkdir::Result<DirEntry>>,
{
    let ignore = IgnoreSet::new(&job.ignore_patterns)?;
    let mut tasks = Vec::new();
    let mut ignored = 0usize;
    let mut unreadable = 0usize;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(JobError::Scan {
                    path: job.folder.clone(),
                    source: e.into(),
                });
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                tracing::warn!(path = %path.display(), "skipping unreadable entry: {}", e);
                unreadable += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_slash_path(&job.folder, entry.path()) else {
            continue;
        };
        if !ignore.is_empty() && ignore.is_ignored(&relative) {
            ignored += 1;
            continue;
        }
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), "skipping unreadable file: {}", e);
                unreadable += 1;
                continue;
            }
        };
        tasks.push(FileTask::new(
            entry.path().to_path_buf(),
            job.destination_for(&relative),
            size,
        ));
    }

    tracing::debug!(
        folder = %job.folder.display(),
        files = tasks.len(),
        ignored,
        unreadable,
        "enumerated upload folder"
    );
    Ok(tasks)
}

/// `path` relative to `root`, joined with `/` regardless of platform.
fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
