//! Concurrent folder upload driver.
//!
//! Validates the job, lets the transport prepare (auth, repository), enumerates
//! the folder into `FileTask`s and runs a bounded pool of worker threads that
//! claim tasks from a shared `TaskList`. A failed file is recorded on its task
//! and the other files keep going; the driver never retries on its own.

mod context;
mod worker;

pub use context::{JobContext, UploadEvent};

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::error::JobError;
use crate::job::UploadJob;
use crate::progress::ProgressAggregator;
use crate::scan;
use crate::tasks::{FileTask, TaskList, TaskStatus};
use crate::uploader::Uploader;

/// Outcome of one job (or several, when merged in per-folder mode).
#[derive(Debug, Clone, Default)]
pub struct UploadSummary {
    pub files_total: usize,
    pub files_uploaded: usize,
    pub files_failed: usize,
    pub bytes_uploaded: u64,
    pub elapsed: Duration,
    /// Every task in enumeration order, in its terminal state.
    pub tasks: Vec<FileTask>,
}

impl UploadSummary {
    fn from_tasks(tasks: Vec<FileTask>, elapsed: Duration) -> Self {
        let mut s = UploadSummary {
            files_total: tasks.len(),
            elapsed,
            ..UploadSummary::default()
        };
        for t in &tasks {
            match t.status {
                TaskStatus::Done => {
                    s.files_uploaded += 1;
                    s.bytes_uploaded += t.size;
                }
                _ => s.files_failed += 1,
            }
        }
        s.tasks = tasks;
        s
    }

    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileTask> {
        self.tasks.iter().filter(|t| t.status != TaskStatus::Done)
    }

    /// Folds another job's summary into this one.
    pub fn merge(&mut self, other: UploadSummary) {
        self.files_total += other.files_total;
        self.files_uploaded += other.files_uploaded;
        self.files_failed += other.files_failed;
        self.bytes_uploaded += other.bytes_uploaded;
        self.elapsed += other.elapsed;
        self.tasks.extend(other.tasks);
    }
}

/// Runs one upload job to completion.
///
/// Job-level problems (invalid inputs, failed authentication, nothing to
/// upload) are returned as `Err` before any worker starts. Per-file failures
/// end up in the summary. `progress` may be shared with a display thread;
/// `events`, when given, receives one `UploadEvent` per state change.
pub fn run_upload(
    job: UploadJob,
    uploader: Arc<dyn Uploader>,
    progress: Arc<ProgressAggregator>,
    events: Option<mpsc::Sender<UploadEvent>>,
) -> Result<UploadSummary, JobError> {
    job.validate()?;
    uploader.prepare(&job)?;

    let tasks = TaskList::new(scan::enumerate(&job)?);
    if tasks.is_empty() {
        return Err(JobError::NothingToUpload(job.folder.clone()));
    }
    run_tasks(job, tasks, uploader, progress, events)
}

/// Runs the worker pool over an already prepared and enumerated job.
fn run_tasks(
    job: UploadJob,
    tasks: TaskList,
    uploader: Arc<dyn Uploader>,
    progress: Arc<ProgressAggregator>,
    events: Option<mpsc::Sender<UploadEvent>>,
) -> Result<UploadSummary, JobError> {
    let file_count = tasks.len();
    let total_bytes = tasks.total_bytes();
    let num_workers = job.threads.max(1).min(file_count);
    tracing::info!(
        repo = %job.repo,
        folder = %job.folder.display(),
        files = file_count,
        total_bytes,
        workers = num_workers,
        "starting upload"
    );

    progress.begin(file_count, total_bytes);
    let started = progress.snapshot().elapsed;
    let ctx = Arc::new(JobContext {
        job,
        tasks,
        progress,
        uploader,
        events,
    });

    let mut handles = Vec::with_capacity(num_workers);
    for worker_id in 0..num_workers {
        let ctx = Arc::clone(&ctx);
        let spawned = std::thread::Builder::new()
            .name(format!("upload-{worker_id}"))
            .spawn(move || worker::run_worker(worker_id, &ctx));
        match spawned {
            Ok(h) => handles.push(h),
            // Fewer workers is still correct: the ones running drain the list.
            Err(e) if !handles.is_empty() => {
                tracing::warn!(worker_id, "could not spawn upload worker: {}", e);
                break;
            }
            Err(e) => {
                tracing::error!("could not spawn any upload worker: {}", e);
                return Err(JobError::WorkerPanicked);
            }
        }
    }

    let mut panicked = false;
    for h in handles {
        if h.join().is_err() {
            panicked = true;
        }
    }
    if panicked {
        // Workers that survived drained the list; anything left was never claimed.
        tracing::error!("an upload worker panicked");
        return Err(JobError::WorkerPanicked);
    }
    debug_assert!(ctx.tasks.all_terminal());

    let elapsed = ctx.progress.snapshot().elapsed.saturating_sub(started);
    let summary = UploadSummary::from_tasks(ctx.tasks.snapshot(), elapsed);
    tracing::info!(
        repo = %ctx.job.repo,
        uploaded = summary.files_uploaded,
        failed = summary.files_failed,
        bytes = summary.bytes_uploaded,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "upload finished"
    );
    Ok(summary)
}

/// Per-folder mode: one job per first-level sub-directory, run one after the
/// other on the same aggregator.
///
/// The transport is prepared once and every sub-directory is enumerated
/// before the first worker starts, so a job-level error never arrives after
/// files have been committed. Sub-directories with nothing to upload are
/// skipped; if all of them are empty the whole run is `NothingToUpload`.
pub fn run_upload_per_folder(
    job: UploadJob,
    uploader: Arc<dyn Uploader>,
    progress: Arc<ProgressAggregator>,
    events: Option<mpsc::Sender<UploadEvent>>,
) -> Result<UploadSummary, JobError> {
    job.validate()?;
    let jobs = job.split_first_level()?;
    if jobs.is_empty() {
        return Err(JobError::NothingToUpload(job.folder));
    }
    // Sub-jobs share repository, token and private flag with the parent.
    uploader.prepare(&job)?;

    let mut planned = Vec::with_capacity(jobs.len());
    for sub in jobs {
        let tasks = TaskList::new(scan::enumerate(&sub)?);
        if tasks.is_empty() {
            tracing::warn!(folder = %sub.folder.display(), "no files to upload, skipping");
            continue;
        }
        planned.push((sub, tasks));
    }
    if planned.is_empty() {
        return Err(JobError::NothingToUpload(job.folder));
    }

    let mut total = UploadSummary::default();
    for (sub, tasks) in planned {
        total.merge(run_tasks(
            sub,
            tasks,
            Arc::clone(&uploader),
            Arc::clone(&progress),
            events.clone(),
        )?);
    }
    Ok(total)
}
