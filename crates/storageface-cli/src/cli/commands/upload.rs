//! `storageface upload` – upload a folder with a pool of workers.
//!
//! The driver is blocking, so it runs on `spawn_blocking` while this task
//! redraws the bar from aggregator snapshots and prints per-file events.

use anyhow::{Context, Result};
use indicatif::{HumanBytes, HumanDuration};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use storageface_core::config::StorageFaceConfig;
use storageface_core::driver::{self, UploadSummary};
use storageface_core::hub::HubClient;
use storageface_core::job::{JobRequest, RepoType, UploadJob};
use storageface_core::progress::ProgressAggregator;
use storageface_core::scan::{preset_pattern, PRESETS};
use storageface_core::uploader::Uploader;

use super::resolve_token;
use crate::cli::progress_bar::UploadBar;
use crate::cli::UploadArgs;

const REFRESH_INTERVAL_MS: u64 = 200;

/// Config ignore patterns, then `--ignore`, then the patterns of each `--preset`.
pub(crate) fn collect_ignore_patterns(
    cfg: &StorageFaceConfig,
    ignore: &[String],
    presets: &[String],
) -> Result<Vec<String>> {
    let mut patterns = cfg.ignore_patterns.clone();
    patterns.extend(ignore.iter().cloned());
    for name in presets {
        let pattern = preset_pattern(name).with_context(|| {
            let known: Vec<&str> = PRESETS.iter().map(|(n, _)| *n).collect();
            format!("unknown preset '{}' (known: {})", name, known.join(", "))
        })?;
        patterns.push(pattern.to_string());
    }
    Ok(patterns)
}

pub(crate) fn build_job(cfg: &StorageFaceConfig, args: UploadArgs) -> Result<UploadJob> {
    let ignore_patterns = collect_ignore_patterns(cfg, &args.ignore, &args.presets)?;
    let job = UploadJob::new(JobRequest {
        folder: args.folder,
        repo_id: args.repo,
        repo_type: args.repo_type.map(RepoType::from).unwrap_or(cfg.repo_type),
        token: resolve_token(args.token),
        threads: args.threads.unwrap_or(cfg.threads),
        private: args.private || cfg.private,
        path_in_repo: args.path_in_repo,
        ignore_patterns,
    })?;
    Ok(job)
}

pub async fn run_upload(cfg: &StorageFaceConfig, args: UploadArgs) -> Result<()> {
    let per_folder = args.per_folder;
    let job = build_job(cfg, args)?;
    tracing::debug!(?job, per_folder, "upload job");
    println!(
        "Uploading {} to {} with {} worker(s)",
        job.folder.display(),
        job.repo,
        job.threads
    );

    let uploader: Arc<dyn Uploader> = Arc::new(HubClient::from_config(cfg)?);
    let progress = Arc::new(ProgressAggregator::new());
    let (events_tx, events_rx) = mpsc::channel();

    let worker_progress = Arc::clone(&progress);
    let mut handle = tokio::task::spawn_blocking(move || {
        if per_folder {
            driver::run_upload_per_folder(job, uploader, worker_progress, Some(events_tx))
        } else {
            driver::run_upload(job, uploader, worker_progress, Some(events_tx))
        }
    });

    let bar = UploadBar::new()?;
    let mut ticker = tokio::time::interval(Duration::from_millis(REFRESH_INTERVAL_MS));
    let joined = loop {
        tokio::select! {
            res = &mut handle => break res,
            _ = ticker.tick() => {
                bar.drain(&events_rx);
                bar.update(&progress.snapshot());
            }
        }
    };
    progress.finish();
    bar.drain(&events_rx);
    bar.finish(&progress.snapshot());

    let summary = joined.context("upload task failed")??;
    print_summary(&summary);
    if !summary.is_success() {
        anyhow::bail!("{} of {} file(s) failed to upload", summary.files_failed, summary.files_total);
    }
    Ok(())
}

fn print_summary(summary: &UploadSummary) {
    println!(
        "Uploaded {} of {} file(s), {} in {}",
        summary.files_uploaded,
        summary.files_total,
        HumanBytes(summary.bytes_uploaded),
        HumanDuration(summary.elapsed)
    );
    for task in summary.failures() {
        println!(
            "  failed: {} ({})",
            task.destination,
            task.error.as_deref().unwrap_or("unknown error")
        );
    }
}
