//! Terminal rendering of upload progress: one bar fed from aggregator
//! snapshots, with per-file event lines printed above it.

use anyhow::Result;
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use std::sync::mpsc::Receiver;
use std::time::Duration;
use storageface_core::driver::UploadEvent;
use storageface_core::progress::ProgressSnapshot;

const BAR_TEMPLATE: &str =
    "[{elapsed_precise}] {prefix:.bold}▕{bar:40.cyan/blue}▏{bytes}/{total_bytes} {msg}";

pub struct UploadBar {
    pb: ProgressBar,
}

impl UploadBar {
    pub fn new() -> Result<Self> {
        let pb = ProgressBar::new(0);
        pb.set_style(ProgressStyle::with_template(BAR_TEMPLATE)?.progress_chars("█▓▒░  "));
        pb.set_prefix("uploading");
        Ok(Self { pb })
    }

    /// Prints one line per pending event without disturbing the bar.
    pub fn drain(&self, events: &Receiver<UploadEvent>) {
        for event in events.try_iter() {
            self.pb.println(event_line(&event));
        }
    }

    pub fn update(&self, snap: &ProgressSnapshot) {
        self.pb.set_length(snap.total_bytes);
        self.pb.set_position(snap.bytes_transferred);
        self.pb.set_message(status_message(snap));
    }

    pub fn finish(&self, snap: &ProgressSnapshot) {
        self.update(snap);
        self.pb.finish();
    }
}

pub fn event_line(event: &UploadEvent) -> String {
    match event {
        UploadEvent::Started {
            destination, size, ..
        } => format!("  started   {} ({})", destination, HumanBytes(*size)),
        UploadEvent::Uploaded {
            destination, size, ..
        } => format!("  uploaded  {} ({})", destination, HumanBytes(*size)),
        UploadEvent::Failed {
            destination, error, ..
        } => format!("  FAILED    {}: {}", destination, error),
    }
}

/// "<pct>%  <done>/<total> files  <rate>/s  ETA <eta>" built from the
/// snapshot, not from the bar's own estimate.
pub fn status_message(snap: &ProgressSnapshot) -> String {
    let eta = if snap.is_finished() {
        "done".to_string()
    } else {
        snap.eta_secs()
            .map(|s| HumanDuration(Duration::from_secs_f64(s)).to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    let mut msg = format!(
        "{:.1}%  {}/{} files  {}/s  ETA {}",
        snap.fraction() * 100.0,
        snap.files_finished(),
        snap.files_total,
        HumanBytes(snap.bytes_per_sec() as u64),
        eta
    );
    if snap.files_failed > 0 {
        msg.push_str(&format!("  ({} failed)", snap.files_failed));
    }
    msg
}
