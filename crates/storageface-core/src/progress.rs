//! Progress aggregation for uploads (bytes done, rate, ETA).
//!
//! Workers report through a per-file [`FileProgress`] handle; the
//! [`ProgressAggregator`] folds those reports into one running total that a
//! display layer can read at any time with [`ProgressAggregator::snapshot`].
//!
//! Per file, only forward movement is counted and the count is clamped to the
//! file's size, so a transport that restarts a request (and reports from zero
//! again) never adds the same bytes twice. When a file fails its partial bytes
//! are withdrawn and its size leaves the total, so once every task is terminal
//! `bytes_transferred == total_bytes`.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

/// Snapshot of upload progress for one job (display-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Bytes sent so far, counted at most once per byte.
    pub bytes_transferred: u64,
    /// Bytes that will have been sent when the job ends (failed files excluded).
    pub total_bytes: u64,
    /// Time since the aggregator was started.
    pub elapsed: Duration,
    pub files_completed: usize,
    pub files_failed: usize,
    pub files_total: usize,
}

impl ProgressSnapshot {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Upload rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_transferred as f64 / secs
    }

    /// Estimated seconds remaining (None while the rate is still 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_transferred);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64).min(1.0)
    }

    pub fn files_finished(&self) -> usize {
        self.files_completed + self.files_failed
    }

    pub fn is_finished(&self) -> bool {
        self.files_finished() >= self.files_total
    }
}

#[derive(Debug, Default)]
struct Counters {
    bytes_transferred: u64,
    total_bytes: u64,
    files_completed: usize,
    files_failed: usize,
    files_total: usize,
}

/// Thread-safe running totals for one job. Every update holds the lock only
/// for a few integer operations.
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    counters: Mutex<Counters>,
    started: OnceLock<Instant>,
    finished: OnceLock<Duration>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers the job's totals and starts the clock. Calling it again (per-folder
    /// mode runs several jobs on one aggregator) adds to the totals.
    pub fn begin(&self, files: usize, total_bytes: u64) {
        self.started.get_or_init(Instant::now);
        let mut c = self.lock();
        c.files_total += files;
        c.total_bytes = c.total_bytes.saturating_add(total_bytes);
    }

    /// Freezes elapsed time at its current value.
    pub fn finish(&self) {
        let elapsed = self.elapsed_now();
        let _ = self.finished.set(elapsed);
    }

    fn elapsed_now(&self) -> Duration {
        self.started
            .get()
            .map(Instant::elapsed)
            .unwrap_or_default()
    }

    /// Handle through which one worker reports progress for one file of `size` bytes.
    pub fn file(self: &Arc<Self>, size: u64) -> FileProgress {
        FileProgress {
            aggregator: Arc::clone(self),
            size,
            reported: 0,
            settled: false,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self
            .finished
            .get()
            .copied()
            .unwrap_or_else(|| self.elapsed_now());
        let c = self.lock();
        ProgressSnapshot {
            bytes_transferred: c.bytes_transferred.min(c.total_bytes),
            total_bytes: c.total_bytes,
            elapsed,
            files_completed: c.files_completed,
            files_failed: c.files_failed,
            files_total: c.files_total,
        }
    }

    fn add_bytes(&self, n: u64) {
        if n > 0 {
            let mut c = self.lock();
            c.bytes_transferred = c.bytes_transferred.saturating_add(n);
        }
    }

    fn settle_done(&self, remaining: u64) {
        let mut c = self.lock();
        c.bytes_transferred = c.bytes_transferred.saturating_add(remaining);
        c.files_completed += 1;
    }

    fn settle_failed(&self, reported: u64, size: u64) {
        let mut c = self.lock();
        c.bytes_transferred = c.bytes_transferred.saturating_sub(reported);
        c.total_bytes = c.total_bytes.saturating_sub(size);
        c.files_failed += 1;
    }
}

/// Per-file progress handle. Not shared: exactly one worker owns it.
#[derive(Debug)]
pub struct FileProgress {
    aggregator: Arc<ProgressAggregator>,
    size: u64,
    reported: u64,
    settled: bool,
}

impl FileProgress {
    /// Bytes of this file counted so far.
    pub fn reported(&self) -> u64 {
        self.reported
    }

    /// Reports `n` more bytes sent.
    #[cfg(test)]
    fn advance(&mut self, n: u64) {
        let target = self.reported.saturating_add(n);
        self.set_sent(target);
    }

    /// Reports the cumulative number of bytes sent for this file. Values that
    /// go backwards are ignored.
    pub fn set_sent(&mut self, sent: u64) {
        if self.settled {
            return;
        }
        let sent = sent.min(self.size);
        if sent > self.reported {
            self.aggregator.add_bytes(sent - self.reported);
            self.reported = sent;
        }
    }

    /// Marks the file uploaded, counting any bytes the transport did not report.
    pub fn done(mut self) {
        self.settle(true);
    }

    /// Marks the file failed and withdraws its bytes from the totals.
    pub fn failed(mut self) {
        self.settle(false);
    }

    fn settle(&mut self, ok: bool) {
        if self.settled {
            return;
        }
        self.settled = true;
        if ok {
            self.aggregator.settle_done(self.size - self.reported);
            self.reported = self.size;
        } else {
            self.aggregator.settle_failed(self.reported, self.size);
            self.reported = 0;
        }
    }
}

impl Drop for FileProgress {
    // A handle dropped without an outcome (worker panic) counts as a failure.
    fn drop(&mut self) {
        self.settle(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_eta_and_fraction() {
        let s = ProgressSnapshot {
            bytes_transferred: 500,
            total_bytes: 1000,
            elapsed: Duration::from_secs(5),
            files_completed: 1,
            files_failed: 0,
            files_total: 2,
        };
        assert!((s.bytes_per_sec() - 100.0).abs() < 1e-9);
        assert!((s.eta_secs().unwrap() - 5.0).abs() < 1e-9);
        assert!((s.fraction() - 0.5).abs() < 1e-9);
        assert!(!s.is_finished());
    }

    #[test]
    fn empty_job_is_complete() {
        let agg = ProgressAggregator::new();
        agg.begin(0, 0);
        let s = agg.snapshot();
        assert_eq!(s.fraction(), 1.0);
        assert_eq!(s.eta_secs(), Some(0.0));
        assert!(s.is_finished());
    }

    #[test]
    fn regressions_and_overshoot_are_not_counted() {
        let agg = Arc::new(ProgressAggregator::new());
        agg.begin(1, 100);
        let mut f = agg.file(100);
        f.set_sent(40);
        f.set_sent(10); // transport restarted
        f.set_sent(40);
        assert_eq!(agg.snapshot().bytes_transferred, 40);
        f.advance(1_000);
        assert_eq!(f.reported(), 100);
        assert_eq!(agg.snapshot().bytes_transferred, 100);
        f.done();
        let s = agg.snapshot();
        assert_eq!(s.bytes_transferred, 100);
        assert_eq!(s.files_completed, 1);
    }

    #[test]
    fn done_tops_up_unreported_bytes() {
        let agg = Arc::new(ProgressAggregator::new());
        agg.begin(1, 64);
        let mut f = agg.file(64);
        f.advance(10);
        f.done();
        assert_eq!(agg.snapshot().bytes_transferred, 64);
    }

    #[test]
    fn failure_withdraws_partial_bytes_and_size() {
        let agg = Arc::new(ProgressAggregator::new());
        agg.begin(2, 300);
        let mut ok = agg.file(100);
        let mut bad = agg.file(200);
        ok.advance(50);
        bad.advance(150);
        assert_eq!(agg.snapshot().bytes_transferred, 200);
        bad.failed();
        ok.done();
        let s = agg.snapshot();
        assert_eq!(s.bytes_transferred, 100);
        assert_eq!(s.total_bytes, 100);
        assert_eq!(s.files_failed, 1);
        assert_eq!(s.files_completed, 1);
        assert!(s.is_finished());
    }

    #[test]
    fn dropped_handle_counts_as_failure() {
        let agg = Arc::new(ProgressAggregator::new());
        agg.begin(1, 10);
        {
            let mut f = agg.file(10);
            f.advance(4);
        }
        let s = agg.snapshot();
        assert_eq!(s.files_failed, 1);
        assert_eq!(s.bytes_transferred, 0);
        assert_eq!(s.total_bytes, 0);
    }

    #[test]
    fn concurrent_reports_sum_exactly() {
        let agg = Arc::new(ProgressAggregator::new());
        agg.begin(16, 16 * 4096);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let agg = Arc::clone(&agg);
                std::thread::spawn(move || {
                    let mut f = agg.file(4096);
                    for _ in 0..64 {
                        f.advance(64);
                    }
                    f.done();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let s = agg.snapshot();
        assert_eq!(s.bytes_transferred, 16 * 4096);
        assert_eq!(s.bytes_transferred, s.total_bytes);
        assert_eq!(s.files_completed, 16);
    }

    #[test]
    fn finish_freezes_elapsed() {
        let agg = ProgressAggregator::new();
        agg.begin(0, 0);
        agg.finish();
        let a = agg.snapshot().elapsed;
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(agg.snapshot().elapsed, a);
    }
}
