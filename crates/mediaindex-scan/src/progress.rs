//! Scan progress reporting and cancellation.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mediaindex_core::ListingStats;
use tokio::sync::broadcast;

/// Progress snapshots are broadcast every this many matched files.
pub(crate) const PROGRESS_INTERVAL: u64 = 1000;

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Directories read so far.
    pub dirs_visited: u64,
    /// Files accepted so far.
    pub files_matched: u64,
    /// Bytes of accepted files so far.
    pub bytes_matched: u64,
    /// Path of the last accepted file.
    pub current_path: PathBuf,
    /// Number of warnings so far.
    pub warnings_count: u64,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            dirs_visited: 0,
            files_matched: 0,
            bytes_matched: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends progress snapshots while a walk runs.
#[derive(Debug)]
pub(crate) struct ProgressReporter<'a> {
    tx: &'a broadcast::Sender<ScanProgress>,
    start: Instant,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(tx: &'a broadcast::Sender<ScanProgress>) -> Self {
        Self {
            tx,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Broadcast a snapshot if the match count hit the reporting interval.
    pub fn maybe_report(&self, stats: &ListingStats, warnings: usize, path: &std::path::Path) {
        if stats.files_matched % PROGRESS_INTERVAL == 0 {
            self.report(stats, warnings, path);
        }
    }

    pub fn report(&self, stats: &ListingStats, warnings: usize, path: &std::path::Path) {
        // No receivers is fine.
        let _ = self.tx.send(ScanProgress {
            dirs_visited: stats.dirs_visited,
            files_matched: stats.files_matched,
            bytes_matched: stats.bytes_matched,
            current_path: path.to_path_buf(),
            warnings_count: warnings as u64,
            elapsed: self.start.elapsed(),
        });
    }
}

/// Shared flag for stopping a scan from another thread.
///
/// Clones share the same flag. A cancelled scan returns
/// [`ScanError::Interrupted`](mediaindex_core::ScanError::Interrupted).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_reporter_interval() {
        let (tx, mut rx) = broadcast::channel(4);
        let reporter = ProgressReporter::new(&tx);
        let mut stats = ListingStats::new();

        stats.record_match(1);
        reporter.maybe_report(&stats, 0, std::path::Path::new("/a"));
        assert!(rx.try_recv().is_err());

        for _ in 1..PROGRESS_INTERVAL {
            stats.record_match(1);
        }
        reporter.maybe_report(&stats, 0, std::path::Path::new("/b"));
        let progress = rx.try_recv().unwrap();
        assert_eq!(progress.files_matched, PROGRESS_INTERVAL);
        assert_eq!(progress.current_path, PathBuf::from("/b"));
    }
}
