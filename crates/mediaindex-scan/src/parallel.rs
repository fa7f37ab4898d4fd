//! JWalk-based parallel directory scanner.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jwalk::{DirEntry, Parallelism, WalkDirGeneric};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use mediaindex_core::{
    EntryMetadata, Listing, ListingStats, MediaEntry, ScanConfig, ScanError, ScanWarning,
    SortOrder, WarningKind,
};

use crate::progress::{CancelToken, ProgressReporter, ScanProgress};
use crate::scanner::{MediaScanner, open_root, warning_for};

/// What the read-dir callback decided about a child entry.
#[derive(Debug, Clone, Default)]
enum EntryState {
    /// Directories and special files.
    #[default]
    Skipped,
    /// Symbolic link left unresolved.
    Link,
    /// Dropped by the exclusion rules.
    Excluded,
    /// Dropped by the extension filter.
    Filtered,
    /// Accepted, with the metadata read on the worker thread.
    Matched(EntryMetadata),
    /// Metadata read failed.
    Failed(io::ErrorKind, String),
}

type MediaWalk = WalkDirGeneric<((), EntryState)>;
type MediaDirEntry = DirEntry<((), EntryState)>;

/// Parallel scanner for very large trees.
///
/// Directories are read on a rayon pool and accepted files are stat'ed on
/// the worker that listed them. Results match [`TreeScanner`](crate::TreeScanner)
/// except for traversal order.
pub struct JwalkScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: Option<CancelToken>,
}

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            cancel: None,
        }
    }

    /// Attach a cancel token; workers stop reading directories once it is set.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk `root` in parallel and list every regular file accepted by `config`.
    pub fn scan(&self, root: &Path, config: &ScanConfig) -> Result<Listing, ScanError> {
        if let Some(warning) = open_root(root)? {
            debug!(path = %root.display(), reason = %warning.message, "nothing to list");
            return Ok(Listing::empty(root, vec![warning]));
        }

        let reporter = ProgressReporter::new(&self.progress_tx);
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let filter = Arc::new(config.clone());
        let cancel = self.cancel.clone();
        let walker = MediaWalk::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(config.follow_symlinks)
            .sort(false)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                    children.clear();
                    return;
                }
                for child in children.iter_mut().flatten() {
                    child.client_state = classify(child, &filter);
                }
            });

        let mut entries = Vec::new();
        let mut stats = ListingStats::new();
        let mut warnings = Vec::new();

        for result in walker {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                debug!(path = %root.display(), "scan cancelled");
                return Err(ScanError::Interrupted);
            }

            let mut entry = match result {
                Ok(e) => e,
                Err(err) => {
                    let warning = recover_entry(root, err)?;
                    warn!(path = %warning.path.display(), "{}", warning.message);
                    warnings.push(warning);
                    continue;
                }
            };

            // Directory reads that fail are attached to the directory's own entry.
            if let Some(err) = entry.read_children_error.take() {
                let warning = recover(root, err)?;
                warn!(path = %warning.path.display(), "{}", warning.message);
                warnings.push(warning);
            } else if entry.read_children_path.is_some() && config.within_depth(entry.depth + 1) {
                stats.record_dir();
            }

            let path = entry.path();
            match &entry.client_state {
                EntryState::Skipped => {}
                EntryState::Link => stats.record_symlink(),
                EntryState::Excluded => stats.record_excluded(),
                EntryState::Filtered => stats.record_filtered(),
                EntryState::Matched(metadata) => {
                    stats.record_match(metadata.size);
                    reporter.maybe_report(&stats, warnings.len(), &path);
                    entries.push(MediaEntry::new(path, *metadata));
                }
                EntryState::Failed(kind, message) => {
                    let warning = warning_for(&path, io::Error::new(*kind, message.clone()))?;
                    warn!(path = %path.display(), "{}", warning.message);
                    warnings.push(warning);
                }
            }
        }

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(ScanError::Interrupted);
        }

        par_sort(&mut entries, config.sort);
        let elapsed = reporter.elapsed();
        debug!(
            path = %root.display(),
            files = stats.files_matched,
            dirs = stats.dirs_visited,
            warnings = warnings.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "parallel scan complete"
        );

        Ok(Listing::new(root, entries, stats, elapsed, warnings))
    }
}

impl Default for JwalkScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaScanner for JwalkScanner {
    fn scan(&self, root: &Path, config: &ScanConfig) -> Result<Listing, ScanError> {
        JwalkScanner::scan(self, root, config)
    }
}

/// Decide a child's fate on the worker thread that listed it.
fn classify(child: &MediaDirEntry, config: &ScanConfig) -> EntryState {
    let file_type = child.file_type;
    if file_type.is_symlink() {
        // Followed links are reported with their target's type.
        return EntryState::Link;
    }
    if !file_type.is_file() {
        return EntryState::Skipped;
    }

    let name = child.file_name.to_string_lossy();
    if config.exclusions.excludes(&name) {
        return EntryState::Excluded;
    }
    if !config.extensions.matches(&name, config.case_sensitive) {
        return EntryState::Filtered;
    }

    match child.metadata() {
        Ok(metadata) => EntryState::Matched(EntryMetadata::from(&metadata)),
        Err(err) => {
            let kind = err
                .io_error()
                .map(io::Error::kind)
                .unwrap_or(io::ErrorKind::Other);
            EntryState::Failed(kind, err.to_string())
        }
    }
}

/// Turn a walk error into a warning, or abort on non-recoverable I/O errors.
fn recover(root: &Path, err: jwalk::Error) -> Result<ScanWarning, ScanError> {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());

    if err.loop_ancestor().is_some() {
        return Ok(ScanWarning::new(
            &path,
            format!("Directory cycle at {}", path.display()),
            WarningKind::SymlinkCycle,
        ));
    }

    warning_for(&path, io::Error::from(err))
}

/// Like [`recover`], for entries that failed to resolve.
///
/// jwalk reports a followed link whose target cannot be read against the
/// link itself, so any I/O failure on a symlink path means a broken link.
fn recover_entry(root: &Path, err: jwalk::Error) -> Result<ScanWarning, ScanError> {
    if err.loop_ancestor().is_none() && err.io_error().is_some() {
        if let Some(link) = err.path().filter(|p| p.is_symlink()) {
            debug!(path = %link.display(), error = %err, "unresolvable symlink");
            return Ok(ScanWarning::broken_symlink(link));
        }
    }
    recover(root, err)
}

/// Sort entries on the rayon pool.
fn par_sort(entries: &mut [MediaEntry], order: SortOrder) {
    match order {
        SortOrder::Unsorted => {}
        SortOrder::NewestFirst => entries.par_sort_by(|a, b| b.modified().cmp(&a.modified())),
        SortOrder::OldestFirst => entries.par_sort_by_key(MediaEntry::modified),
        SortOrder::Path => entries.par_sort_by(|a, b| a.path.cmp(&b.path)),
    }
}
