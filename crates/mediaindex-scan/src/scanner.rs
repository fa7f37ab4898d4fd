//! Sequential directory walker with an explicit stack.

use std::collections::HashSet;
use std::fs::{self, DirEntry, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use mediaindex_core::{
    EntryMetadata, InodeInfo, Listing, ListingStats, MediaEntry, ScanConfig, ScanError,
    ScanWarning, WarningKind,
};

use crate::progress::{CancelToken, ProgressReporter, ScanProgress};

/// A directory walker producing media listings.
///
/// Implementations must treat a missing or non-directory root as an empty
/// listing, skip unreadable subtrees with a warning, and return `Err` only
/// for other I/O failures or cancellation.
pub trait MediaScanner {
    /// Walk `root` and list every regular file accepted by `config`.
    fn scan(&self, root: &Path, config: &ScanConfig) -> Result<Listing, ScanError>;
}

impl<S: MediaScanner + ?Sized> MediaScanner for &S {
    fn scan(&self, root: &Path, config: &ScanConfig) -> Result<Listing, ScanError> {
        (**self).scan(root, config)
    }
}

impl<S: MediaScanner + ?Sized> MediaScanner for Box<S> {
    fn scan(&self, root: &Path, config: &ScanConfig) -> Result<Listing, ScanError> {
        (**self).scan(root, config)
    }
}

/// Check that `root` is a readable directory.
///
/// Recoverable problems come back as a warning so the caller can return an
/// empty listing.
pub(crate) fn open_root(root: &Path) -> Result<Option<ScanWarning>, ScanError> {
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(None),
        Ok(_) => {
            let err = ScanError::NotADirectory {
                path: root.to_path_buf(),
            };
            Ok(err.to_warning())
        }
        // InvalidInput: the path holds a NUL byte and cannot exist.
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::InvalidInput
            ) =>
        {
            Ok(Some(ScanWarning::not_found(root)))
        }
        Err(err) => warning_for(root, err).map(Some),
    }
}

/// Map an I/O failure at `path` to the warning recorded for it.
///
/// Only permission problems and paths that disappeared are skippable; every
/// other failure comes back as the error that aborts the walk.
pub(crate) fn warning_for(path: &Path, err: io::Error) -> Result<ScanWarning, ScanError> {
    let err = ScanError::io(path, err);
    err.to_warning().ok_or(err)
}

/// Sequential scanner walking the tree with an owned stack of directories.
///
/// Each directory is read once. File types come from the directory listing
/// itself, so only accepted files cost a metadata read.
pub struct TreeScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: Option<CancelToken>,
}

impl TreeScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            cancel: None,
        }
    }

    /// Attach a cancel token checked before each directory is read.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk `root` and list every regular file accepted by `config`.
    pub fn scan(&self, root: &Path, config: &ScanConfig) -> Result<Listing, ScanError> {
        if let Some(warning) = open_root(root)? {
            debug!(path = %root.display(), reason = %warning.message, "nothing to list");
            return Ok(Listing::empty(root, vec![warning]));
        }

        let reporter = ProgressReporter::new(&self.progress_tx);
        let mut walk = Walk::new(config, self.cancel.as_ref(), &reporter);
        walk.run(root)?;

        let Walk {
            entries,
            stats,
            warnings,
            ..
        } = walk;
        let elapsed = reporter.elapsed();
        debug!(
            path = %root.display(),
            files = stats.files_matched,
            dirs = stats.dirs_visited,
            warnings = warnings.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "scan complete"
        );

        let mut listing = Listing::new(root, entries, stats, elapsed, warnings);
        listing.sort(config.sort);
        Ok(listing)
    }
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaScanner for TreeScanner {
    fn scan(&self, root: &Path, config: &ScanConfig) -> Result<Listing, ScanError> {
        TreeScanner::scan(self, root, config)
    }
}

/// State of one walk.
struct Walk<'a> {
    config: &'a ScanConfig,
    cancel: Option<&'a CancelToken>,
    reporter: &'a ProgressReporter<'a>,
    /// Directories entered so far; only filled when links are followed.
    visited: HashSet<InodeInfo>,
    /// Pending directories with their depth (root = 0).
    stack: Vec<(PathBuf, usize)>,
    entries: Vec<MediaEntry>,
    stats: ListingStats,
    warnings: Vec<ScanWarning>,
}

impl<'a> Walk<'a> {
    fn new(
        config: &'a ScanConfig,
        cancel: Option<&'a CancelToken>,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            cancel,
            reporter,
            visited: HashSet::new(),
            stack: Vec::new(),
            entries: Vec::new(),
            stats: ListingStats::new(),
            warnings: Vec::new(),
        }
    }

    fn run(&mut self, root: &Path) -> Result<(), ScanError> {
        if self.config.follow_symlinks {
            let metadata = fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
            if let Some(inode) = InodeInfo::from_metadata(&metadata) {
                self.visited.insert(inode);
            }
        }

        self.stack.push((root.to_path_buf(), 0));
        while let Some((dir, depth)) = self.stack.pop() {
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                debug!(path = %dir.display(), "scan cancelled");
                return Err(ScanError::Interrupted);
            }
            self.read_dir(&dir, depth)?;
        }
        Ok(())
    }

    fn read_dir(&mut self, dir: &Path, depth: usize) -> Result<(), ScanError> {
        let read_dir = match fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(err) => return self.recover(dir, err),
        };
        self.stats.record_dir();

        for entry in read_dir {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    self.recover(dir, err)?;
                    continue;
                }
            };
            self.visit(entry, depth + 1)?;
        }
        Ok(())
    }

    fn visit(&mut self, entry: DirEntry, depth: usize) -> Result<(), ScanError> {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(err) => return self.recover(&path, err),
        };

        if file_type.is_dir() {
            if self.config.follow_symlinks {
                let metadata = match entry.metadata() {
                    Ok(m) => m,
                    Err(err) => return self.recover(&path, err),
                };
                self.push_dir(path, &metadata, depth);
            } else if self.config.within_depth(depth + 1) {
                self.stack.push((path, depth));
            }
        } else if file_type.is_file() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if self.config.exclusions.excludes(&name) {
                trace!(path = %path.display(), "excluded");
                self.stats.record_excluded();
            } else if !self
                .config
                .extensions
                .matches(&name, self.config.case_sensitive)
            {
                self.stats.record_filtered();
            } else {
                match entry.metadata() {
                    Ok(metadata) => self.accept(path, &metadata),
                    Err(err) => return self.recover(&path, err),
                }
            }
        } else if file_type.is_symlink() {
            self.stats.record_symlink();
            if self.config.follow_symlinks {
                self.follow_link(path, depth)?;
            } else {
                trace!(path = %path.display(), "symlink not followed");
            }
        }
        Ok(())
    }

    /// Resolve a link and treat it as its target.
    fn follow_link(&mut self, path: PathBuf, depth: usize) -> Result<(), ScanError> {
        // Dangling targets and self-referencing links both end up here.
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "unresolvable symlink");
                self.warnings.push(ScanWarning::broken_symlink(path));
                return Ok(());
            }
        };

        if metadata.is_dir() {
            self.push_dir(path, &metadata, depth);
        } else if metadata.is_file() {
            let accepted = path
                .file_name()
                .map(|name| self.config.accepts_file(&name.to_string_lossy()))
                .unwrap_or(false);
            if accepted {
                self.accept(path, &metadata);
            } else {
                self.stats.record_filtered();
            }
        }
        Ok(())
    }

    /// Queue a directory, entering each (inode, device) at most once.
    fn push_dir(&mut self, path: PathBuf, metadata: &Metadata, depth: usize) {
        if !self.config.within_depth(depth + 1) {
            return;
        }
        if let Some(inode) = InodeInfo::from_metadata(metadata) {
            if !self.visited.insert(inode) {
                debug!(path = %path.display(), "directory already visited, not descending");
                self.warnings.push(ScanWarning::new(
                    &path,
                    format!("Directory cycle at {}", path.display()),
                    WarningKind::SymlinkCycle,
                ));
                return;
            }
        }
        self.stack.push((path, depth));
    }

    fn accept(&mut self, path: PathBuf, metadata: &Metadata) {
        let metadata = EntryMetadata::from(metadata);
        self.stats.record_match(metadata.size);
        self.reporter
            .maybe_report(&self.stats, self.warnings.len(), &path);
        self.entries.push(MediaEntry::new(path, metadata));
    }

    /// Record a recoverable failure as a warning, or abort on anything else.
    fn recover(&mut self, path: &Path, err: io::Error) -> Result<(), ScanError> {
        let warning = warning_for(path, err)?;
        warn!(path = %path.display(), "{}", warning.message);
        self.warnings.push(warning);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("2024-01-01")).unwrap();
        fs::create_dir(root.join("2024-01-01/night")).unwrap();

        fs::write(root.join("video1.mp4"), "movie").unwrap();
        fs::write(root.join("image1.jpg"), "picture").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();
        fs::write(root.join("lastsnap.jpg"), "live").unwrap();
        fs::write(root.join("2024-01-01/video3.mp4"), "movie movie").unwrap();
        fs::write(root.join("2024-01-01/night/video9.mkv"), "x").unwrap();

        temp
    }

    fn names(listing: &Listing) -> Vec<String> {
        let mut names: Vec<String> = listing
            .entries
            .iter()
            .filter_map(|e| e.file_name().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let config = ScanConfig::new([".mp4", ".mkv", ".jpg"]);

        let listing = TreeScanner::new().scan(temp.path(), &config).unwrap();

        assert_eq!(
            names(&listing),
            ["image1.jpg", "video1.mp4", "video3.mp4", "video9.mkv"]
        );
        assert_eq!(listing.stats.files_excluded, 2);
        assert_eq!(listing.stats.dirs_visited, 3);
        assert!(!listing.has_warnings());
    }

    #[test]
    fn test_max_depth_limits_descent() {
        let temp = create_test_tree();
        let config = ScanConfig::builder().max_depth(Some(2)).build().unwrap();

        let listing = TreeScanner::new().scan(temp.path(), &config).unwrap();

        assert_eq!(names(&listing), ["image1.jpg", "video1.mp4", "video3.mp4"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let listing = TreeScanner::new()
            .scan(&missing, &ScanConfig::default())
            .unwrap();

        assert!(listing.is_empty());
        assert_eq!(listing.warnings[0].kind, WarningKind::NotFound);
        assert!(listing.warnings[0].message.starts_with("No such directory"));
    }

    #[test]
    fn test_nul_byte_root_is_empty() {
        let listing = TreeScanner::new()
            .scan(Path::new("/media/cam\0"), &ScanConfig::default())
            .unwrap();

        assert!(listing.is_empty());
        assert_eq!(listing.warnings[0].kind, WarningKind::NotFound);
    }

    #[test]
    fn test_recover_skips_permission_denied() {
        let config = ScanConfig::default();
        let (tx, _) = broadcast::channel(1);
        let reporter = ProgressReporter::new(&tx);
        let mut walk = Walk::new(&config, None, &reporter);
        let locked = Path::new("/media/cam1/2024-01-02");

        walk.recover(locked, io::Error::from(io::ErrorKind::PermissionDenied))
            .unwrap();
        walk.recover(locked, io::Error::from(io::ErrorKind::NotFound))
            .unwrap();

        assert_eq!(walk.warnings.len(), 2);
        assert_eq!(walk.warnings[0].kind, WarningKind::PermissionDenied);
        assert_eq!(walk.warnings[0].path, locked);
        assert_eq!(walk.warnings[1].kind, WarningKind::NotFound);
    }

    #[test]
    fn test_recover_aborts_on_other_io_errors() {
        let config = ScanConfig::default();
        let (tx, _) = broadcast::channel(1);
        let reporter = ProgressReporter::new(&tx);
        let mut walk = Walk::new(&config, None, &reporter);

        let result = walk.recover(
            Path::new("/media/cam1"),
            io::Error::other("input/output error"),
        );

        assert!(matches!(result, Err(ScanError::Io { .. })));
        assert!(walk.warnings.is_empty());
    }

    #[test]
    fn test_file_root_is_empty() {
        let temp = create_test_tree();
        let listing = TreeScanner::new()
            .scan(&temp.path().join("video1.mp4"), &ScanConfig::default())
            .unwrap();

        assert!(listing.is_empty());
    }

    #[test]
    fn test_cancelled_scan() {
        let temp = create_test_tree();
        let token = CancelToken::new();
        token.cancel();

        let scanner = TreeScanner::new().with_cancel(token);
        let result = scanner.scan(temp.path(), &ScanConfig::default());

        assert!(matches!(result, Err(ScanError::Interrupted)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed_by_default() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("2024-01-01/loop")).unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("video1.mp4"),
            temp.path().join("alias.mp4"),
        )
        .unwrap();

        let listing = TreeScanner::new()
            .scan(temp.path(), &ScanConfig::new([".mp4"]))
            .unwrap();

        assert_eq!(names(&listing), ["video1.mp4", "video3.mp4"]);
        assert_eq!(listing.stats.symlinks_seen, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_followed_symlink_cycle_terminates() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("2024-01-01/loop")).unwrap();

        let config = ScanConfig::builder()
            .extensions([".mp4"])
            .follow_symlinks(true)
            .build()
            .unwrap();
        let listing = TreeScanner::new().scan(temp.path(), &config).unwrap();

        assert_eq!(names(&listing), ["video1.mp4", "video3.mp4"]);
        assert!(listing
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::SymlinkCycle));
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_warns() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(
            temp.path().join("gone.mp4"),
            temp.path().join("dangling.mp4"),
        )
        .unwrap();

        let config = ScanConfig::builder().follow_symlinks(true).build().unwrap();
        let listing = TreeScanner::new().scan(temp.path(), &config).unwrap();

        assert!(listing
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::BrokenSymlink));
    }
}
