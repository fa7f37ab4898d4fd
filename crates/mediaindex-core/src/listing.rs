//! Listing container and statistics.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::SortOrder;
use crate::entry::MediaEntry;
use crate::error::ScanWarning;

/// Summary statistics for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStats {
    /// Directories read.
    pub dirs_visited: u64,
    /// Regular files seen (before filtering).
    pub files_seen: u64,
    /// Files dropped by the exclusion rules.
    pub files_excluded: u64,
    /// Files accepted into the listing.
    pub files_matched: u64,
    /// Total size of accepted files.
    pub bytes_matched: u64,
    /// Symbolic links seen.
    pub symlinks_seen: u64,
}

impl ListingStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory that was read.
    pub fn record_dir(&mut self) {
        self.dirs_visited += 1;
    }

    /// Record an accepted file.
    pub fn record_match(&mut self, size: u64) {
        self.files_seen += 1;
        self.files_matched += 1;
        self.bytes_matched += size;
    }

    /// Record a file dropped by the exclusion rules.
    pub fn record_excluded(&mut self) {
        self.files_seen += 1;
        self.files_excluded += 1;
    }

    /// Record a file dropped by the extension filter.
    pub fn record_filtered(&mut self) {
        self.files_seen += 1;
    }

    /// Record a symbolic link.
    pub fn record_symlink(&mut self) {
        self.symlinks_seen += 1;
    }
}

/// Result of one listing: the matched entries plus what happened on the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Directory the walk started from.
    pub root: PathBuf,

    /// Matched files.
    pub entries: Vec<MediaEntry>,

    /// When this listing was produced.
    pub scanned_at: SystemTime,

    /// Duration of the walk.
    pub scan_duration: Duration,

    /// Summary statistics.
    pub stats: ListingStats,

    /// Recoverable conditions met during the walk.
    pub warnings: Vec<ScanWarning>,
}

impl Listing {
    /// Create a listing.
    pub fn new(
        root: impl Into<PathBuf>,
        entries: Vec<MediaEntry>,
        stats: ListingStats,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            root: root.into(),
            entries,
            scanned_at: SystemTime::now(),
            scan_duration,
            stats,
            warnings,
        }
    }

    /// An empty listing for a root that yields nothing.
    pub fn empty(root: impl Into<PathBuf>, warnings: Vec<ScanWarning>) -> Self {
        Self::new(
            root,
            Vec::new(),
            ListingStats::new(),
            Duration::ZERO,
            warnings,
        )
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the listing has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entry paths.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    /// Total size of all entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(MediaEntry::size).sum()
    }

    /// Most recently modified entry.
    pub fn newest(&self) -> Option<&MediaEntry> {
        self.entries.iter().max_by_key(|e| e.modified())
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Sort entries in place.
    pub fn sort(&mut self, order: SortOrder) {
        sort_entries(&mut self.entries, order);
    }

    /// Consume the listing, returning its entries.
    pub fn into_entries(self) -> Vec<MediaEntry> {
        self.entries
    }
}

impl IntoIterator for Listing {
    type Item = MediaEntry;
    type IntoIter = std::vec::IntoIter<MediaEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Sort entries by the given order.
pub fn sort_entries(entries: &mut [MediaEntry], order: SortOrder) {
    match order {
        SortOrder::Unsorted => {}
        SortOrder::NewestFirst => entries.sort_by(|a, b| b.modified().cmp(&a.modified())),
        SortOrder::OldestFirst => entries.sort_by_key(MediaEntry::modified),
        SortOrder::Path => entries.sort_by(|a, b| a.path.cmp(&b.path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryMetadata, Timestamps};

    fn entry(path: &str, size: u64, secs: u64) -> MediaEntry {
        MediaEntry::new(
            path,
            EntryMetadata::new(
                size,
                Timestamps::with_modified(std::time::UNIX_EPOCH + Duration::from_secs(secs)),
            ),
        )
    }

    #[test]
    fn test_listing_stats_record() {
        let mut stats = ListingStats::new();
        stats.record_match(1024);
        stats.record_excluded();
        stats.record_filtered();

        assert_eq!(stats.files_seen, 3);
        assert_eq!(stats.files_matched, 1);
        assert_eq!(stats.files_excluded, 1);
        assert_eq!(stats.bytes_matched, 1024);
    }

    #[test]
    fn test_sort_newest_first() {
        let mut listing = Listing::new(
            "/media",
            vec![
                entry("/media/a.mp4", 1, 10),
                entry("/media/b.mp4", 2, 30),
                entry("/media/c.mp4", 3, 20),
            ],
            ListingStats::new(),
            Duration::ZERO,
            Vec::new(),
        );

        listing.sort(SortOrder::NewestFirst);
        let names: Vec<_> = listing.entries.iter().filter_map(MediaEntry::file_name).collect();
        assert_eq!(names, ["b.mp4", "c.mp4", "a.mp4"]);
        assert_eq!(listing.newest().and_then(MediaEntry::file_name), Some("b.mp4"));
        assert_eq!(listing.total_size(), 6);
    }
}
