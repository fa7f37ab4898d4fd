//! Media file discovery for mediaindex.
//!
//! This crate walks a directory tree of recorded media and returns every
//! qualifying regular file with its metadata, and maps group tokens onto
//! filtered subsets of that tree.
//!
//! # Overview
//!
//! - [`TreeScanner`] walks the tree with an explicit stack. File types come
//!   from the directory listing, so only accepted files are stat'ed.
//! - [`JwalkScanner`] does the same walk in parallel via jwalk/rayon.
//! - [`GroupResolver`] turns a group token into a traversal root. Missing
//!   roots and missing groups are empty listings, not errors.
//!
//! Hidden files and the live snapshot placeholder (`lastsnap.jpg`) are never
//! listed.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use mediaindex_scan::{Group, GroupResolver, ScanConfig};
//!
//! let config = ScanConfig::new([".mp4", ".avi", ".mkv"]);
//! let resolver = GroupResolver::new();
//!
//! let listing = resolver
//!     .list(Path::new("/var/lib/motion/cam1"), &config, &Group::named("2024-01-01"))
//!     .unwrap();
//!
//! for entry in &listing.entries {
//!     println!("{} ({} bytes)", entry.path.display(), entry.size());
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use mediaindex_scan::TreeScanner;
//!
//! let scanner = TreeScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Matched {} files", progress.files_matched);
//!     }
//! });
//! ```

mod parallel;
mod progress;
mod resolver;
mod scanner;

pub use parallel::JwalkScanner;
pub use progress::{CancelToken, ScanProgress};
pub use resolver::{GroupResolver, GroupSummary, group_of};
pub use scanner::{MediaScanner, TreeScanner};

// Re-export core types for convenience
pub use mediaindex_core::{
    EntryMetadata, ExclusionRules, ExtensionSet, Group, Listing, ListingStats, MediaEntry,
    ScanConfig, ScanError, ScanWarning, SortOrder, Timestamps, UNGROUPED, WarningKind,
};
