//! Core types for mediaindex.
//!
//! This crate provides the data structures shared by the scanner and the
//! group resolver: media entries with their metadata snapshot, extension and
//! exclusion filters, group tokens, listings and configuration.

mod config;
mod entry;
mod error;
mod filter;
mod group;
mod listing;

pub use config::{ScanConfig, ScanConfigBuilder, ScanConfigBuilderError, SortOrder};
pub use entry::{EntryMetadata, InodeInfo, MediaEntry, Timestamps};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use filter::{ExclusionRules, ExtensionSet, HIDDEN_MARKER, LIVE_SNAPSHOT_NAME};
pub use group::{Group, UNGROUPED};
pub use listing::{Listing, ListingStats, sort_entries};
