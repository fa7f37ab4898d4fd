//! Media entry and metadata snapshot types.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inode information, used to visit each directory once when following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }

    /// Read inode info from filesystem metadata.
    ///
    /// Returns `None` on platforms without inode numbers.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        Some(Self::new(metadata.ino(), metadata.dev()))
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// File timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time (if available).
    pub accessed: Option<SystemTime>,
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps with only modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            accessed: None,
            created: None,
        }
    }

    /// Create timestamps with all available times.
    pub fn new(
        modified: SystemTime,
        accessed: Option<SystemTime>,
        created: Option<SystemTime>,
    ) -> Self {
        Self {
            modified,
            accessed,
            created,
        }
    }
}

/// Point-in-time metadata snapshot of a discovered file.
///
/// Taken once during the traversal and never refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Size in bytes.
    pub size: u64,
    /// File timestamps.
    pub timestamps: Timestamps,
    /// Inode info (unix only).
    pub inode: Option<InodeInfo>,
}

impl EntryMetadata {
    /// Create a metadata snapshot from explicit values.
    pub fn new(size: u64, timestamps: Timestamps) -> Self {
        Self {
            size,
            timestamps,
            inode: None,
        }
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.timestamps.modified
    }

    /// Last modification time as a UTC datetime.
    pub fn modified_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.timestamps.modified)
    }
}

impl From<&Metadata> for EntryMetadata {
    fn from(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            timestamps: Timestamps::new(
                metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
                metadata.accessed().ok(),
                metadata.created().ok(),
            ),
            inode: InodeInfo::from_metadata(metadata),
        }
    }
}

/// A discovered media file: its path and the metadata read while walking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Full path of the file (the scan root joined with its relative path).
    pub path: PathBuf,
    /// Metadata snapshot.
    pub metadata: EntryMetadata,
}

impl MediaEntry {
    /// Create a new entry.
    pub fn new(path: impl Into<PathBuf>, metadata: EntryMetadata) -> Self {
        Self {
            path: path.into(),
            metadata,
        }
    }

    /// File name component of the path.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Path relative to `root`, if the entry lies under it.
    pub fn relative_to(&self, root: &Path) -> Option<&Path> {
        self.path.strip_prefix(root).ok()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.metadata.size
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.metadata.modified()
    }
}
