//! Error and warning types for listing operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a listing.
///
/// Missing roots, missing groups and unreadable subtrees are not errors; they
/// yield empty results or [`ScanWarning`]s instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scan was cancelled through its cancel token.
    #[error("Scan interrupted")]
    Interrupted,

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            _ => Self::Io { path, source },
        }
    }

    /// Convert a recoverable error into the warning recorded for it.
    pub fn to_warning(&self) -> Option<ScanWarning> {
        match self {
            Self::PermissionDenied { path } => Some(ScanWarning::permission_denied(path)),
            Self::NotFound { path } => Some(ScanWarning::new(
                path,
                format!("Vanished during scan: {}", path.display()),
                WarningKind::NotFound,
            )),
            Self::NotADirectory { path } => Some(ScanWarning::new(
                path,
                format!("Not a directory: {}", path.display()),
                WarningKind::NotFound,
            )),
            _ => None,
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied; the subtree was skipped.
    PermissionDenied,
    /// Path does not exist (missing root, missing group, or removed mid-scan).
    NotFound,
    /// Symbolic link target does not exist.
    BrokenSymlink,
    /// Directory reached twice through links; not descended again.
    SymlinkCycle,
    /// Group token is not a single path segment.
    InvalidGroup,
}

/// Non-fatal condition encountered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a missing path warning.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("No such directory: {}", path.display()),
            path,
            kind: WarningKind::NotFound,
        }
    }

    /// Create a broken symlink warning.
    pub fn broken_symlink(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Broken symlink: {}", path.display()),
            path,
            kind: WarningKind::BrokenSymlink,
        }
    }
}
