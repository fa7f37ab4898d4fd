//! Scan configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::filter::{ExclusionRules, ExtensionSet};

/// Order of entries in a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Traversal order (unspecified).
    #[default]
    Unsorted,
    /// Most recently modified first.
    NewestFirst,
    /// Least recently modified first.
    OldestFirst,
    /// Lexicographic by path.
    Path,
}

/// Configuration for listing operations.
///
/// The root is not part of the configuration; it is passed with every call
/// so one config can serve many camera directories.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Extensions to list (empty = all files).
    #[builder(default)]
    #[serde(default)]
    pub extensions: ExtensionSet,

    /// Compare extensions case-sensitively.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Names that are never listed.
    #[builder(default)]
    #[serde(default)]
    pub exclusions: ExclusionRules,

    /// Maximum depth to traverse (None = unlimited, 1 = root files only).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Number of threads for the parallel scanner (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Order of the returned entries.
    #[builder(default)]
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(0)) = self.max_depth {
            return Err("Maximum depth must be at least 1".to_string());
        }
        if let Some(ref extensions) = self.extensions {
            if extensions.iter().any(str::is_empty) {
                return Err("Extensions cannot be empty strings".to_string());
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config listing files with the given extensions.
    pub fn new(extensions: impl Into<ExtensionSet>) -> Self {
        Self {
            extensions: extensions.into(),
            ..Self::default()
        }
    }

    /// Return a copy limited to the given depth.
    pub fn with_max_depth(&self, max_depth: Option<u32>) -> Self {
        Self {
            max_depth,
            ..self.clone()
        }
    }

    /// Check whether a regular file with this name belongs in the listing.
    pub fn accepts_file(&self, name: &str) -> bool {
        !self.exclusions.excludes(name) && self.extensions.matches(name, self.case_sensitive)
    }

    /// Check whether entries at `depth` (root children = 1) are within range.
    pub fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth <= max as usize)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: ExtensionSet::new(),
            case_sensitive: true,
            exclusions: ExclusionRules::default(),
            max_depth: None,
            follow_symlinks: false,
            threads: 0,
            sort: SortOrder::Unsorted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .extensions([".mp4", ".avi"])
            .case_sensitive(false)
            .threads(4usize)
            .sort(SortOrder::NewestFirst)
            .build()
            .unwrap();

        assert_eq!(config.extensions.len(), 2);
        assert!(!config.case_sensitive);
        assert_eq!(config.threads, 4);
        assert_eq!(config.sort, SortOrder::NewestFirst);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_builder_rejects_zero_depth() {
        let result = ScanConfig::builder().max_depth(Some(0)).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_empty_extension() {
        let result = ScanConfig::builder().extensions([".mp4", ""]).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_accepts_file() {
        let config = ScanConfig::new([".jpg"]);

        assert!(config.accepts_file("image1.jpg"));
        assert!(!config.accepts_file("video1.mp4"));
        assert!(!config.accepts_file("lastsnap.jpg"));
        assert!(!config.accepts_file(".thumb.jpg"));
    }

    #[test]
    fn test_within_depth() {
        let config = ScanConfig::default();
        assert!(config.within_depth(100));

        let shallow = config.with_max_depth(Some(1));
        assert!(shallow.within_depth(1));
        assert!(!shallow.within_depth(2));
    }
}
