//! File name filters: extension sets and exclusion rules.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Default name of the live snapshot placeholder written by the capture daemon.
pub const LIVE_SNAPSHOT_NAME: &str = "lastsnap.jpg";

/// Default marker character for hidden entries.
pub const HIDDEN_MARKER: char = '.';

/// A set of dot-prefixed filename suffixes (e.g. `.mp4`).
///
/// An empty set matches every file. Entries without a leading dot are kept
/// as given and simply never match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionSet {
    extensions: Vec<CompactString>,
}

impl ExtensionSet {
    /// Create an empty set (matches all files).
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Number of extensions in the set.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Add an extension. Duplicates are ignored.
    pub fn insert(&mut self, ext: impl Into<CompactString>) {
        let ext = ext.into();
        if !self.extensions.contains(&ext) {
            self.extensions.push(ext);
        }
    }

    /// Iterate over the extensions.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(CompactString::as_str)
    }

    /// Check whether `name` has an extension in this set.
    ///
    /// The extension of a name is its last dot-delimited segment, dot
    /// included. Names without a dot have no extension.
    pub fn matches(&self, name: &str, case_sensitive: bool) -> bool {
        if self.extensions.is_empty() {
            return true;
        }

        let Some(ext) = extension_of(name) else {
            return false;
        };

        self.extensions.iter().any(|candidate| {
            if case_sensitive {
                candidate.as_str() == ext
            } else {
                candidate.eq_ignore_ascii_case(ext)
            }
        })
    }
}

impl<S: Into<CompactString>> FromIterator<S> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for ext in iter {
            set.insert(ext);
        }
        set
    }
}

impl<S: Into<CompactString>> From<Vec<S>> for ExtensionSet {
    fn from(extensions: Vec<S>) -> Self {
        extensions.into_iter().collect()
    }
}

impl<S: Into<CompactString> + Clone> From<&[S]> for ExtensionSet {
    fn from(extensions: &[S]) -> Self {
        extensions.iter().cloned().collect()
    }
}

impl<S: Into<CompactString>, const N: usize> From<[S; N]> for ExtensionSet {
    fn from(extensions: [S; N]) -> Self {
        extensions.into_iter().collect()
    }
}

/// Return the last dot-delimited segment of `name`, dot included.
fn extension_of(name: &str) -> Option<&str> {
    name.rfind('.').map(|idx| &name[idx..])
}

/// Names that are never listed, whatever the extension filter says.
///
/// Applied to file entries only; directories are always descended into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRules {
    /// Entries whose name starts with this character are hidden.
    #[serde(default = "default_hidden_marker")]
    pub hidden_marker: char,
    /// Reserved name of the in-progress live snapshot.
    #[serde(default = "default_snapshot_name")]
    pub snapshot_name: CompactString,
}

fn default_hidden_marker() -> char {
    HIDDEN_MARKER
}

fn default_snapshot_name() -> CompactString {
    CompactString::new(LIVE_SNAPSHOT_NAME)
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            hidden_marker: default_hidden_marker(),
            snapshot_name: default_snapshot_name(),
        }
    }
}

impl ExclusionRules {
    /// Check whether a file with this name must be skipped.
    pub fn excludes(&self, name: &str) -> bool {
        name.starts_with(self.hidden_marker) || name == self.snapshot_name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_matches_everything() {
        let set = ExtensionSet::new();
        assert!(set.matches("video1.mp4", true));
        assert!(set.matches("README", true));
    }

    #[test]
    fn test_suffix_matching() {
        let set = ExtensionSet::from([".mp4", ".avi", ".mkv"]);

        assert!(set.matches("video1.mp4", true));
        assert!(set.matches("clip.backup.mkv", true));
        assert!(!set.matches("image1.jpg", true));
        assert!(!set.matches("mp4", true));
        assert!(!set.matches("video.mp4.part", true));
    }

    #[test]
    fn test_case_sensitivity() {
        let set = ExtensionSet::from([".jpg"]);

        assert!(!set.matches("IMAGE.JPG", true));
        assert!(set.matches("IMAGE.JPG", false));
    }

    #[test]
    fn test_malformed_extension_never_matches() {
        let set = ExtensionSet::from(["mp4"]);
        assert!(!set.matches("video.mp4", true));
        assert!(!set.matches("video.mp4", false));
    }

    #[test]
    fn test_insert_dedup() {
        let mut set = ExtensionSet::new();
        set.insert(".mp4");
        set.insert(".mp4");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_exclusion_rules() {
        let rules = ExclusionRules::default();

        assert!(rules.excludes(".hidden"));
        assert!(rules.excludes(".dotfile.mp4"));
        assert!(rules.excludes("lastsnap.jpg"));
        assert!(!rules.excludes("lastsnap.jpg.bak"));
        assert!(!rules.excludes("video1.mp4"));
    }
}
