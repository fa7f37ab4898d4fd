//! Logical media groups.

use std::fmt;
use std::path::{Component, Path};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Request token selecting the files directly in the root.
pub const UNGROUPED: &str = "ungrouped";

/// Longest directory name most filesystems accept, in bytes.
const MAX_NAME_LEN: usize = 255;

/// A logical sub-collection of media files under a root.
///
/// Groups are conventionally date-stamped subdirectories directly under the
/// root (`2024-01-01`). Files lying directly in the root belong to
/// [`Group::Ungrouped`].
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// No group filter: every file under the root, recursively.
    #[default]
    All,
    /// Files directly in the root only.
    Ungrouped,
    /// A single subdirectory directly under the root, recursively.
    Named(CompactString),
}

impl Group {
    /// Build a group from an optional request token.
    ///
    /// A missing token selects [`Group::All`]. The [`UNGROUPED`] keyword and
    /// the empty string select [`Group::Ungrouped`]. Anything else names a
    /// subdirectory.
    pub fn parse(token: Option<&str>) -> Self {
        match token {
            None => Group::All,
            Some("") | Some(UNGROUPED) => Group::Ungrouped,
            Some(name) => Group::Named(name.into()),
        }
    }

    /// Create a named group.
    pub fn named(name: impl Into<CompactString>) -> Self {
        Group::Named(name.into())
    }

    /// The token a caller would send to select this group, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Group::All => None,
            Group::Ungrouped => Some(UNGROUPED),
            Group::Named(name) => Some(name.as_str()),
        }
    }

    /// For named groups, check that the name is exactly one normal path
    /// segment. Names like `..`, `a/b` or `/abs` would escape the root.
    /// Names with a NUL byte or longer than a directory entry allows can
    /// never exist.
    pub fn is_single_segment(&self) -> bool {
        let Group::Named(name) = self else {
            return true;
        };
        if name.len() > MAX_NAME_LEN || name.contains(['\0', '/']) {
            return false;
        }
        if cfg!(windows) && name.contains('\\') {
            return false;
        }
        let mut components = Path::new(name.as_str()).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::All => f.write_str("*"),
            Group::Ungrouped => f.write_str(UNGROUPED),
            Group::Named(name) => f.write_str(name),
        }
    }
}

impl From<Option<&str>> for Group {
    fn from(token: Option<&str>) -> Self {
        Group::parse(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Group::parse(None), Group::All);
        assert_eq!(Group::parse(Some("ungrouped")), Group::Ungrouped);
        assert_eq!(Group::parse(Some("")), Group::Ungrouped);
        assert_eq!(Group::parse(Some("2024-01-01")), Group::named("2024-01-01"));
    }

    #[test]
    fn test_token_roundtrip() {
        for group in [Group::All, Group::Ungrouped, Group::named("2024-01-01")] {
            assert_eq!(Group::parse(group.token()), group);
        }
    }

    #[test]
    fn test_single_segment() {
        assert!(Group::named("2024-01-01").is_single_segment());
        assert!(Group::named(".thumbs").is_single_segment());
        assert!(!Group::named("..").is_single_segment());
        assert!(!Group::named(".").is_single_segment());
        assert!(!Group::named("a/b").is_single_segment());
        assert!(!Group::named("/etc").is_single_segment());
        assert!(Group::Ungrouped.is_single_segment());
    }

    #[test]
    fn test_unusable_names_rejected() {
        assert!(!Group::named("nul\0byte").is_single_segment());
        assert!(!Group::named("x".repeat(MAX_NAME_LEN + 1)).is_single_segment());
        assert!(Group::named("x".repeat(MAX_NAME_LEN)).is_single_segment());
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_is_a_plain_byte_on_unix() {
        assert!(Group::named("a\\b").is_single_segment());
    }

    #[test]
    fn test_ordering_puts_ungrouped_first() {
        let mut groups = vec![
            Group::named("2024-01-02"),
            Group::Ungrouped,
            Group::named("2024-01-01"),
        ];
        groups.sort();
        assert_eq!(groups[0], Group::Ungrouped);
        assert_eq!(groups[1], Group::named("2024-01-01"));
    }
}
