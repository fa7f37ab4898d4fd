//! Group-aware listings on top of a scanner.

use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::time::SystemTime;

use compact_str::CompactString;
use tracing::{debug, warn};

use mediaindex_core::{
    Group, Listing, MediaEntry, ScanConfig, ScanError, ScanWarning, WarningKind,
};

use crate::scanner::{MediaScanner, TreeScanner};

/// Per-group totals for a media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    /// The group.
    pub group: Group,
    /// Number of matching files in the group.
    pub file_count: u64,
    /// Total size of those files.
    pub total_size: u64,
    /// Modification time of the newest file.
    pub newest: Option<SystemTime>,
}

impl GroupSummary {
    fn new(group: Group) -> Self {
        Self {
            group,
            file_count: 0,
            total_size: 0,
            newest: None,
        }
    }

    fn add(&mut self, entry: &MediaEntry) {
        self.file_count += 1;
        self.total_size += entry.size();
        let modified = entry.modified();
        if self.newest.is_none_or(|t| modified > t) {
            self.newest = Some(modified);
        }
    }
}

/// Resolves group tokens to traversal roots and lists them.
///
/// - [`Group::All`] lists the whole tree.
/// - [`Group::Ungrouped`] lists only files directly in the root.
/// - [`Group::Named`] lists the subdirectory of that name, recursively. A
///   group that does not exist yields an empty listing.
pub struct GroupResolver<S = TreeScanner> {
    scanner: S,
}

impl GroupResolver<TreeScanner> {
    /// Create a resolver backed by the sequential scanner.
    pub fn new() -> Self {
        Self {
            scanner: TreeScanner::new(),
        }
    }
}

impl Default for GroupResolver<TreeScanner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MediaScanner> GroupResolver<S> {
    /// Create a resolver backed by the given scanner.
    pub fn with_scanner(scanner: S) -> Self {
        Self { scanner }
    }

    /// The underlying scanner.
    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    /// List the files of `group` under `root`.
    pub fn list(
        &self,
        root: &Path,
        config: &ScanConfig,
        group: &Group,
    ) -> Result<Listing, ScanError> {
        match group {
            Group::All => self.scanner.scan(root, config),
            Group::Ungrouped => self.scanner.scan(root, &config.with_max_depth(Some(1))),
            Group::Named(name) => {
                if !group.is_single_segment() {
                    warn!(root = %root.display(), group = %name, "rejecting group token");
                    let warning = ScanWarning::new(
                        root,
                        format!("Invalid group name: {name}"),
                        WarningKind::InvalidGroup,
                    );
                    return Ok(Listing::empty(root, vec![warning]));
                }

                let sub_root = root.join(name.as_str());
                debug!(path = %sub_root.display(), "listing group");
                self.scanner.scan(&sub_root, config)
            }
        }
    }

    /// List the files selected by a raw request token.
    ///
    /// `None` lists everything; `"ungrouped"` lists the root files only.
    pub fn list_token(
        &self,
        root: &Path,
        config: &ScanConfig,
        token: Option<&str>,
    ) -> Result<Listing, ScanError> {
        self.list(root, config, &Group::parse(token))
    }

    /// Count files and bytes per group with a single walk of `root`.
    ///
    /// Group directories without matching files do not appear. The result is
    /// ordered with [`Group::Ungrouped`] first, then by group name.
    pub fn summarize(
        &self,
        root: &Path,
        config: &ScanConfig,
    ) -> Result<Vec<GroupSummary>, ScanError> {
        let listing = self.scanner.scan(root, config)?;
        let mut groups: BTreeMap<Group, GroupSummary> = BTreeMap::new();

        for entry in &listing.entries {
            let Some(group) = group_of(root, &entry.path) else {
                continue;
            };
            groups
                .entry(group.clone())
                .or_insert_with(|| GroupSummary::new(group))
                .add(entry);
        }

        Ok(groups.into_values().collect())
    }
}

/// The group a file under `root` belongs to.
///
/// Files directly in `root` are [`Group::Ungrouped`]; anything deeper belongs
/// to the group named by its first path segment. Paths outside `root` have
/// no group.
pub fn group_of(root: &Path, path: &Path) -> Option<Group> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components();

    let first = match components.next()? {
        Component::Normal(name) => name,
        _ => return None,
    };
    if components.next().is_none() {
        return Some(Group::Ungrouped);
    }
    Some(Group::Named(CompactString::new(first.to_string_lossy())))
}
