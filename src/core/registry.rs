// Registry
// Tracked repos (name -> directory) and explicit file/file pairs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{SyncerError, SyncerResult};

/// A directory tracked under a user-chosen name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRepo {
    /// Free-form unique name, conventionally a repository URL
    pub name: String,

    /// Absolute directory path
    pub path: PathBuf,
}

/// An unordered pair of files expected to stay identical
///
/// Stored as a two-element list so the store stays easy to edit by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "[PathBuf; 2]", into = "[PathBuf; 2]")]
pub struct TrackedFilePair {
    pub left: PathBuf,
    pub right: PathBuf,
}

impl TrackedFilePair {
    pub fn new(left: PathBuf, right: PathBuf) -> Self {
        Self { left, right }
    }

    /// Order-independent identity check
    pub fn same_files(&self, a: &Path, b: &Path) -> bool {
        (self.left == a && self.right == b) || (self.left == b && self.right == a)
    }
}

impl PartialEq for TrackedFilePair {
    fn eq(&self, other: &Self) -> bool {
        self.same_files(&other.left, &other.right)
    }
}

impl Eq for TrackedFilePair {}

impl From<[PathBuf; 2]> for TrackedFilePair {
    fn from([left, right]: [PathBuf; 2]) -> Self {
        Self { left, right }
    }
}

impl From<TrackedFilePair> for [PathBuf; 2] {
    fn from(pair: TrackedFilePair) -> Self {
        [pair.left, pair.right]
    }
}

/// Everything syncer has been asked to track, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub repos: Vec<TrackedRepo>,

    #[serde(default)]
    pub file_pairs: Vec<TrackedFilePair>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a directory under `name`
    ///
    /// Returns `Ok(false)` when the identical entry already exists.
    pub fn add_repo(&mut self, name: &str, path: &Path) -> SyncerResult<bool> {
        if let Some(existing) = self.repo(name) {
            if existing.path == path {
                debug!(name, "repo already tracked");
                return Ok(false);
            }
            return Err(SyncerError::DuplicateName {
                name: name.to_string(),
                existing: existing.path.clone(),
            });
        }

        self.repos.push(TrackedRepo {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
        Ok(true)
    }

    /// Track an explicit file pair
    ///
    /// Returns `Ok(false)` when the pair is already tracked in either order.
    pub fn add_file_pair(&mut self, a: &Path, b: &Path) -> SyncerResult<bool> {
        if a == b {
            return Err(SyncerError::InvalidPair(a.to_path_buf()));
        }

        if self.file_pairs.iter().any(|p| p.same_files(a, b)) {
            debug!(a = %a.display(), b = %b.display(), "file pair already tracked");
            return Ok(false);
        }

        self.file_pairs
            .push(TrackedFilePair::new(a.to_path_buf(), b.to_path_buf()));
        Ok(true)
    }

    /// Look up a tracked repo by name
    pub fn repo(&self, name: &str) -> Option<&TrackedRepo> {
        self.repos.iter().find(|r| r.name == name)
    }

    pub fn is_tracked_repo(&self, name: &str) -> bool {
        self.repo(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty() && self.file_pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_repo_is_idempotent() {
        let mut registry = Registry::new();
        assert!(registry.add_repo("urlA", Path::new("/src/a")).unwrap());
        assert!(!registry.add_repo("urlA", Path::new("/src/a")).unwrap());
        assert_eq!(registry.repos.len(), 1);
    }

    #[test]
    fn test_add_repo_rejects_duplicate_name() {
        let mut registry = Registry::new();
        registry.add_repo("urlA", Path::new("/src/a")).unwrap();

        let err = registry.add_repo("urlA", Path::new("/src/other")).unwrap_err();
        assert!(matches!(err, SyncerError::DuplicateName { .. }));
        assert_eq!(registry.repos[0].path, PathBuf::from("/src/a"));
    }

    #[test]
    fn test_file_pair_order_independent() {
        let mut registry = Registry::new();
        assert!(registry
            .add_file_pair(Path::new("/x/h.h"), Path::new("/y/h.h"))
            .unwrap());
        assert!(!registry
            .add_file_pair(Path::new("/y/h.h"), Path::new("/x/h.h"))
            .unwrap());
        assert_eq!(registry.file_pairs.len(), 1);
    }

    #[test]
    fn test_file_pair_rejects_same_path() {
        let mut registry = Registry::new();
        let err = registry
            .add_file_pair(Path::new("/x/h.h"), Path::new("/x/h.h"))
            .unwrap_err();
        assert!(matches!(err, SyncerError::InvalidPair(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_pair_equality_ignores_order() {
        let a = TrackedFilePair::new(PathBuf::from("/a"), PathBuf::from("/b"));
        let b = TrackedFilePair::new(PathBuf::from("/b"), PathBuf::from("/a"));
        assert_eq!(a, b);
    }
}
