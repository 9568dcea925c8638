// Pair Resolver
// Enumerates the concrete file pairs a check run should compare

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::diff::Side;
use super::marker::MarkerConvention;
use crate::core::{Registry, TrackedRepo};
use crate::errors::SyncerError;
use crate::utilities::PatternMatcher;

/// Where a candidate pair came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOrigin {
    /// Same relative path under two tracked repos
    Repos {
        /// Name of the repo holding the left file
        left: String,
        /// Name of the repo holding the right file
        right: String,
        /// A marker on either side naming a tracked repo outside this pair
        foreign_marker: Option<String>,
    },
    /// An explicitly tracked file pair
    Files,
}

/// A concrete pair of paths to compare now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePair {
    pub left: PathBuf,
    pub right: PathBuf,
    pub origin: PairOrigin,
}

impl CandidatePair {
    pub fn path(&self, side: Side) -> &Path {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Home repo of the file on `side`, for repo-derived pairs
    pub fn home(&self, side: Side) -> Option<&str> {
        match (&self.origin, side) {
            (PairOrigin::Repos { left, .. }, Side::Left) => Some(left),
            (PairOrigin::Repos { right, .. }, Side::Right) => Some(right),
            (PairOrigin::Files, _) => None,
        }
    }

    /// Whether `name` is one of the repos this pair was derived from
    pub fn names_repo(&self, name: &str) -> bool {
        match &self.origin {
            PairOrigin::Repos {
                left,
                right,
                foreign_marker,
            } => name == left || name == right || foreign_marker.as_deref() == Some(name),
            PairOrigin::Files => false,
        }
    }

    pub fn is_repo_pair(&self) -> bool {
        matches!(self.origin, PairOrigin::Repos { .. })
    }
}

/// Relative path -> recognized marker (if any) for every regular file in a repo
type RepoScan = BTreeMap<PathBuf, Option<String>>;

/// Resolves the registry into candidate pairs
pub struct PairResolver<'a> {
    registry: &'a Registry,
    marker: &'a dyn MarkerConvention,
    excludes: PatternMatcher,
}

impl<'a> PairResolver<'a> {
    pub fn new(
        registry: &'a Registry,
        marker: &'a dyn MarkerConvention,
        excludes: PatternMatcher,
    ) -> Self {
        Self {
            registry,
            marker,
            excludes,
        }
    }

    /// A fresh pass over every candidate
    ///
    /// Repo pairs come first in registry order (every unordered pair, not just
    /// neighbours) with relative paths in lexical order, then the explicit
    /// file pairs in registry order. Unreachable repos are yielded once as
    /// errors and their pairs are skipped.
    pub fn candidates(&self) -> Candidates<'_, 'a> {
        let count = self.registry.repos.len();
        let repo_pairs = (0..count)
            .flat_map(|i| (i + 1..count).map(move |j| (i, j)))
            .collect();

        Candidates {
            resolver: self,
            repo_pairs,
            next_repo_pair: 0,
            next_file_pair: 0,
            scans: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Walk a repo and record the marker of every regular file
    fn scan(&self, repo: &TrackedRepo) -> Result<RepoScan, SyncerError> {
        if !repo.path.is_dir() {
            return Err(SyncerError::UnreachableRepo {
                name: repo.name.clone(),
                path: repo.path.clone(),
            });
        }

        let root = repo.path.as_path();
        let mut scan = RepoScan::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| match e.path().strip_prefix(root) {
                Ok(rel) => !self.excludes.should_exclude(rel),
                Err(_) => true,
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(repo = %repo.name, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };
            let marker = self
                .marker
                .read(entry.path())
                .filter(|name| self.registry.is_tracked_repo(name));
            scan.insert(relative, marker);
        }

        debug!(repo = %repo.name, files = scan.len(), "scanned repo");
        Ok(scan)
    }

    /// Shared relative paths of two scans where at least one side is marked
    fn pair_repos(
        &self,
        left: &TrackedRepo,
        left_scan: &RepoScan,
        right: &TrackedRepo,
        right_scan: &RepoScan,
    ) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();

        for (relative, left_marker) in left_scan {
            let Some(right_marker) = right_scan.get(relative) else {
                continue;
            };
            if left_marker.is_none() && right_marker.is_none() {
                continue;
            }

            let left_path = left.path.join(relative);
            let right_path = right.path.join(relative);
            if left_path == right_path {
                continue;
            }

            let foreign_marker = [left_marker, right_marker]
                .into_iter()
                .flatten()
                .find(|m| **m != left.name && **m != right.name)
                .cloned();
            if let Some(foreign) = &foreign_marker {
                debug!(
                    path = %relative.display(),
                    marker = %foreign,
                    "marker names a repo outside this pair"
                );
            }

            pairs.push(CandidatePair {
                left: left_path,
                right: right_path,
                origin: PairOrigin::Repos {
                    left: left.name.clone(),
                    right: right.name.clone(),
                    foreign_marker,
                },
            });
        }

        pairs
    }
}

/// Lazy, finite pass over candidate pairs; call `PairResolver::candidates` to restart
pub struct Candidates<'r, 'a> {
    resolver: &'r PairResolver<'a>,
    repo_pairs: Vec<(usize, usize)>,
    next_repo_pair: usize,
    next_file_pair: usize,
    /// Cached walks by repo index; `None` marks an unreachable repo
    scans: HashMap<usize, Option<Rc<RepoScan>>>,
    pending: VecDeque<Result<CandidatePair, SyncerError>>,
}

impl Candidates<'_, '_> {
    fn scan(&mut self, index: usize) -> Option<Rc<RepoScan>> {
        if let Some(cached) = self.scans.get(&index) {
            return cached.clone();
        }

        let resolver = self.resolver;
        let repo = &resolver.registry.repos[index];
        let scan = match resolver.scan(repo) {
            Ok(scan) => Some(Rc::new(scan)),
            Err(e) => {
                warn!(repo = %repo.name, "{}", e);
                self.pending.push_back(Err(e));
                None
            }
        };
        self.scans.insert(index, scan.clone());
        scan
    }
}

impl Iterator for Candidates<'_, '_> {
    type Item = Result<CandidatePair, SyncerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }

            if let Some(&(i, j)) = self.repo_pairs.get(self.next_repo_pair) {
                self.next_repo_pair += 1;

                let left_scan = self.scan(i);
                let right_scan = self.scan(j);
                if let (Some(left_scan), Some(right_scan)) = (left_scan, right_scan) {
                    let resolver = self.resolver;
                    let repos = &resolver.registry.repos;
                    let pairs = resolver.pair_repos(&repos[i], &left_scan, &repos[j], &right_scan);
                    self.pending.extend(pairs.into_iter().map(Ok));
                }
                continue;
            }

            let pair = self
                .resolver
                .registry
                .file_pairs
                .get(self.next_file_pair)?;
            self.next_file_pair += 1;

            return Some(Ok(CandidatePair {
                left: pair.left.clone(),
                right: pair.right.clone(),
                origin: PairOrigin::Files,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::marker::ThirdLineMarker;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn marked(repo: &str) -> String {
        format!("// file\n//\n// Home repo: {}\nbody\n", repo)
    }

    fn resolve(registry: &Registry) -> Vec<Result<CandidatePair, SyncerError>> {
        let resolver = PairResolver::new(
            registry,
            &ThirdLineMarker,
            PatternMatcher::new(vec![".git".to_string()]),
        );
        resolver.candidates().collect()
    }

    #[test]
    fn test_shared_marked_paths_become_candidates() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        write(&a.join("inc/foo.h"), &marked("urlA"));
        write(&b.join("inc/foo.h"), &marked("urlB"));
        write(&a.join("only_a.h"), &marked("urlA"));
        write(&a.join("plain.txt"), "no marker here\n");
        write(&b.join("plain.txt"), "different\n");

        let mut registry = Registry::new();
        registry.add_repo("urlA", &a).unwrap();
        registry.add_repo("urlB", &b).unwrap();

        let pairs: Vec<CandidatePair> = resolve(&registry)
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].left, a.join("inc/foo.h"));
        assert_eq!(pairs[0].right, b.join("inc/foo.h"));
        assert_eq!(pairs[0].home(Side::Left), Some("urlA"));
        assert_eq!(pairs[0].home(Side::Right), Some("urlB"));
    }

    #[test]
    fn test_all_repo_pairs_are_considered() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::new();
        for name in ["r1", "r2", "r3"] {
            let root = dir.path().join(name);
            write(&root.join("x.h"), &marked("r1"));
            registry.add_repo(name, &root).unwrap();
        }

        let pairs: Vec<(PathBuf, PathBuf)> = resolve(&registry)
            .into_iter()
            .map(|r| {
                let p = r.unwrap();
                (p.left, p.right)
            })
            .collect();

        let root = dir.path();
        assert_eq!(
            pairs,
            vec![
                (root.join("r1/x.h"), root.join("r2/x.h")),
                (root.join("r1/x.h"), root.join("r3/x.h")),
                (root.join("r2/x.h"), root.join("r3/x.h")),
            ]
        );
    }

    #[test]
    fn test_foreign_marker_is_flagged() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::new();
        for name in ["r1", "r2", "r3"] {
            registry.add_repo(name, &dir.path().join(name)).unwrap();
        }
        write(&dir.path().join("r1/x.h"), &marked("r3"));
        write(&dir.path().join("r2/x.h"), &marked("r3"));
        fs::create_dir_all(dir.path().join("r3")).unwrap();

        let first = resolve(&registry).remove(0).unwrap();
        assert_eq!(
            first.origin,
            PairOrigin::Repos {
                left: "r1".to_string(),
                right: "r2".to_string(),
                foreign_marker: Some("r3".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_marker_token_is_ignored() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        write(&a.join("x.h"), &marked("someone-else"));
        write(&b.join("x.h"), &marked("someone-else"));

        let mut registry = Registry::new();
        registry.add_repo("urlA", &a).unwrap();
        registry.add_repo("urlB", &b).unwrap();

        assert!(resolve(&registry).is_empty());
    }

    #[test]
    fn test_excluded_directories_are_not_walked() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        write(&a.join(".git/x.h"), &marked("urlA"));
        write(&b.join(".git/x.h"), &marked("urlB"));

        let mut registry = Registry::new();
        registry.add_repo("urlA", &a).unwrap();
        registry.add_repo("urlB", &b).unwrap();

        assert!(resolve(&registry).is_empty());
    }

    #[test]
    fn test_unreachable_repo_reported_once() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::new();
        registry.add_repo("gone", &dir.path().join("gone")).unwrap();
        registry.add_repo("r2", dir.path()).unwrap();
        registry.add_repo("r3", dir.path()).unwrap();

        let errors: Vec<_> = resolve(&registry)
            .into_iter()
            .filter_map(Result::err)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SyncerError::UnreachableRepo { .. }));
    }

    #[test]
    fn test_file_pairs_emitted_verbatim_and_restartable() {
        let mut registry = Registry::new();
        registry
            .add_file_pair(Path::new("/nowhere/a.h"), Path::new("/nowhere/b.h"))
            .unwrap();

        let resolver = PairResolver::new(&registry, &ThirdLineMarker, PatternMatcher::default());
        let first: Vec<_> = resolver.candidates().map(Result::unwrap).collect();
        let second: Vec<_> = resolver.candidates().map(Result::unwrap).collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].origin, PairOrigin::Files);
        assert_eq!(first[0].left, PathBuf::from("/nowhere/a.h"));
    }
}
