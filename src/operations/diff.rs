// Diff Engine
// Compares candidate pair contents, decides which side is newer, renders diffs

use similar::TextDiff;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::marker::MarkerConvention;
use crate::errors::{SyncerError, SyncerResult};

/// One side of a candidate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Which side of a pair was modified last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The left file has the strictly later mtime
    LeftNewer,
    /// The right file has the strictly later mtime
    RightNewer,
    /// Equal mtimes; no default direction
    Tie,
}

impl Freshness {
    pub fn from_times(left: SystemTime, right: SystemTime) -> Self {
        match left.cmp(&right) {
            std::cmp::Ordering::Greater => Freshness::LeftNewer,
            std::cmp::Ordering::Less => Freshness::RightNewer,
            std::cmp::Ordering::Equal => Freshness::Tie,
        }
    }

    /// The newer side, unless the timestamps tie
    pub fn newer(self) -> Option<Side> {
        match self {
            Freshness::LeftNewer => Some(Side::Left),
            Freshness::RightNewer => Some(Side::Right),
            Freshness::Tie => None,
        }
    }

    pub fn older(self) -> Option<Side> {
        self.newer().map(Side::other)
    }

    /// Arrow shown between the two display names
    pub fn arrow(self) -> &'static str {
        match self {
            Freshness::LeftNewer => "<-newer  ",
            Freshness::RightNewer => "  newer->",
            Freshness::Tie => "!=",
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arrow().trim())
    }
}

/// Contents and mtime of one file, read once per pair
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub modified: SystemTime,
}

impl FileSnapshot {
    /// Read a file, reporting absence as `MissingFile`
    pub fn read(path: &Path) -> SyncerResult<Self> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncerError::MissingFile(path.to_path_buf()))
            }
            Err(e) => return Err(SyncerError::io(path, e)),
        };
        if !metadata.is_file() {
            return Err(SyncerError::MissingFile(path.to_path_buf()));
        }

        let modified = metadata.modified().map_err(|e| SyncerError::io(path, e))?;
        let content = fs::read(path).map_err(|e| SyncerError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            content,
            modified,
        })
    }
}

/// Engine for comparing and diffing pair contents
#[derive(Debug, Clone)]
pub struct DiffEngine {
    /// Context lines around each hunk
    context_lines: usize,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(3)
    }
}

impl DiffEngine {
    pub fn new(context_lines: usize) -> Self {
        Self { context_lines }
    }

    /// Whether two snapshots count as in sync
    ///
    /// Identical bytes always match. With a `marker` convention the contents
    /// are also compared with the marker removed, for pairs whose copies may
    /// legitimately declare different homes.
    pub fn contents_match(
        &self,
        left: &[u8],
        right: &[u8],
        marker: Option<&dyn MarkerConvention>,
    ) -> bool {
        if left == right {
            return true;
        }
        match marker {
            Some(marker) => marker.without_marker(left) == marker.without_marker(right),
            None => false,
        }
    }

    /// Unified diff from `old` to `new`, headed with the given names
    pub fn unified_diff(&self, old_name: &str, old: &[u8], new_name: &str, new: &[u8]) -> String {
        let old_text = String::from_utf8_lossy(old);
        let new_text = String::from_utf8_lossy(new);

        let diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());
        diff.unified_diff()
            .context_radius(self.context_lines)
            .header(old_name, new_name)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::marker::ThirdLineMarker;
    use std::time::Duration;

    #[test]
    fn test_freshness_from_times() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let t1 = t0 + Duration::from_secs(5);

        assert_eq!(Freshness::from_times(t1, t0), Freshness::LeftNewer);
        assert_eq!(Freshness::from_times(t0, t1), Freshness::RightNewer);
        assert_eq!(Freshness::from_times(t0, t0), Freshness::Tie);
        assert_eq!(Freshness::Tie.newer(), None);
        assert_eq!(Freshness::RightNewer.older(), Some(Side::Left));
    }

    #[test]
    fn test_contents_match_ignores_marker_only() {
        let engine = DiffEngine::default();
        let a = b"// f.h\n//\n// Home repo: urlA\nint x;\n";
        let b = b"// f.h\n//\n// Home repo: urlB\nint x;\n";
        let c = b"// f.h\n//\n// Home repo: urlB\nint y;\n";

        assert!(engine.contents_match(a, a, Some(&ThirdLineMarker)));
        assert!(engine.contents_match(a, b, Some(&ThirdLineMarker)));
        assert!(!engine.contents_match(a, c, Some(&ThirdLineMarker)));
    }

    #[test]
    fn test_contents_match_without_marker_compares_every_line() {
        let engine = DiffEngine::default();
        let a = b"// f.h\n//\n// Home repo: urlA\nint x;\n";
        let b = b"// f.h\n//\nint injected;\nint x;\n";

        assert!(engine.contents_match(a, a, None));
        assert!(!engine.contents_match(a, b, None));
    }

    #[test]
    fn test_unified_diff_headers_and_hunks() {
        let engine = DiffEngine::new(1);
        let diff = engine.unified_diff("r1:foo.h", b"a\nb\nc\n", "r2:foo.h", b"a\nB\nc\n");

        assert!(diff.starts_with("--- r1:foo.h\n+++ r2:foo.h\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+B\n"));
    }

    #[test]
    fn test_snapshot_of_missing_file() {
        let err = FileSnapshot::read(Path::new("/definitely/not/here.h")).unwrap_err();
        assert!(matches!(err, SyncerError::MissingFile(_)));
    }
}
