// Sync Engine
// Applies a chosen resolution: copy one side over the other, or save the diff

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::diff::{FileSnapshot, Side};
use super::marker::MarkerConvention;
use super::resolver::CandidatePair;
use crate::errors::{SyncerError, SyncerResult};
use crate::utilities::paths::with_suffix;

/// How many numbered names to try before giving up on saving a diff
const MAX_DIFF_FILES: usize = 1000;

/// Replace `path` with `bytes` without ever leaving it half-written
///
/// The bytes go to a temp file in the same directory which is then renamed
/// over the target. The target's permission bits are carried over. On any
/// failure the original file is untouched.
///
/// A symlinked `path` is resolved first, so the link stays a link and its
/// target is replaced. The rename needs write access to the directory that
/// holds the file; a writable file in a read-only directory fails with `Io`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> SyncerResult<()> {
    let is_link = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    let target = if is_link {
        let resolved = fs::canonicalize(path).map_err(|e| SyncerError::io(path, e))?;
        debug!(link = %path.display(), target = %resolved.display(), "writing through symlink");
        resolved
    } else {
        path.to_path_buf()
    };
    let path = target.as_path();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SyncerError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| SyncerError::io(tmp.path(), e))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())
            .map_err(|e| SyncerError::io(tmp.path(), e))?;
    }

    tmp.persist(path).map_err(|e| SyncerError::io(path, e.error))?;
    Ok(())
}

/// Engine for applying resolutions to a candidate pair
pub struct SyncEngine<'a> {
    marker: &'a dyn MarkerConvention,
    /// Appended to the file name when a diff is saved
    save_suffix: String,
}

impl<'a> SyncEngine<'a> {
    pub fn new(marker: &'a dyn MarkerConvention, save_suffix: impl Into<String>) -> Self {
        Self {
            marker,
            save_suffix: save_suffix.into(),
        }
    }

    /// Bytes the destination should hold after copying `source` over it
    ///
    /// Repo pairs rewrite the marker to name the destination's own repo.
    /// File pairs, and repo-pair sources whose line 3 names no repo of the
    /// pair, keep the destination's original marker line.
    pub fn copied_content(
        &self,
        pair: &CandidatePair,
        source: &FileSnapshot,
        dest: &FileSnapshot,
        dest_side: Side,
    ) -> SyncerResult<Vec<u8>> {
        let declared = self.marker.declared(&source.content);
        match pair.home(dest_side) {
            Some(home) if declared.is_some_and(|name| pair.names_repo(&name)) => {
                self.marker.rewrite(&source.content, home, &dest.path)
            }
            _ => self
                .marker
                .transplant(&source.content, &dest.content, &dest.path),
        }
    }

    /// Copy `source` over `dest`, returning the overwritten path
    ///
    /// Nothing is written when the marker rule cannot be applied.
    pub fn copy_over(
        &self,
        pair: &CandidatePair,
        source: &FileSnapshot,
        dest: &FileSnapshot,
        dest_side: Side,
    ) -> SyncerResult<PathBuf> {
        let content = self.copied_content(pair, source, dest, dest_side)?;
        write_atomic(&dest.path, &content)?;

        info!(
            from = %source.path.display(),
            to = %dest.path.display(),
            "copied"
        );
        Ok(dest.path.clone())
    }

    /// Write `diff` to a new file beside `beside`, never overwriting
    pub fn save_diff(&self, beside: &Path, diff: &str) -> SyncerResult<PathBuf> {
        let first = with_suffix(beside, &self.save_suffix);

        for attempt in 0..MAX_DIFF_FILES {
            let candidate = if attempt == 0 {
                first.clone()
            } else {
                with_suffix(&first, &format!(".{}", attempt))
            };

            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut file) => {
                    file.write_all(diff.as_bytes())
                        .map_err(|e| SyncerError::io(&candidate, e))?;
                    info!(path = %candidate.display(), "saved diff");
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %candidate.display(), "diff file exists, trying next name");
                }
                Err(e) => return Err(SyncerError::io(&candidate, e)),
            }
        }

        Err(SyncerError::io(
            first,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free name for the diff file",
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::marker::ThirdLineMarker;
    use crate::operations::resolver::PairOrigin;
    use tempfile::TempDir;

    fn snapshot(path: &Path, content: &str) -> FileSnapshot {
        fs::write(path, content).unwrap();
        FileSnapshot::read(path).unwrap()
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.h");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        write_atomic(&path, b"#!/bin/sh\necho hi\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.h");
        let link = dir.path().join("link.h");
        fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_atomic(&link, b"new").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
    }

    #[test]
    fn test_repo_copy_rewrites_marker_to_destination_home() {
        let dir = TempDir::new().unwrap();
        let pair = CandidatePair {
            left: dir.path().join("a.h"),
            right: dir.path().join("b.h"),
            origin: PairOrigin::Repos {
                left: "urlA".into(),
                right: "urlB".into(),
                foreign_marker: None,
            },
        };
        let left = snapshot(&pair.left, "// a.h\n//\n// Home repo: urlA\nold\n");
        let right = snapshot(&pair.right, "// a.h\n//\n// Home repo: urlB\nnew\n");

        let engine = SyncEngine::new(&ThirdLineMarker, ".diff");
        engine.copy_over(&pair, &right, &left, Side::Left).unwrap();

        assert_eq!(
            fs::read_to_string(&pair.left).unwrap(),
            "// a.h\n//\n// Home repo: urlA\nnew\n"
        );
    }

    #[test]
    fn test_unmarked_repo_source_keeps_destination_line() {
        let dir = TempDir::new().unwrap();
        let pair = CandidatePair {
            left: dir.path().join("a.h"),
            right: dir.path().join("b.h"),
            origin: PairOrigin::Repos {
                left: "urlA".into(),
                right: "urlB".into(),
                foreign_marker: None,
            },
        };
        let left = snapshot(&pair.left, "// a.h\n//\n// Home repo: urlA\nold\n");
        let right = snapshot(&pair.right, "// a.h\n//\n// no marker here\nnew\n");

        let engine = SyncEngine::new(&ThirdLineMarker, ".diff");
        engine.copy_over(&pair, &right, &left, Side::Left).unwrap();

        assert_eq!(
            fs::read_to_string(&pair.left).unwrap(),
            "// a.h\n//\n// Home repo: urlA\nnew\n"
        );
    }

    #[test]
    fn test_file_copy_keeps_destination_marker_line() {
        let dir = TempDir::new().unwrap();
        let pair = CandidatePair {
            left: dir.path().join("a.h"),
            right: dir.path().join("b.h"),
            origin: PairOrigin::Files,
        };
        let left = snapshot(&pair.left, "// h.h\n//\n// left flavour\nnew body\n");
        let right = snapshot(&pair.right, "// h.h\n//\n// right flavour\nold body\n");

        let engine = SyncEngine::new(&ThirdLineMarker, ".diff");
        engine.copy_over(&pair, &left, &right, Side::Right).unwrap();

        assert_eq!(
            fs::read_to_string(&pair.right).unwrap(),
            "// h.h\n//\n// right flavour\nnew body\n"
        );
    }

    #[test]
    fn test_malformed_source_leaves_destination_alone() {
        let dir = TempDir::new().unwrap();
        let pair = CandidatePair {
            left: dir.path().join("a.h"),
            right: dir.path().join("b.h"),
            origin: PairOrigin::Files,
        };
        let left = snapshot(&pair.left, "too short\n");
        let right = snapshot(&pair.right, "a\nb\nc\n");

        let engine = SyncEngine::new(&ThirdLineMarker, ".diff");
        let err = engine.copy_over(&pair, &left, &right, Side::Right).unwrap_err();

        assert!(matches!(err, SyncerError::MalformedFile { .. }));
        assert_eq!(fs::read_to_string(&pair.right).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn test_save_diff_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let beside = dir.path().join("foo.h");
        let engine = SyncEngine::new(&ThirdLineMarker, ".syncer.diff");

        let first = engine.save_diff(&beside, "one").unwrap();
        let second = engine.save_diff(&beside, "two").unwrap();

        assert_eq!(first, dir.path().join("foo.h.syncer.diff"));
        assert_eq!(second, dir.path().join("foo.h.syncer.diff.1"));
        assert_eq!(fs::read_to_string(first).unwrap(), "one");
        assert_eq!(fs::read_to_string(second).unwrap(), "two");
    }
}
