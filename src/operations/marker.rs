// Marker Convention
// Extracts and rewrites the home-repo marker embedded in tracked files

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::{SyncerError, SyncerResult};
use super::sync::write_atomic;

/// 1-indexed line that carries the marker in the default convention
pub const MARKER_LINE: usize = 3;

/// How a tracked file declares the repo it belongs to
///
/// The resolver and sync engine only go through this trait, so a different
/// convention (a header block, a sidecar file) can replace the fixed-line one.
pub trait MarkerConvention {
    /// Repo-name token declared by the file at `path`, if any
    ///
    /// Fails soft: unreadable or too-short files have no marker.
    fn read(&self, path: &Path) -> Option<String>;

    /// Repo-name token declared by already-loaded `content`, if any
    fn declared(&self, content: &[u8]) -> Option<String>;

    /// `content` with its marker rewritten to name `repo`
    fn rewrite(&self, content: &[u8], repo: &str, path: &Path) -> SyncerResult<Vec<u8>>;

    /// `content` with the marker removed, for comparisons that ignore it
    fn without_marker(&self, content: &[u8]) -> Vec<u8>;

    /// `content` with its marker taken from `donor` instead
    ///
    /// A donor without a marker slot has nothing to keep, so `content` is
    /// returned as is. A donor slot that `content` cannot hold is malformed.
    fn transplant(&self, content: &[u8], donor: &[u8], path: &Path) -> SyncerResult<Vec<u8>>;
}

/// The marker is the last whitespace-free token of line 3
///
/// ```text
/// // foo.h
/// //
/// // Home repo: github.com/org/lib
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ThirdLineMarker;

impl ThirdLineMarker {
    /// The trailing token of a marker line, ignoring the line ending
    fn token(line: &str) -> Option<&str> {
        line.split_whitespace().last()
    }

    fn too_short(path: &Path) -> SyncerError {
        SyncerError::malformed(
            path,
            format!("fewer than {} lines, no marker line to keep", MARKER_LINE),
        )
    }
}

/// Split into lines, each keeping its terminator
fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    content.split_inclusive(|b| *b == b'\n').collect()
}

/// Split a line into its body and its terminator (`\n`, `\r\n` or nothing)
fn split_ending(line: &[u8]) -> (&[u8], &[u8]) {
    let body_len = line
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |i| i + 1);
    line.split_at(body_len)
}

impl MarkerConvention for ThirdLineMarker {
    fn read(&self, path: &Path) -> Option<String> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();

        for _ in 0..MARKER_LINE {
            line.clear();
            if reader.read_until(b'\n', &mut line).ok()? == 0 {
                return None;
            }
        }

        let text = std::str::from_utf8(&line).ok()?;
        Self::token(text).map(str::to_string)
    }

    fn declared(&self, content: &[u8]) -> Option<String> {
        let line = split_lines(content).into_iter().nth(MARKER_LINE - 1)?;
        let text = std::str::from_utf8(line).ok()?;
        Self::token(text).map(str::to_string)
    }

    fn rewrite(&self, content: &[u8], repo: &str, path: &Path) -> SyncerResult<Vec<u8>> {
        let lines = split_lines(content);
        if lines.len() < MARKER_LINE {
            return Err(Self::too_short(path));
        }

        let (body, ending) = split_ending(lines[MARKER_LINE - 1]);
        let body = std::str::from_utf8(body)
            .map_err(|_| SyncerError::malformed(path, "marker line is not valid UTF-8"))?;

        let mut marker = match Self::token(body) {
            Some(token) => {
                // The token is the last one, so its last occurrence is the one to replace
                let start = body.rfind(token).unwrap_or(0);
                let mut rewritten = String::with_capacity(body.len() + repo.len());
                rewritten.push_str(&body[..start]);
                rewritten.push_str(repo);
                rewritten.push_str(&body[start + token.len()..]);
                rewritten.into_bytes()
            }
            None => repo.as_bytes().to_vec(),
        };
        marker.extend_from_slice(ending);

        let mut out = Vec::with_capacity(content.len() + repo.len());
        for (i, line) in lines.iter().enumerate() {
            if i == MARKER_LINE - 1 {
                out.extend_from_slice(&marker);
            } else {
                out.extend_from_slice(line);
            }
        }
        Ok(out)
    }

    fn without_marker(&self, content: &[u8]) -> Vec<u8> {
        split_lines(content)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != MARKER_LINE - 1)
            .flat_map(|(_, line)| line.iter().copied())
            .collect()
    }

    fn transplant(&self, content: &[u8], donor: &[u8], path: &Path) -> SyncerResult<Vec<u8>> {
        let lines = split_lines(content);
        let donor_lines = split_lines(donor);
        if donor_lines.len() < MARKER_LINE {
            return Ok(content.to_vec());
        }
        if lines.len() < MARKER_LINE {
            return Err(Self::too_short(path));
        }

        // The donor line is kept whole, ending included, unless it has none
        let (_, ending) = split_ending(lines[MARKER_LINE - 1]);
        let (donor_body, donor_ending) = split_ending(donor_lines[MARKER_LINE - 1]);
        let ending = if donor_ending.is_empty() { ending } else { donor_ending };

        let mut out = Vec::with_capacity(content.len() + donor_body.len());
        for (i, line) in lines.iter().enumerate() {
            if i == MARKER_LINE - 1 {
                out.extend_from_slice(donor_body);
                out.extend_from_slice(ending);
            } else {
                out.extend_from_slice(line);
            }
        }
        Ok(out)
    }
}

/// Read the marker of `path` with the default convention
pub fn read_marker(path: &Path) -> Option<String> {
    ThirdLineMarker.read(path)
}

/// Rewrite the marker of `path` in place to name `repo`
///
/// Every other line is preserved byte for byte.
pub fn write_marker(path: &Path, repo: &str) -> SyncerResult<()> {
    let content = fs::read(path).map_err(|e| SyncerError::io(path, e))?;
    let rewritten = ThirdLineMarker.rewrite(&content, repo, path)?;
    write_atomic(path, &rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "// foo.h\n//\n// Home repo: urlA\nint x;\n";

    #[test]
    fn test_read_marker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foo.h");
        fs::write(&path, HEADER).unwrap();
        assert_eq!(read_marker(&path).as_deref(), Some("urlA"));
    }

    #[test]
    fn test_read_marker_fails_soft() {
        let dir = TempDir::new().unwrap();

        let short = dir.path().join("short.h");
        fs::write(&short, "// short.h\n//\n").unwrap();
        assert_eq!(read_marker(&short), None);

        let blank = dir.path().join("blank.h");
        fs::write(&blank, "a\nb\n   \nc\n").unwrap();
        assert_eq!(read_marker(&blank), None);

        let binary = dir.path().join("blob.bin");
        fs::write(&binary, [0u8, 10, 1, 10, 0xff, 0xfe, 10]).unwrap();
        assert_eq!(read_marker(&binary), None);

        assert_eq!(read_marker(&dir.path().join("absent")), None);
    }

    #[test]
    fn test_read_marker_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foo.h");
        fs::write(&path, "a\nb\n# from urlB").unwrap();
        assert_eq!(read_marker(&path).as_deref(), Some("urlB"));
    }

    #[test]
    fn test_write_marker_preserves_other_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foo.h");
        fs::write(&path, "// foo.h\r\n//\r\n// Home repo: urlA  \r\nint x;\r\n").unwrap();

        write_marker(&path, "github.com/org/b").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "// foo.h\r\n//\r\n// Home repo: github.com/org/b  \r\nint x;\r\n"
        );
    }

    #[test]
    fn test_write_marker_requires_three_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foo.h");
        fs::write(&path, "// foo.h\n//\n").unwrap();

        let err = write_marker(&path, "urlA").unwrap_err();
        assert!(matches!(err, SyncerError::MalformedFile { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "// foo.h\n//\n");
    }

    #[test]
    fn test_rewrite_repeated_token() {
        let rewritten = ThirdLineMarker
            .rewrite(b"a\nb\n// urlA mirrors urlA\n", "urlB", Path::new("x"))
            .unwrap();
        assert_eq!(rewritten, b"a\nb\n// urlA mirrors urlB\n");
    }

    #[test]
    fn test_without_marker() {
        let stripped = ThirdLineMarker.without_marker(HEADER.as_bytes());
        assert_eq!(stripped, b"// foo.h\n//\nint x;\n");
    }

    #[test]
    fn test_transplant_keeps_donor_line() {
        let out = ThirdLineMarker
            .transplant(b"a\nb\n// new\nbody\n", b"x\ny\n// old marker\n", Path::new("t"))
            .unwrap();
        assert_eq!(out, b"a\nb\n// old marker\nbody\n");
    }

    #[test]
    fn test_declared_matches_read() {
        assert_eq!(
            ThirdLineMarker.declared(HEADER.as_bytes()),
            Some("urlA".to_string())
        );
        assert_eq!(ThirdLineMarker.declared(b"one\ntwo\n"), None);
    }

    #[test]
    fn test_transplant_short_donor_copies_verbatim() {
        let out = ThirdLineMarker
            .transplant(b"a\nb\n// new\nbody\n", b"x\n", Path::new("t"))
            .unwrap();
        assert_eq!(out, b"a\nb\n// new\nbody\n");
    }

    #[test]
    fn test_transplant_short_content_is_malformed() {
        let err = ThirdLineMarker
            .transplant(b"a\n", b"x\ny\n// old marker\n", Path::new("t"))
            .unwrap_err();
        assert!(matches!(err, SyncerError::MalformedFile { .. }));
    }
}
