// Error Types
// Failures surfaced by tracking, reconciliation and the persisted store

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by syncer operations.
///
/// Registry and store errors abort the whole command. Pair-level errors
/// (`MissingFile`, `MalformedFile`, `Io` during a copy) are collected per
/// candidate pair and never stop a `check` run.
#[derive(Debug, Error)]
pub enum SyncerError {
    /// A repo name is already tracked under a different directory.
    #[error("repo '{name}' is already tracked at {existing}")]
    DuplicateName { name: String, existing: PathBuf },

    /// A file pair names the same path twice.
    #[error("cannot pair {0} with itself")]
    InvalidPair(PathBuf),

    /// A candidate pair references a file that no longer exists.
    #[error("file not found: {0}")]
    MissingFile(PathBuf),

    /// The marker line convention is violated on a write target.
    #[error("malformed file {path}: {detail}")]
    MalformedFile { path: PathBuf, detail: String },

    /// The persisted store could not be parsed.
    #[error("store at {path} is corrupt: {detail}")]
    StoreCorrupt { path: PathBuf, detail: String },

    /// A tracked repo directory is missing at resolution time.
    #[error("repo '{name}' is unreachable: {path} does not exist")]
    UnreachableRepo { name: String, path: PathBuf },

    /// The operator aborted the run.
    #[error("interrupted by operator")]
    Interrupted,

    /// The interactive prompt could not talk to the terminal.
    #[error("terminal error: {0}")]
    Terminal(#[source] std::io::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::MalformedFile {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

pub type SyncerResult<T> = Result<T, SyncerError>;
