// Remind Ledger
// Paths overwritten by the most recent check run

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths touched by the last reconciliation run, in the order they were written
///
/// `check` clears it before resolving anything and the store persists the
/// whole set afterwards. `remind` only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemindLedger {
    paths: Vec<PathBuf>,
}

impl RemindLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh run; the previous run's entries are dropped
    pub fn begin_run(&mut self) {
        self.paths.clear();
    }

    /// Note that `path` was overwritten; repeated writes are recorded once
    pub fn record(&mut self, path: &Path) {
        if !self.paths.iter().any(|p| p == path) {
            self.paths.push(path.to_path_buf());
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}
