// Persisted Store
// The single hand-editable YAML file holding the registry and remind ledger

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use super::{Registry, RemindLedger};
use crate::errors::SyncerError;

/// Everything syncer persists between invocations
///
/// Read fully at the start of a command and written fully at the end of a
/// command that mutates it. An interrupted command never writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Tracked repos and file pairs
    #[serde(flatten)]
    pub registry: Registry,

    /// Paths overwritten by the last check
    #[serde(default)]
    pub remind: RemindLedger,
}

impl Store {
    /// Load the store from `path`
    ///
    /// A missing or empty file yields an empty store. Unparsable content is
    /// `StoreCorrupt` and the file is left as it is.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no store yet, starting empty");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read store: {}", path.display()))?;

        Self::parse(&content).map_err(|detail| {
            SyncerError::StoreCorrupt {
                path: path.to_path_buf(),
                detail,
            }
            .into()
        })
    }

    /// Parse store text; an all-blank document is an empty store
    pub fn parse(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Serialize to the on-disk YAML form
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize store")
    }

    /// Replace the store at `path` with this one
    ///
    /// Writes a sibling temp file and renames it over the target, so readers
    /// see either the old store or the new one, never a truncated file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .context("Failed to create temp file for store write")?;
        tmp.write_all(content.as_bytes())
            .context("Failed to write store contents")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush store contents")?;
        tmp.persist(path)
            .with_context(|| format!("Failed to persist store: {}", path.display()))?;

        info!(
            path = %path.display(),
            repos = self.registry.repos.len(),
            file_pairs = self.registry.file_pairs.len(),
            remind = self.remind.len(),
            "store saved"
        );
        Ok(())
    }
}
