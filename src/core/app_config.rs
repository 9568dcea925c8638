// Application Configuration
// Defaults compiled from config.yaml at build time
// Modify config.yaml and rebuild to change these values

// Include the auto-generated config from build.rs
pub mod compiled {
    include!(concat!(env!("OUT_DIR"), "/compiled_config.rs"));
}

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable that points syncer at a different store file
pub const STORE_ENV: &str = "SYNCER_STORE";

/// Application-level configuration for syncer
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Diff presentation and saved-diff settings
    pub diff: DiffSettings,

    /// Name of the store file inside the home directory
    pub store_file_name: String,

    /// Patterns skipped while walking repo directories
    pub global_excludes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DiffSettings {
    /// Number of context lines around changes
    pub context_lines: usize,

    /// Appended to a file name when a diff is saved beside it
    pub save_suffix: String,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            context_lines: compiled::CONTEXT_LINES,
            save_suffix: compiled::SAVE_SUFFIX.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            diff: DiffSettings::default(),
            store_file_name: compiled::STORE_FILE_NAME.to_string(),
            global_excludes: compiled::GLOBAL_EXCLUDES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    /// Resolve where the store lives
    ///
    /// An explicit path wins, then `SYNCER_STORE`, then the home directory.
    pub fn store_path(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }

        if let Some(path) = std::env::var_os(STORE_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir().context("Could not determine the home directory")?;
        Ok(home.join(&self.store_file_name))
    }
}
