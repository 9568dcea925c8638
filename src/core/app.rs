// Application State
// Explicit state object carrying config and store into each command

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{AppConfig, Store};
use crate::operations::{
    DecisionProvider, MarkerConvention, PairResolver, Reconciler, RunSummary, ThirdLineMarker,
};
use crate::utilities::{absolutize, PatternMatcher};

/// Main application state
///
/// Commands mutate `store` in memory only; the caller decides when to
/// `persist`, so an interrupted command leaves the file on disk untouched.
pub struct App {
    /// Application configuration (built-in defaults)
    pub config: AppConfig,

    /// Where the store is loaded from and saved to
    pub store_path: PathBuf,

    /// Registry and remind ledger
    pub store: Store,

    /// Convention used to find and rewrite home-repo markers
    marker: Box<dyn MarkerConvention>,
}

impl App {
    /// Load the store at `store_path`
    pub fn open(config: AppConfig, store_path: PathBuf) -> Result<Self> {
        let store = Store::load(&store_path)?;
        Ok(Self::with_store(config, store_path, store))
    }

    /// Build around an already-loaded store
    pub fn with_store(config: AppConfig, store_path: PathBuf, store: Store) -> Self {
        Self {
            config,
            store_path,
            store,
            marker: Box::new(ThirdLineMarker),
        }
    }

    /// Swap in a different marker convention
    pub fn with_marker(mut self, marker: Box<dyn MarkerConvention>) -> Self {
        self.marker = marker;
        self
    }

    /// Track `dir` under `name`; returns whether anything changed
    pub fn track_repo(&mut self, name: &str, dir: &Path) -> Result<bool> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            bail!("Repo name '{}' must be non-empty and contain no whitespace", name);
        }

        let dir = dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve directory: {}", dir.display()))?;
        let added = self.store.registry.add_repo(name, &dir)?;

        if added {
            info!(name, path = %dir.display(), "tracking repo");
        }
        Ok(added)
    }

    /// Track a file pair given relative to `cwd`; the files need not exist yet
    pub fn track_files(&mut self, cwd: &Path, a: &Path, b: &Path) -> Result<bool> {
        let a = absolutize(cwd, a);
        let b = absolutize(cwd, b);
        let added = self.store.registry.add_file_pair(&a, &b)?;

        if added {
            info!(a = %a.display(), b = %b.display(), "tracking file pair");
        }
        Ok(added)
    }

    /// Reconcile every candidate pair, asking `provider` about each difference
    ///
    /// Replaces the remind ledger with the paths this run overwrote.
    pub fn check(&mut self, provider: &mut dyn DecisionProvider) -> Result<RunSummary> {
        let excludes = PatternMatcher::new(self.config.global_excludes.clone());
        let resolver = PairResolver::new(&self.store.registry, self.marker.as_ref(), excludes);
        let reconciler = Reconciler::new(&self.config, self.marker.as_ref(), &self.store.registry);

        let summary = reconciler.run(resolver.candidates(), provider, &mut self.store.remind)?;

        info!(
            in_sync = summary.in_sync,
            resolved = summary.resolved(),
            skipped = summary.skipped(),
            errored = summary.errored(),
            "check finished"
        );
        Ok(summary)
    }

    /// Paths overwritten by the last check
    pub fn remind(&self) -> &[PathBuf] {
        self.store.remind.entries()
    }

    /// Write the store back to disk
    pub fn persist(&self) -> Result<()> {
        self.store.save(&self.store_path)
    }
}
