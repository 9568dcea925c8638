// Reconcile Engine
// Compares each candidate pair, asks for a decision, and applies it

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::diff::{DiffEngine, FileSnapshot, Freshness, Side};
use super::marker::MarkerConvention;
use super::resolver::{CandidatePair, PairOrigin};
use super::sync::SyncEngine;
use crate::core::{AppConfig, Registry, RemindLedger};
use crate::errors::{SyncerError, SyncerResult};
use crate::utilities::short_names;

/// What the operator chose to do with a differing pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Overwrite the other side with the bytes of `from`
    Copy { from: Side },
    /// Write the diff beside the pair and leave both files alone
    SaveDiff,
    /// Leave the pair divergent for the next run
    Skip,
}

impl Decision {
    /// Copy newer over older; `None` when the timestamps tie
    pub fn copy_newer(freshness: Freshness) -> Option<Self> {
        freshness.newer().map(|from| Decision::Copy { from })
    }

    /// Copy older over newer; `None` when the timestamps tie
    pub fn copy_older(freshness: Freshness) -> Option<Self> {
        freshness.older().map(|from| Decision::Copy { from })
    }
}

/// Everything the operator needs to decide about one differing pair
#[derive(Debug)]
pub struct PairReview<'p> {
    pub pair: &'p CandidatePair,
    pub freshness: Freshness,
    /// Minimal display names for the left and right files
    pub left_name: String,
    pub right_name: String,
    /// Unified diff from older to newer (left to right on ties)
    pub diff: String,
}

impl PairReview<'_> {
    /// The (older, newer) paths, or `None` on equal timestamps
    pub fn older_newer(&self) -> Option<(&Path, &Path)> {
        let newer = self.freshness.newer()?;
        Some((self.pair.path(newer.other()), self.pair.path(newer)))
    }

    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_name,
            Side::Right => &self.right_name,
        }
    }

    /// Caveat to show alongside the diff, if the pair has one
    pub fn note(&self) -> Option<String> {
        match &self.pair.origin {
            PairOrigin::Repos {
                foreign_marker: Some(foreign),
                ..
            } => Some(format!(
                "marker names '{}', which is neither repo of this pair",
                foreign
            )),
            _ => None,
        }
    }
}

/// Source of per-pair decisions
///
/// The terminal prompt implements this for interactive runs; tests script it.
/// Returning `Interrupted` or `Terminal` aborts the whole run.
pub trait DecisionProvider {
    /// Shown once, before the first decision, with every differing pair
    ///
    /// Purely informational; it must not wait for input.
    fn overview(&mut self, _entries: &[OverviewEntry]) -> SyncerResult<()> {
        Ok(())
    }

    fn decide(&mut self, review: &PairReview<'_>) -> SyncerResult<Decision>;
}

/// One line of the pre-prompt overview of differing pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewEntry {
    /// 1-based position among the differing pairs
    pub index: usize,
    /// Basename of the left file
    pub base: String,
    pub left: PathBuf,
    pub left_name: String,
    pub right_name: String,
    pub freshness: Freshness,
}

/// Result of reconciling one candidate pair
#[derive(Debug)]
pub enum Resolution {
    /// Contents match; nothing to report
    InSync,
    /// One side was overwritten
    Copied { from: PathBuf, to: PathBuf },
    /// The diff was written to a new file
    DiffSaved(PathBuf),
    /// The operator left the pair divergent
    Skipped,
    /// The pair could not be handled
    Failed(SyncerError),
}

/// One reported line of a check run
#[derive(Debug)]
pub struct PairReport {
    /// `None` for failures not tied to one pair, such as an unreachable repo
    pub pair: Option<CandidatePair>,
    pub resolution: Resolution,
}

impl fmt::Display for PairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match &self.pair {
            Some(pair) => format!("{} <> {}", pair.left.display(), pair.right.display()),
            None => "-".to_string(),
        };
        match &self.resolution {
            Resolution::InSync => write!(f, "in sync    {}", label),
            Resolution::Copied { from, to } => {
                write!(f, "resolved   {} -> {}", from.display(), to.display())
            }
            Resolution::DiffSaved(path) => {
                write!(f, "resolved   {} (diff saved to {})", label, path.display())
            }
            Resolution::Skipped => write!(f, "skipped    {}", label),
            Resolution::Failed(e) => write!(f, "errored    {}: {}", label, e),
        }
    }
}

/// Outcome of a whole check run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Pairs compared and found in sync
    pub in_sync: usize,
    /// Every differing or failing pair, in candidate order
    pub reports: Vec<PairReport>,
}

impl RunSummary {
    pub fn resolved(&self) -> usize {
        self.count(|r| matches!(r, Resolution::Copied { .. } | Resolution::DiffSaved(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, Resolution::Skipped))
    }

    pub fn errored(&self) -> usize {
        self.count(|r| matches!(r, Resolution::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Resolution) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.resolution)).count()
    }
}

/// Drives reconciliation of candidate pairs
pub struct Reconciler<'a> {
    diff: DiffEngine,
    sync: SyncEngine<'a>,
    marker: &'a dyn MarkerConvention,
    registry: &'a Registry,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        config: &AppConfig,
        marker: &'a dyn MarkerConvention,
        registry: &'a Registry,
    ) -> Self {
        Self {
            diff: DiffEngine::new(config.diff.context_lines),
            sync: SyncEngine::new(marker, config.diff.save_suffix.clone()),
            marker,
            registry,
        }
    }

    /// Whether line 3 is left out of the comparison for this pair
    ///
    /// File pairs always keep their own line 3. Repo pairs only skip it when
    /// both sides declare a tracked repo there.
    fn ignores_marker(&self, pair: &CandidatePair, left: &[u8], right: &[u8]) -> bool {
        if !pair.is_repo_pair() {
            return true;
        }
        let recognized = |content: &[u8]| {
            self.marker
                .declared(content)
                .is_some_and(|name| self.registry.is_tracked_repo(&name))
        };
        recognized(left) && recognized(right)
    }

    /// Snapshot both sides; `None` when they count as in sync
    fn differing(
        &self,
        pair: &CandidatePair,
    ) -> SyncerResult<Option<(FileSnapshot, FileSnapshot, Freshness)>> {
        let left = FileSnapshot::read(&pair.left)?;
        let right = FileSnapshot::read(&pair.right)?;

        let marker = self
            .ignores_marker(pair, &left.content, &right.content)
            .then_some(self.marker);
        if self.diff.contents_match(&left.content, &right.content, marker) {
            debug!(left = %pair.left.display(), right = %pair.right.display(), "in sync");
            return Ok(None);
        }

        let freshness = Freshness::from_times(left.modified, right.modified);
        Ok(Some((left, right, freshness)))
    }

    /// Compare-only pass listing the pairs that differ right now
    ///
    /// Pairs that cannot be read are left out here and reported when
    /// `reconcile` reaches them.
    pub fn survey<'p>(
        &self,
        pairs: impl IntoIterator<Item = &'p CandidatePair>,
    ) -> Vec<OverviewEntry> {
        let mut entries = Vec::new();
        for pair in pairs {
            let freshness = match self.differing(pair) {
                Ok(Some((_, _, freshness))) => freshness,
                Ok(None) => continue,
                Err(e) => {
                    debug!(left = %pair.left.display(), "left out of overview: {}", e);
                    continue;
                }
            };
            let (left_name, right_name) = short_names(&pair.left, &pair.right);
            entries.push(OverviewEntry {
                index: entries.len() + 1,
                base: pair
                    .left
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                left: pair.left.clone(),
                left_name,
                right_name,
                freshness,
            });
        }
        entries
    }

    /// Reconcile one pair, recording overwritten paths in `ledger`
    ///
    /// Errors are per-pair except `Interrupted` and `Terminal`, which end
    /// the run.
    pub fn reconcile(
        &self,
        pair: &CandidatePair,
        provider: &mut dyn DecisionProvider,
        ledger: &mut RemindLedger,
    ) -> SyncerResult<Resolution> {
        let Some((left, right, freshness)) = self.differing(pair)? else {
            return Ok(Resolution::InSync);
        };
        let (left_name, right_name) = short_names(&pair.left, &pair.right);

        let diff = match freshness.newer() {
            Some(Side::Left) => {
                self.diff
                    .unified_diff(&right_name, &right.content, &left_name, &left.content)
            }
            _ => self
                .diff
                .unified_diff(&left_name, &left.content, &right_name, &right.content),
        };

        let review = PairReview {
            pair,
            freshness,
            left_name,
            right_name,
            diff,
        };

        match provider.decide(&review)? {
            Decision::Copy { from } => {
                let (source, dest) = match from {
                    Side::Left => (&left, &right),
                    Side::Right => (&right, &left),
                };
                let written = self.sync.copy_over(pair, source, dest, from.other())?;
                ledger.record(&written);
                Ok(Resolution::Copied {
                    from: source.path.clone(),
                    to: written,
                })
            }
            Decision::SaveDiff => {
                let beside = pair.path(freshness.older().unwrap_or(Side::Left));
                let saved = self.sync.save_diff(beside, &review.diff)?;
                Ok(Resolution::DiffSaved(saved))
            }
            Decision::Skip => Ok(Resolution::Skipped),
        }
    }

    /// Run over every candidate
    ///
    /// The ledger is cleared first and then holds exactly the paths this run
    /// overwrote. The provider sees the overview of differing pairs before
    /// the first decision. Only the decision provider can stop the run early.
    pub fn run<I>(
        &self,
        candidates: I,
        provider: &mut dyn DecisionProvider,
        ledger: &mut RemindLedger,
    ) -> SyncerResult<RunSummary>
    where
        I: IntoIterator<Item = SyncerResult<CandidatePair>>,
    {
        ledger.begin_run();
        let mut summary = RunSummary::default();

        let candidates: Vec<SyncerResult<CandidatePair>> = candidates.into_iter().collect();
        let overview = self.survey(candidates.iter().filter_map(|c| c.as_ref().ok()));
        if !overview.is_empty() {
            provider.overview(&overview)?;
        }

        for candidate in candidates {
            let pair = match candidate {
                Ok(pair) => pair,
                Err(e) => {
                    summary.reports.push(PairReport {
                        pair: None,
                        resolution: Resolution::Failed(e),
                    });
                    continue;
                }
            };

            let resolution = match self.reconcile(&pair, provider, ledger) {
                Ok(Resolution::InSync) => {
                    summary.in_sync += 1;
                    continue;
                }
                Ok(resolution) => resolution,
                Err(e @ (SyncerError::Interrupted | SyncerError::Terminal(_))) => {
                    info!("run stopped: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(left = %pair.left.display(), right = %pair.right.display(), "{}", e);
                    Resolution::Failed(e)
                }
            };

            summary.reports.push(PairReport {
                pair: Some(pair),
                resolution,
            });
        }

        Ok(summary)
    }
}
