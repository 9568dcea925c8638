// Operations module
// Pair resolution, marker handling, diffing and reconciliation

pub mod diff;
pub mod marker;
pub mod reconcile;
pub mod resolver;
pub mod sync;

pub use diff::{DiffEngine, FileSnapshot, Freshness, Side};
pub use marker::{read_marker, write_marker, MarkerConvention, ThirdLineMarker};
pub use reconcile::{
    Decision, DecisionProvider, OverviewEntry, PairReport, PairReview, Reconciler, Resolution,
    RunSummary,
};
pub use resolver::{CandidatePair, Candidates, PairOrigin, PairResolver};
pub use sync::{write_atomic, SyncEngine};
