// Syncer Library
// Tracks copies of shared files across repos and reconciles them when they drift

// Core infrastructure - config, registry, store and application state
pub mod core;

// Error types shared by every layer
pub mod errors;

// Operations - resolution, diffing and reconciliation
pub mod operations;

// UI - terminal output and the decision prompt
pub mod ui;

// Utilities - path and pattern helpers
pub mod utilities;

// Re-export commonly used items for convenience
pub use core::{App, AppConfig, RemindLedger, Registry, Store};
pub use errors::{SyncerError, SyncerResult};
pub use operations::{Decision, DecisionProvider, PairResolver, Reconciler, RunSummary};
