// Core infrastructure module
// Configuration, persisted state and the application object commands run against

pub mod app;
pub mod app_config;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod store;

pub use app::App;
pub use app_config::AppConfig;
pub use events::{EventHandler, PromptEvent};
pub use ledger::RemindLedger;
pub use registry::{Registry, TrackedFilePair, TrackedRepo};
pub use store::Store;
