//! Lite-mode runtime: ties extraction, title versioning and summary
//! rendering into a single carry-over step, and manages the pending
//! handoff and user settings in the persisted store.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{describe, Orchestrator};
pub use types::*;
