//! Batch orchestrator: the state machine that moves rows from empty to a
//! final status.
//!
//! - **Selecting**: read every row, keep the empty ones in sheet order
//! - **Locked**: mark the first `batch_size` of them `Processing`
//! - **Publishing**: build and publish one artifact (plus the optional feed)
//! - **Notifying**: ping crawlers, best effort
//! - **Resolved**: mark every batch row `Completed`
//!
//! A publish failure marks the batch `Error - <label>` and ends in `Aborted`.
//! The lock is advisory; a process killed between locking and resolving
//! leaves rows in `Processing` until someone resets them by hand.

mod batch;
mod config;
mod runner;
mod types;

pub use batch::Batch;
pub use config::OrchestratorConfig;
pub use runner::{BatchOrchestrator, Clock};
pub use types::{AbortReason, OrchestratorError, RunOutcome, RunState, RunSummary};
