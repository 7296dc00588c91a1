//! Types for the batch orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::notifier::BroadcastReport;
use crate::publisher::PublishedArtifact;
use crate::row_store::StoreError;

/// States a run moves through.
///
/// `Idle -> Selecting -> Locked -> Publishing -> Notifying -> Resolved`, or
/// `Aborted` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Selecting,
    Locked,
    Publishing,
    Notifying,
    Resolved,
    Aborted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Resolved | RunState::Aborted)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Resolved | Aborted, _) => false,
            (_, Aborted) => true,
            (Idle, Selecting)
            | (Selecting, Locked)
            | (Locked, Publishing)
            | (Publishing, Notifying)
            | (Notifying, Resolved) => true,
            // A selection with nothing to do ends the run directly
            (Selecting, Resolved) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Selecting => "selecting",
            RunState::Locked => "locked",
            RunState::Publishing => "publishing",
            RunState::Notifying => "notifying",
            RunState::Resolved => "resolved",
            RunState::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run ended in `Aborted` after its rows were marked failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortReason {
    /// Publisher that failed.
    pub backend: String,
    /// Label written into the rows' status.
    pub label: String,
    pub detail: String,
}

/// What happened during a run that got past selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Last state reached (`Resolved` or `Aborted`).
    pub state: RunState,
    /// Rows in the batch cut.
    pub selected: usize,
    /// Rows this run moved to Processing.
    pub locked: usize,
    /// Rows skipped because someone else locked them first.
    pub contended: usize,
    /// Empty rows left for a later run.
    pub deferred: usize,
    pub completed: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<PublishedArtifact>,
    /// Set when the feed failed and the policy said to carry on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_error: Option<String>,
    pub broadcast: BroadcastReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub(crate) fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            state: RunState::Idle,
            selected: 0,
            locked: 0,
            contended: 0,
            deferred: 0,
            completed: 0,
            failed: 0,
            title: None,
            published: None,
            feed: None,
            feed_error: None,
            broadcast: BroadcastReport::default(),
            abort: None,
            started_at,
            finished_at: started_at,
        }
    }

    /// Public URLs produced by the run (artifact first, then feed).
    pub fn public_urls(&self) -> Vec<String> {
        self.published
            .iter()
            .chain(self.feed.iter())
            .map(|p| p.public_url.clone())
            .collect()
    }
}

/// Result of one orchestrator run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No empty rows (or all of them were taken by another writer).
    NoWork,
    /// Published and every batch row marked Completed.
    Completed(RunSummary),
    /// Publishing failed and every locked row was marked with an error status.
    Aborted(RunSummary),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Aborted(_))
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::NoWork => None,
            RunOutcome::Completed(s) | RunOutcome::Aborted(s) => Some(s),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::NoWork => "no_work",
            RunOutcome::Completed(_) => "completed",
            RunOutcome::Aborted(_) => "aborted",
        }
    }
}

/// Store failures that stop a run.
///
/// Each variant says which rows may have been left behind.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Reading the queue failed; no row was touched.
    #[error("failed to read rows: {0}")]
    Selection(#[source] StoreError),

    /// A lock write failed; rows locked before it stay Processing.
    #[error("failed to lock row {row} after locking {locked} rows: {source}")]
    Lock {
        row: u32,
        locked: usize,
        #[source]
        source: StoreError,
    },

    /// Writing a final status failed; the remaining rows stay Processing.
    #[error("failed to resolve row {row} ({resolved} of {total} rows resolved): {source}")]
    Resolve {
        row: u32,
        resolved: usize,
        total: usize,
        #[source]
        source: StoreError,
    },
}

impl OrchestratorError {
    /// Rows this run left in Processing.
    pub fn orphaned_rows(&self) -> usize {
        match self {
            OrchestratorError::Selection(_) => 0,
            OrchestratorError::Lock { locked, .. } => *locked,
            OrchestratorError::Resolve {
                resolved, total, ..
            } => total - resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use RunState::*;
        let path = [Idle, Selecting, Locked, Publishing, Notifying, Resolved];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_abort_from_non_terminal_only() {
        use RunState::*;
        for state in [Idle, Selecting, Locked, Publishing, Notifying] {
            assert!(state.can_transition_to(Aborted));
        }
        assert!(!Resolved.can_transition_to(Aborted));
        assert!(!Aborted.can_transition_to(Selecting));
    }

    #[test]
    fn test_no_skipping_publish() {
        assert!(!RunState::Locked.can_transition_to(RunState::Notifying));
        assert!(!RunState::Publishing.can_transition_to(RunState::Resolved));
    }

    #[test]
    fn test_orphaned_rows() {
        let err = OrchestratorError::Lock {
            row: 5,
            locked: 3,
            source: StoreError::Timeout,
        };
        assert_eq!(err.orphaned_rows(), 3);

        let err = OrchestratorError::Resolve {
            row: 9,
            resolved: 2,
            total: 7,
            source: StoreError::Unavailable("503".to_string()),
        };
        assert_eq!(err.orphaned_rows(), 5);
        assert_eq!(
            err.to_string(),
            "failed to resolve row 9 (2 of 7 rows resolved): Row store unavailable: 503"
        );

        assert_eq!(
            OrchestratorError::Selection(StoreError::Timeout).orphaned_rows(),
            0
        );
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(RunOutcome::NoWork.is_success());
        assert!(RunOutcome::NoWork.summary().is_none());
        let summary = RunSummary::new(Utc::now());
        assert!(!RunOutcome::Aborted(summary.clone()).is_success());
        assert_eq!(RunOutcome::Completed(summary).label(), "completed");
    }
}
