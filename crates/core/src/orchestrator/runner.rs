//! Batch orchestrator implementation.
//!
//! One call to [`BatchOrchestrator::run_once`] takes the next batch of empty
//! rows, locks it, publishes one artifact, pings crawlers and resolves every
//! row. Status writes always follow batch order, so an interrupted run leaves
//! a prefix of the batch in its newer status.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::FeedFailurePolicy;
use crate::metrics;
use crate::notifier::Notifier;
use crate::publisher::{Artifact, PublishError, Publisher};
use crate::row_store::{LockOutcome, Row, RowStatus, RowStore};

use super::batch::Batch;
use super::config::OrchestratorConfig;
use super::types::{AbortReason, OrchestratorError, RunOutcome, RunState, RunSummary};

/// Source of the run's wall-clock time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Drives one batch through select, lock, publish, notify and resolve.
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    store: Arc<dyn RowStore>,
    publisher: Arc<dyn Publisher>,
    feed_publisher: Option<Arc<dyn Publisher>>,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
}

impl BatchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<dyn RowStore>,
        publisher: Arc<dyn Publisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            publisher,
            feed_publisher: None,
            notifier,
            clock: Arc::new(Utc::now),
        }
    }

    /// Also publish a secondary feed artifact after the primary one.
    pub fn with_feed_publisher(mut self, feed_publisher: Arc<dyn Publisher>) -> Self {
        self.feed_publisher = Some(feed_publisher);
        self
    }

    /// Replace the wall clock used for artifact titles.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Reads the queue and returns the batch the next run would take,
    /// without writing anything.
    pub async fn preview(&self) -> Result<Batch, OrchestratorError> {
        let rows = self
            .store
            .fetch_all()
            .await
            .map_err(OrchestratorError::Selection)?;
        Ok(Batch::select(rows, self.config.batch_size))
    }

    /// Runs one batch to completion.
    ///
    /// Publish failures are not errors: the affected rows are marked and the
    /// run returns [`RunOutcome::Aborted`]. Errors are reserved for store
    /// failures, which leave rows as described on [`OrchestratorError`].
    pub async fn run_once(&self) -> Result<RunOutcome, OrchestratorError> {
        let timer = Instant::now();
        let result = self.drive().await;

        let outcome = match &result {
            Ok(outcome) => outcome.label(),
            Err(_) => "error",
        };
        metrics::RUNS_TOTAL.with_label_values(&[outcome]).inc();
        metrics::RUN_DURATION
            .with_label_values(&[outcome])
            .observe(timer.elapsed().as_secs_f64());

        if let Err(e) = &result {
            error!(
                error = %e,
                orphaned_rows = e.orphaned_rows(),
                "Run failed on the row store"
            );
        }
        result
    }

    async fn drive(&self) -> Result<RunOutcome, OrchestratorError> {
        let mut state = RunState::Idle;
        let mut summary = RunSummary::new((self.clock)());

        // Selecting
        self.transition(&mut state, RunState::Selecting);
        let batch = match self.preview().await {
            Ok(batch) => batch,
            Err(e) => {
                self.transition(&mut state, RunState::Aborted);
                return Err(e);
            }
        };

        if batch.is_empty() {
            info!("No new URLs to process");
            self.transition(&mut state, RunState::Resolved);
            return Ok(RunOutcome::NoWork);
        }

        info!(
            pending = batch.pending_total(),
            batch = batch.len(),
            deferred = batch.deferred(),
            "Selected batch"
        );
        summary.selected = batch.len();
        summary.deferred = batch.deferred();

        // Locking
        let locked = match self.lock(batch, &mut summary).await {
            Ok(locked) => locked,
            Err(e) => {
                self.transition(&mut state, RunState::Aborted);
                return Err(e);
            }
        };

        if locked.is_empty() {
            info!(
                contended = summary.contended,
                "Every selected row was taken by another writer"
            );
            self.transition(&mut state, RunState::Resolved);
            return Ok(RunOutcome::NoWork);
        }
        self.transition(&mut state, RunState::Locked);

        // Publishing
        self.transition(&mut state, RunState::Publishing);
        let urls: Vec<String> = locked.iter().map(|r| r.url.clone()).collect();
        let artifact = Artifact::new(urls, summary.started_at);
        summary.title = Some(artifact.title.clone());

        let published = match self.publisher.publish(&artifact).await {
            Ok(published) => {
                record_publish(self.publisher.name(), true);
                info!(url = %published.public_url, backend = %published.backend, "Artifact published");
                published
            }
            Err(e) => {
                record_publish(self.publisher.name(), false);
                return self
                    .abort(&mut state, summary, &locked, self.publisher.as_ref(), e)
                    .await;
            }
        };

        if let Some(feed_publisher) = &self.feed_publisher {
            let feed_artifact = artifact.clone().with_permalink(&published.public_url);
            match feed_publisher.publish(&feed_artifact).await {
                Ok(feed) => {
                    record_publish(feed_publisher.name(), true);
                    info!(url = %feed.public_url, "Feed published");
                    summary.feed = Some(feed);
                }
                Err(e) => {
                    record_publish(feed_publisher.name(), false);
                    match self.config.feed_failure_policy {
                        FeedFailurePolicy::Abort => {
                            summary.published = Some(published);
                            return self
                                .abort(&mut state, summary, &locked, feed_publisher.as_ref(), e)
                                .await;
                        }
                        FeedFailurePolicy::Skip => {
                            warn!(error = %e, "Feed publish failed, continuing without it");
                            summary.feed_error = Some(e.to_string());
                        }
                    }
                }
            }
        }
        summary.published = Some(published);

        // Notifying
        self.transition(&mut state, RunState::Notifying);
        let public_urls = summary.public_urls();
        let report = self.notifier.broadcast(&artifact.title, &public_urls).await;
        metrics::PINGS_TOTAL
            .with_label_values(&["delivered"])
            .inc_by(report.delivered() as u64);
        metrics::PINGS_TOTAL
            .with_label_values(&["failed"])
            .inc_by(report.failed() as u64);
        summary.broadcast = report;

        // Resolving
        if let Err(e) = self.resolve(&locked, &RowStatus::Completed).await {
            self.transition(&mut state, RunState::Aborted);
            return Err(e);
        }
        summary.completed = locked.len();
        metrics::ROWS_COMPLETED.inc_by(locked.len() as u64);

        self.transition(&mut state, RunState::Resolved);
        summary.state = state;
        summary.finished_at = (self.clock)();

        info!(completed = summary.completed, "Batch resolved");
        Ok(RunOutcome::Completed(summary))
    }

    /// Takes the lock on every batch row, in order.
    ///
    /// Contended rows are dropped from the batch. On a failed write the rows
    /// locked so far are left Processing.
    async fn lock(
        &self,
        batch: Batch,
        summary: &mut RunSummary,
    ) -> Result<Vec<Row>, OrchestratorError> {
        if !self.store.supports_conditional_update() {
            debug!(
                store = self.store.name(),
                "Store has no conditional update, relying on a single writer"
            );
        }

        let mut locked = Vec::with_capacity(batch.len());
        for row in batch.into_rows() {
            match self.store.try_lock(row.position).await {
                Ok(LockOutcome::Acquired) => {
                    metrics::ROWS_LOCKED.inc();
                    locked.push(row);
                }
                Ok(LockOutcome::Contended) => {
                    metrics::ROWS_CONTENDED.inc();
                    warn!(row = %row.position, url = %row.url, "Row already taken, skipping");
                    summary.contended += 1;
                }
                Err(source) => {
                    summary.locked = locked.len();
                    return Err(OrchestratorError::Lock {
                        row: row.position.0,
                        locked: locked.len(),
                        source,
                    });
                }
            }
        }

        summary.locked = locked.len();
        debug!(locked = locked.len(), "Batch locked");
        Ok(locked)
    }

    /// Writes the same status to every row, in order, stopping at the first
    /// failed write.
    async fn resolve(&self, rows: &[Row], status: &RowStatus) -> Result<(), OrchestratorError> {
        for (resolved, row) in rows.iter().enumerate() {
            if let Err(source) = self.store.set_status(row.position, status).await {
                return Err(OrchestratorError::Resolve {
                    row: row.position.0,
                    resolved,
                    total: rows.len(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Marks every locked row with the publisher's error label and ends the run.
    async fn abort(
        &self,
        state: &mut RunState,
        mut summary: RunSummary,
        locked: &[Row],
        publisher: &dyn Publisher,
        error: PublishError,
    ) -> Result<RunOutcome, OrchestratorError> {
        let label = publisher.failure_label().to_string();
        error!(
            backend = %error.backend,
            detail = %error.detail,
            rows = locked.len(),
            "Publish failed, marking batch as failed"
        );

        let result = self.resolve(locked, &RowStatus::error(&label)).await;
        self.transition(state, RunState::Aborted);
        result?;

        metrics::ROWS_FAILED
            .with_label_values(&[label.as_str()])
            .inc_by(locked.len() as u64);

        summary.failed = locked.len();
        summary.abort = Some(AbortReason {
            backend: error.backend,
            label,
            detail: error.detail,
        });
        summary.state = *state;
        summary.finished_at = (self.clock)();
        Ok(RunOutcome::Aborted(summary))
    }

    fn transition(&self, state: &mut RunState, next: RunState) {
        debug_assert!(
            state.can_transition_to(next),
            "illegal run transition {state} -> {next}"
        );
        debug!(from = %state, to = %next, "Run state transition");
        *state = next;
    }
}

fn record_publish(backend: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::PUBLISH_ATTEMPTS
        .with_label_values(&[backend, result])
        .inc();
}
