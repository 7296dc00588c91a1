//! In-memory row store for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::row_store::{LockOutcome, Row, RowPosition, RowStatus, RowStore, StoreError};

/// A recorded status write for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub position: RowPosition,
    pub status: RowStatus,
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<Row>,
    writes: Vec<RecordedWrite>,
    fetches: usize,
    fail_fetch: bool,
    /// Fail the write with this 0-based index (counted over all writes).
    fail_write_at: Option<usize>,
    /// Rows another writer grabs right before this store's next lock attempt.
    steal_on_lock: Vec<RowPosition>,
}

/// Mock implementation of the RowStore trait.
///
/// Provides controllable behavior for testing:
/// - Seed rows and inspect their statuses after a run
/// - Record every status write in order
/// - Fail the fetch, or the n-th write
/// - Simulate a concurrent writer locking rows first
///
/// Locking is a real compare-and-swap, so `supports_conditional_update` is
/// true.
///
/// # Example
///
/// ```rust,ignore
/// use linkdigest_core::testing::{fixtures, InMemoryRowStore};
///
/// let store = InMemoryRowStore::with_rows(fixtures::empty_rows(3));
/// // ... run the orchestrator ...
/// assert_eq!(store.status_of(RowPosition(2)).await, Some(RowStatus::Completed));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRowStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryRowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                rows,
                ..Default::default()
            })),
        }
    }

    /// Append a row with an empty status at the next position.
    pub async fn push_url(&self, url: &str) -> RowPosition {
        let mut inner = self.inner.write().await;
        let position = RowPosition::from_data_index(inner.rows.len());
        inner.rows.push(Row::new(position, url, RowStatus::Empty));
        position
    }

    /// Current rows.
    pub async fn rows(&self) -> Vec<Row> {
        self.inner.read().await.rows.clone()
    }

    /// Current status of a row.
    pub async fn status_of(&self, position: RowPosition) -> Option<RowStatus> {
        self.inner
            .read()
            .await
            .rows
            .iter()
            .find(|r| r.position == position)
            .map(|r| r.status.clone())
    }

    /// Number of rows currently holding `status`.
    pub async fn count_with(&self, status: &RowStatus) -> usize {
        self.inner
            .read()
            .await
            .rows
            .iter()
            .filter(|r| &r.status == status)
            .count()
    }

    /// All status writes performed so far.
    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.inner.read().await.writes.clone()
    }

    /// Clear recorded writes.
    pub async fn clear_writes(&self) {
        self.inner.write().await.writes.clear();
    }

    /// Number of `fetch_all` calls.
    pub async fn fetch_count(&self) -> usize {
        self.inner.read().await.fetches
    }

    /// Make `fetch_all` fail until cleared.
    pub async fn set_fail_fetch(&self, fail: bool) {
        self.inner.write().await.fail_fetch = fail;
    }

    /// Make the write with this 0-based index fail (earlier writes succeed).
    pub async fn fail_write_at(&self, index: usize) {
        self.inner.write().await.fail_write_at = Some(index);
    }

    /// Have another writer set these rows to Processing just before the next
    /// lock attempt.
    pub async fn steal_on_lock(&self, positions: Vec<RowPosition>) {
        self.inner.write().await.steal_on_lock = positions;
    }

    fn write(
        inner: &mut Inner,
        position: RowPosition,
        status: &RowStatus,
    ) -> Result<(), StoreError> {
        if inner.fail_write_at == Some(inner.writes.len()) {
            inner.fail_write_at = None;
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }

        let row = inner
            .rows
            .iter_mut()
            .find(|r| r.position == position)
            .ok_or(StoreError::RowNotFound(position))?;
        row.status = status.clone();
        inner.writes.push(RecordedWrite {
            position,
            status: status.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_all(&self) -> Result<Vec<Row>, StoreError> {
        let mut inner = self.inner.write().await;
        inner.fetches += 1;
        if inner.fail_fetch {
            return Err(StoreError::Unavailable("injected fetch failure".to_string()));
        }
        Ok(inner.rows.clone())
    }

    async fn set_status(
        &self,
        position: RowPosition,
        status: &RowStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        Self::write(&mut inner, position, status)
    }

    fn supports_conditional_update(&self) -> bool {
        true
    }

    async fn try_lock(&self, position: RowPosition) -> Result<LockOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        let stolen = std::mem::take(&mut inner.steal_on_lock);
        for pos in stolen {
            if let Some(row) = inner.rows.iter_mut().find(|r| r.position == pos) {
                row.status = RowStatus::Processing;
            }
        }

        let current = inner
            .rows
            .iter()
            .find(|r| r.position == position)
            .map(|r| r.status.clone())
            .ok_or(StoreError::RowNotFound(position))?;

        if !current.is_empty() {
            return Ok(LockOutcome::Contended);
        }
        Self::write(&mut inner, position, &RowStatus::Processing)?;
        Ok(LockOutcome::Acquired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_lock_is_compare_and_swap() {
        let store = InMemoryRowStore::new();
        let pos = store.push_url("http://a").await;

        assert_eq!(store.try_lock(pos).await.unwrap(), LockOutcome::Acquired);
        assert_eq!(store.try_lock(pos).await.unwrap(), LockOutcome::Contended);
        assert_eq!(store.status_of(pos).await, Some(RowStatus::Processing));
        assert_eq!(store.writes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let store = InMemoryRowStore::new();
        let a = store.push_url("http://a").await;
        let b = store.push_url("http://b").await;
        store.fail_write_at(1).await;

        store.set_status(a, &RowStatus::Completed).await.unwrap();
        assert!(store.set_status(b, &RowStatus::Completed).await.is_err());
        assert_eq!(store.status_of(b).await, Some(RowStatus::Empty));
        // Only fails once
        store.set_status(b, &RowStatus::Completed).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_row() {
        let store = InMemoryRowStore::new();
        let err = store
            .set_status(RowPosition(40), &RowStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RowNotFound(RowPosition(40))));
    }
}
