//! Trait definitions for the row store.

use async_trait::async_trait;

use super::error::StoreError;
use super::types::{LockOutcome, Row, RowPosition, RowStatus};

/// Tabular store holding the URL queue.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Reads every data row in sheet order.
    ///
    /// Nothing is cached: writes made through [`set_status`](Self::set_status)
    /// are visible to the next call.
    async fn fetch_all(&self) -> Result<Vec<Row>, StoreError>;

    /// Writes one status cell.
    async fn set_status(&self, position: RowPosition, status: &RowStatus)
        -> Result<(), StoreError>;

    /// Whether [`try_lock`](Self::try_lock) is a real compare-and-swap.
    fn supports_conditional_update(&self) -> bool {
        false
    }

    /// Moves a row from `Empty` to `Processing`.
    ///
    /// The default writes unconditionally and always reports `Acquired`.
    async fn try_lock(&self, position: RowPosition) -> Result<LockOutcome, StoreError> {
        self.set_status(position, &RowStatus::Processing).await?;
        Ok(LockOutcome::Acquired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingStore {
        writes: Mutex<Vec<(RowPosition, RowStatus)>>,
    }

    #[async_trait]
    impl RowStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn fetch_all(&self) -> Result<Vec<Row>, StoreError> {
            Ok(vec![])
        }

        async fn set_status(
            &self,
            position: RowPosition,
            status: &RowStatus,
        ) -> Result<(), StoreError> {
            self.writes.lock().unwrap().push((position, status.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_try_lock_writes_processing() {
        let store = RecordingStore {
            writes: Mutex::new(vec![]),
        };

        assert!(!store.supports_conditional_update());
        let outcome = store.try_lock(RowPosition(4)).await.unwrap();
        assert_eq!(outcome, LockOutcome::Acquired);
        assert_eq!(
            *store.writes.lock().unwrap(),
            vec![(RowPosition(4), RowStatus::Processing)]
        );
    }
}
