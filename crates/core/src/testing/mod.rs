//! Testing utilities and mock implementations.
//!
//! This module provides in-memory stand-ins for every backend trait, so the
//! orchestrator can be exercised end to end without a spreadsheet, a blog or
//! a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use linkdigest_core::testing::{fixtures, InMemoryRowStore, MockNotifier, MockPublisher};
//!
//! let store = InMemoryRowStore::with_rows(fixtures::empty_rows(5));
//! let publisher = MockPublisher::new();
//! let notifier = MockNotifier::new();
//!
//! // Configure failures
//! publisher.set_next_error("HTTP 500").await;
//! store.fail_write_at(3).await;
//! ```

mod memory_row_store;
mod mock_notifier;
mod mock_publisher;

pub use memory_row_store::{InMemoryRowStore, RecordedWrite};
pub use mock_notifier::{MockNotifier, RecordedBroadcast};
pub use mock_publisher::MockPublisher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::row_store::{Row, RowPosition, RowStatus};

    /// Rows at consecutive positions with the given URLs and statuses.
    pub fn rows(entries: &[(&str, RowStatus)]) -> Vec<Row> {
        entries
            .iter()
            .enumerate()
            .map(|(i, (url, status))| {
                Row::new(RowPosition::from_data_index(i), *url, status.clone())
            })
            .collect()
    }

    /// Empty-status rows for the given URLs.
    pub fn rows_with_urls(urls: &[&str]) -> Vec<Row> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| Row::new(RowPosition::from_data_index(i), *url, RowStatus::Empty))
            .collect()
    }

    /// `count` empty-status rows with URLs `https://example.com/<n>`.
    pub fn empty_rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| {
                Row::new(
                    RowPosition::from_data_index(i),
                    format!("https://example.com/{i}"),
                    RowStatus::Empty,
                )
            })
            .collect()
    }

    /// A fixed run time: 2024-05-01 12:30:45 UTC.
    pub fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45)
            .single()
            .unwrap_or_default()
    }
}
