//! Error types for the row store.

use thiserror::Error;

use super::types::RowPosition;

/// Errors that can occur while talking to the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store unreachable, rejected the request, or returned something unusable.
    #[error("Row store unavailable: {0}")]
    Unavailable(String),

    /// The header row lacks a required column.
    #[error("Row store is missing column {column:?}")]
    MissingColumn { column: String },

    /// Request timed out.
    #[error("Row store request timed out")]
    Timeout,

    /// A write addressed a row the store does not have.
    #[error("Row {0} does not exist")]
    RowNotFound(RowPosition),
}

impl StoreError {
    /// Whether this error means the store could not be used at all.
    ///
    /// Every variant is fatal for a run; the distinction only matters for
    /// logging.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}
