//! Row store adapter for the URL queue.
//!
//! This module provides the `RowStore` trait over the tabular backing store
//! (a spreadsheet with a URL column and a status column) and the Google
//! Sheets implementation.
//!
//! The status column doubles as an advisory lock: a row whose status is not
//! empty is never selected again. Stores that can do a conditional write
//! override [`RowStore::try_lock`] so the `Empty -> Processing` transition is
//! atomic; the others fall back to a plain write and rely on runs not
//! overlapping.

mod error;
mod sheets;
mod traits;
mod types;

pub use error::StoreError;
pub use sheets::GoogleSheetsStore;
pub use traits::RowStore;
pub use types::{LockOutcome, Row, RowPosition, RowStatus};
