//! Types for the row store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based row number in the sheet. Row 1 is the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowPosition(pub u32);

impl RowPosition {
    /// Position of the first data row (just below the header).
    pub const FIRST_DATA_ROW: RowPosition = RowPosition(2);

    /// Position of the `index`-th data row (0-based).
    pub fn from_data_index(index: usize) -> Self {
        RowPosition(Self::FIRST_DATA_ROW.0 + index as u32)
    }
}

impl fmt::Display for RowPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const PROCESSING: &str = "Processing";
const COMPLETED: &str = "Completed";
const ERROR_PREFIX: &str = "Error - ";

/// Value of a row's status cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    /// Blank cell: the row is waiting to be processed.
    Empty,
    /// Locked by a run that has not resolved it yet.
    Processing,
    /// Published successfully.
    Completed,
    /// Publishing failed; the payload names the failing backend.
    Error(String),
    /// Anything else someone typed into the cell.
    Other(String),
}

impl RowStatus {
    /// Parse a raw cell value. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            return RowStatus::Empty;
        }
        if value == PROCESSING {
            return RowStatus::Processing;
        }
        if value == COMPLETED {
            return RowStatus::Completed;
        }
        if let Some(reason) = value.strip_prefix(ERROR_PREFIX) {
            return RowStatus::Error(reason.trim().to_string());
        }
        RowStatus::Other(value.to_string())
    }

    /// Build an error status for a failing backend.
    pub fn error(reason: impl Into<String>) -> Self {
        RowStatus::Error(reason.into())
    }

    /// The text written into the cell.
    pub fn as_cell(&self) -> String {
        match self {
            RowStatus::Empty => String::new(),
            RowStatus::Processing => PROCESSING.to_string(),
            RowStatus::Completed => COMPLETED.to_string(),
            RowStatus::Error(reason) => format!("{ERROR_PREFIX}{reason}"),
            RowStatus::Other(value) => value.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RowStatus::Empty)
    }

    /// Whether the row has reached a final status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RowStatus::Completed | RowStatus::Error(_))
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Empty => write!(f, "<empty>"),
            other => write!(f, "{}", other.as_cell()),
        }
    }
}

/// One submitted URL and its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub url: String,
    pub status: RowStatus,
    pub position: RowPosition,
}

impl Row {
    pub fn new(position: RowPosition, url: impl Into<String>, status: RowStatus) -> Self {
        Self {
            url: url.into(),
            status,
            position,
        }
    }
}

/// Result of trying to take the advisory lock on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The row is now `Processing` and belongs to this run.
    Acquired,
    /// The row was no longer empty; another writer got there first.
    Contended,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_is_empty() {
        assert_eq!(RowStatus::parse(""), RowStatus::Empty);
        assert_eq!(RowStatus::parse("   "), RowStatus::Empty);
        assert!(RowStatus::parse("\t").is_empty());
    }

    #[test]
    fn test_parse_known_values() {
        assert_eq!(RowStatus::parse("Processing"), RowStatus::Processing);
        assert_eq!(RowStatus::parse(" Completed "), RowStatus::Completed);
        assert_eq!(
            RowStatus::parse("Error - GitHub Push"),
            RowStatus::Error("GitHub Push".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_value_is_not_empty() {
        let status = RowStatus::parse("skip this one");
        assert_eq!(status, RowStatus::Other("skip this one".to_string()));
        assert!(!status.is_empty());
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(RowStatus::Processing.as_cell(), "Processing");
        assert_eq!(RowStatus::error("Gist").as_cell(), "Error - Gist");
        assert_eq!(RowStatus::Empty.as_cell(), "");
        assert_eq!(
            RowStatus::parse(&RowStatus::error("XML-RPC").as_cell()),
            RowStatus::error("XML-RPC")
        );
    }

    #[test]
    fn test_position_from_data_index() {
        assert_eq!(RowPosition::from_data_index(0), RowPosition(2));
        assert_eq!(RowPosition::from_data_index(9), RowPosition(11));
        assert_eq!(RowPosition(7).to_string(), "7");
    }
}
