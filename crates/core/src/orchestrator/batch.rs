//! Batch selection.

use crate::row_store::Row;

/// The rows taken by one run, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    rows: Vec<Row>,
    /// Empty rows seen during selection, including those left for later.
    pending_total: usize,
}

impl Batch {
    /// Takes the first `max_size` rows whose status is empty.
    ///
    /// Rows with any other status are never selected, whatever their
    /// position.
    pub fn select(rows: Vec<Row>, max_size: usize) -> Self {
        let pending: Vec<Row> = rows.into_iter().filter(|r| r.status.is_empty()).collect();
        let pending_total = pending.len();
        let rows = pending.into_iter().take(max_size).collect();

        Self {
            rows,
            pending_total,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn pending_total(&self) -> usize {
        self.pending_total
    }

    /// Empty rows left for a later run.
    pub fn deferred(&self) -> usize {
        self.pending_total - self.rows.len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.url.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_store::{RowPosition, RowStatus};

    fn row(index: usize, status: RowStatus) -> Row {
        Row::new(
            RowPosition::from_data_index(index),
            format!("http://example.com/{index}"),
            status,
        )
    }

    #[test]
    fn test_select_skips_non_empty_rows() {
        let rows = vec![
            row(0, RowStatus::Completed),
            row(1, RowStatus::Empty),
            row(2, RowStatus::Processing),
            row(3, RowStatus::error("Gist")),
            row(4, RowStatus::Empty),
            row(5, RowStatus::Other("hold".to_string())),
        ];

        let batch = Batch::select(rows, 200);
        let positions: Vec<u32> = batch.rows().iter().map(|r| r.position.0).collect();
        assert_eq!(positions, vec![3, 6]);
        assert_eq!(batch.pending_total(), 2);
        assert_eq!(batch.deferred(), 0);
    }

    #[test]
    fn test_select_caps_at_max_size() {
        let rows = (0..350).map(|i| row(i, RowStatus::Empty)).collect();
        let batch = Batch::select(rows, 200);

        assert_eq!(batch.len(), 200);
        assert_eq!(batch.pending_total(), 350);
        assert_eq!(batch.deferred(), 150);
        assert_eq!(batch.rows()[0].position, RowPosition(2));
        assert_eq!(batch.rows()[199].position, RowPosition(201));
    }

    #[test]
    fn test_select_nothing_pending() {
        let rows = vec![row(0, RowStatus::Completed)];
        let batch = Batch::select(rows, 200);
        assert!(batch.is_empty());
        assert_eq!(batch.pending_total(), 0);
    }

    #[test]
    fn test_urls_keep_order() {
        let rows = vec![row(0, RowStatus::Empty), row(1, RowStatus::Empty)];
        let batch = Batch::select(rows, 5);
        assert_eq!(
            batch.urls(),
            vec!["http://example.com/0", "http://example.com/1"]
        );
    }
}
