//! Google Sheets row store implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::StoreConfig;

use super::{Row, RowPosition, RowStatus, RowStore, StoreError};

/// Where the URL and status columns live, resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    url: usize,
    status: usize,
}

/// Row store backed by a Google Sheets worksheet (Sheets API v4).
///
/// The first row is a header; columns are located by header name so the
/// sheet can be reordered without touching the configuration. The sheets API
/// has no conditional write, so locking is a plain write.
pub struct GoogleSheetsStore {
    client: Client,
    config: StoreConfig,
    layout: RwLock<Option<ColumnLayout>>,
}

impl GoogleSheetsStore {
    /// Create a new store with the given configuration.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            layout: RwLock::new(None),
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    /// A1 range on the configured worksheet, e.g. `'My Sheet'!B7`.
    fn range(&self, cells: &str) -> String {
        format!("{}!{}", quote_sheet_name(&self.config.sheet_name), cells)
    }

    /// The whole used range of the worksheet.
    fn sheet_range(&self) -> String {
        quote_sheet_name(&self.config.sheet_name)
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.values_url(range);
        debug!(range = range, "Reading sheet values");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to parse response: {e}")))?;

        Ok(value_range.values)
    }

    fn resolve_layout(&self, header: &[String]) -> Result<ColumnLayout, StoreError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|cell| cell.trim() == name)
                .ok_or_else(|| StoreError::MissingColumn {
                    column: name.to_string(),
                })
        };

        Ok(ColumnLayout {
            url: find(&self.config.url_column)?,
            status: find(&self.config.status_column)?,
        })
    }

    /// Column layout, reading the header row if it is not known yet.
    async fn layout(&self) -> Result<ColumnLayout, StoreError> {
        if let Some(layout) = *self.layout.read().await {
            return Ok(layout);
        }

        let rows = self.get_values(&self.range("1:1")).await?;
        let header = rows.into_iter().next().unwrap_or_default();
        let layout = self.resolve_layout(&header)?;
        *self.layout.write().await = Some(layout);
        Ok(layout)
    }
}

#[async_trait]
impl RowStore for GoogleSheetsStore {
    fn name(&self) -> &str {
        "google_sheets"
    }

    async fn fetch_all(&self) -> Result<Vec<Row>, StoreError> {
        let mut values = self
            .get_values(&self.sheet_range())
            .await?
            .into_iter();

        let header = values.next().unwrap_or_default();
        let layout = self.resolve_layout(&header)?;
        *self.layout.write().await = Some(layout);

        let mut rows = Vec::new();
        for (index, cells) in values.enumerate() {
            let cell = |column: usize| cells.get(column).map(String::as_str).unwrap_or("");

            let url = cell(layout.url).trim();
            if url.is_empty() {
                // Blank lines keep their position but carry nothing to publish
                continue;
            }

            rows.push(Row::new(
                RowPosition::from_data_index(index),
                url,
                RowStatus::parse(cell(layout.status)),
            ));
        }

        debug!(rows = rows.len(), "Fetched rows from sheet");
        Ok(rows)
    }

    async fn set_status(
        &self,
        position: RowPosition,
        status: &RowStatus,
    ) -> Result<(), StoreError> {
        if position < RowPosition::FIRST_DATA_ROW {
            return Err(StoreError::RowNotFound(position));
        }

        let layout = self.layout().await?;
        let range = self.range(&format!("{}{}", column_letter(layout.status), position));
        let body = ValueRange {
            range: Some(range.clone()),
            major_dimension: Some("ROWS".to_string()),
            values: vec![vec![status.as_cell()]],
        };

        let response = self
            .client
            .put(self.values_url(&range))
            .bearer_auth(&self.config.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(row = %position, status = %http_status, "Status write rejected");
            return Err(StoreError::Unavailable(format!(
                "HTTP {}: {}",
                http_status,
                text.chars().take(200).collect::<String>()
            )));
        }

        debug!(row = %position, status = %status, "Status written");
        Ok(())
    }
}

/// Sheets API `ValueRange` resource.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Spreadsheet column letters for a 0-based index (0 = A, 26 = AA).
fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a sheet name for A1 notation. Always quoted, so names such as `Q1`
/// are never read as cell references.
fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("Sheet1"), "'Sheet1'");
        assert_eq!(quote_sheet_name("Q1"), "'Q1'");
        assert_eq!(quote_sheet_name("AB12"), "'AB12'");
        assert_eq!(quote_sheet_name("Link Queue"), "'Link Queue'");
        assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_value_range_tolerates_missing_values() {
        let parsed: ValueRange = serde_json::from_str(r#"{"range":"Sheet1!A1:ZZ1000"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }
}
