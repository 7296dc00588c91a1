//! Error types for the publisher module.

use thiserror::Error;

/// A publisher rejected the artifact or could not reach its backend.
#[derive(Debug, Error)]
#[error("{backend} publish failed: {detail}")]
pub struct PublishError {
    /// Publisher name.
    pub backend: String,
    /// What went wrong.
    pub detail: String,
}

impl PublishError {
    pub fn new(backend: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            detail: detail.into(),
        }
    }

    /// Transport-level failure from the HTTP client.
    pub fn transport(backend: &str, error: reqwest::Error) -> Self {
        let detail = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        };
        Self::new(backend, detail)
    }

    /// Non-success HTTP status. The body is truncated.
    pub fn http_status(backend: &str, status: reqwest::StatusCode, body: &str) -> Self {
        Self::new(
            backend,
            format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ),
        )
    }

    /// Local I/O failure.
    pub fn io(backend: &str, context: &str, error: std::io::Error) -> Self {
        Self::new(backend, format!("{context}: {error}"))
    }
}
