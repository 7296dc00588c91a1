//! Trait definitions for the notifier module.

use async_trait::async_trait;

use super::types::BroadcastReport;

/// Broadcasts that new content exists at some URLs.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the name of this notifier implementation.
    fn name(&self) -> &str;

    /// Attempts one notification per `(endpoint, url)` pair.
    ///
    /// Never fails: individual failures are collected in the report, which is
    /// only meant for logging and metrics.
    async fn broadcast(&self, title: &str, urls: &[String]) -> BroadcastReport;
}
