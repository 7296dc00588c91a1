//! Trait definitions for the publisher module.

use async_trait::async_trait;

use super::error::PublishError;
use super::types::{Artifact, PublishedArtifact};

/// A backend that turns an artifact into something publicly reachable.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the name of this publisher implementation.
    fn name(&self) -> &str;

    /// Text recorded in a row's status as `Error - <label>` when publishing fails.
    fn failure_label(&self) -> &str;

    /// Publishes the artifact and returns where it can be found.
    ///
    /// Called at most once per artifact; implementations do not need to guard
    /// against duplicates.
    async fn publish(&self, artifact: &Artifact) -> Result<PublishedArtifact, PublishError>;
}
