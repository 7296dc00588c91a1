//! Mock publisher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::publisher::{Artifact, PublishError, PublishedArtifact, Publisher};

/// Mock implementation of the Publisher trait.
///
/// Records every artifact it is asked to publish and either returns
/// `<base_url>/<slug>` or fails once with a configured error.
#[derive(Debug, Clone)]
pub struct MockPublisher {
    name: String,
    label: String,
    base_url: String,
    published: Arc<RwLock<Vec<Artifact>>>,
    next_error: Arc<RwLock<Option<String>>>,
    always_fail: Arc<RwLock<bool>>,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    /// Create a mock primary publisher.
    pub fn new() -> Self {
        Self::named("mock", "Mock", "https://site.example/posts")
    }

    /// Create a mock with explicit name, failure label and URL prefix.
    pub fn named(name: &str, label: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            base_url: base_url.to_string(),
            published: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            always_fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Artifacts passed to `publish`, including failed attempts.
    pub async fn published(&self) -> Vec<Artifact> {
        self.published.read().await.clone()
    }

    pub async fn publish_count(&self) -> usize {
        self.published.read().await.len()
    }

    /// Fail the next publish with this detail.
    pub async fn set_next_error(&self, detail: &str) {
        *self.next_error.write().await = Some(detail.to_string());
    }

    /// Fail every publish until cleared.
    pub async fn set_always_fail(&self, fail: bool) {
        *self.always_fail.write().await = fail;
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn failure_label(&self) -> &str {
        &self.label
    }

    async fn publish(&self, artifact: &Artifact) -> Result<PublishedArtifact, PublishError> {
        self.published.write().await.push(artifact.clone());

        if let Some(detail) = self.next_error.write().await.take() {
            return Err(PublishError::new(&self.name, detail));
        }
        if *self.always_fail.read().await {
            return Err(PublishError::new(&self.name, "configured to fail"));
        }

        Ok(PublishedArtifact::new(
            &self.name,
            format!("{}/{}.html", self.base_url, artifact.slug),
        ))
    }
}
