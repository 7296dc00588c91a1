//! Types for the publisher module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used for both the title stamp and the file slug.
const STAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// One digest of submitted URLs, ready to be published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Human readable, time-stamped title.
    pub title: String,
    /// Time-stamped identifier usable in file names.
    pub slug: String,
    /// URLs in batch order.
    pub items: Vec<String>,
    /// Wall-clock time of the run that built this artifact.
    pub created_at: DateTime<Utc>,
    /// Public URL of a related artifact (the primary post when this is the feed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

impl Artifact {
    /// Build the digest for a batch of URLs at the given time.
    pub fn new(items: Vec<String>, created_at: DateTime<Utc>) -> Self {
        let slug = created_at.format(STAMP_FORMAT).to_string();
        Self {
            title: format!("Link Report: {slug}"),
            slug,
            items,
            created_at,
            permalink: None,
        }
    }

    /// Attach the public URL of the artifact this one accompanies.
    pub fn with_permalink(mut self, url: impl Into<String>) -> Self {
        self.permalink = Some(url.into());
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An artifact that is now publicly reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    /// Publisher that produced it.
    pub backend: String,
    /// Canonical public location.
    pub public_url: String,
}

impl PublishedArtifact {
    pub fn new(backend: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            public_url: public_url.into(),
        }
    }
}
