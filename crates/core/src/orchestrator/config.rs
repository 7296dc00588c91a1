//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use crate::config::{Config, FeedFailurePolicy};

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of rows taken per run.
    /// Rows beyond this stay empty for a later run.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// What to do with the batch when the feed artifact fails.
    #[serde(default)]
    pub feed_failure_policy: FeedFailurePolicy,
}

fn default_batch_size() -> usize {
    200
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            feed_failure_policy: FeedFailurePolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Derives the orchestrator settings from the root configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batch.size,
            feed_failure_policy: config
                .feed
                .as_ref()
                .map(|f| f.on_failure)
                .unwrap_or_default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_feed_failure_policy(mut self, policy: FeedFailurePolicy) -> Self {
        self.feed_failure_policy = policy;
        self
    }
}
