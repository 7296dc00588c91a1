//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{BroadcastReport, Notifier, PingAttempt, PingResult};

/// A recorded broadcast for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBroadcast {
    pub title: String,
    pub urls: Vec<String>,
}

/// Mock implementation of the Notifier trait.
///
/// Pretends to ping a fixed endpoint list; every ping either succeeds or,
/// with `set_fail_all`, fails.
#[derive(Debug, Clone)]
pub struct MockNotifier {
    endpoints: Vec<String>,
    broadcasts: Arc<RwLock<Vec<RecordedBroadcast>>>,
    fail_all: Arc<RwLock<bool>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            endpoints: vec![
                "http://ping-one.example/".to_string(),
                "http://ping-two.example/".to_string(),
            ],
            broadcasts: Arc::new(RwLock::new(Vec::new())),
            fail_all: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn broadcasts(&self) -> Vec<RecordedBroadcast> {
        self.broadcasts.read().await.clone()
    }

    /// Make every ping fail.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn broadcast(&self, title: &str, urls: &[String]) -> BroadcastReport {
        self.broadcasts.write().await.push(RecordedBroadcast {
            title: title.to_string(),
            urls: urls.to_vec(),
        });

        let fail = *self.fail_all.read().await;
        let attempts = self
            .endpoints
            .iter()
            .flat_map(|endpoint| {
                urls.iter().map(move |url| PingAttempt {
                    endpoint: endpoint.clone(),
                    url: url.clone(),
                    result: if fail {
                        PingResult::Failed {
                            error: "connection refused".to_string(),
                        }
                    } else {
                        PingResult::Delivered { status: 200 }
                    },
                })
            })
            .collect();

        BroadcastReport { attempts }
    }
}
