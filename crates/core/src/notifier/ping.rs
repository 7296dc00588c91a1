//! XML-RPC `weblogUpdates.ping` notifier.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::NotifierConfig;
use crate::xmlrpc::{self, Value};

use super::{BroadcastReport, Notifier, PingAttempt, PingResult};

/// Pings every configured endpoint for every URL, concurrently.
pub struct PingNotifier {
    client: Client,
    endpoints: Vec<String>,
}

impl PingNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            endpoints: config.endpoints.clone(),
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn ping(&self, endpoint: &str, title: &str, url: &str) -> PingResult {
        let payload = xmlrpc::method_call(
            "weblogUpdates.ping",
            &[Value::string(title), Value::string(url)],
        );

        let response = match self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let error = if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    e.to_string()
                };
                return PingResult::Failed { error };
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            return PingResult::Rejected {
                status,
                message: body.chars().take(200).collect(),
            };
        }
        if let Some(fault) = xmlrpc::fault_string(&body) {
            return PingResult::Rejected {
                status,
                message: fault,
            };
        }
        if xmlrpc::flerror(&body) == Some(true) {
            return PingResult::Rejected {
                status,
                message: "endpoint reported flerror".to_string(),
            };
        }

        PingResult::Delivered { status }
    }
}

#[async_trait]
impl Notifier for PingNotifier {
    fn name(&self) -> &str {
        "weblogs_ping"
    }

    async fn broadcast(&self, title: &str, urls: &[String]) -> BroadcastReport {
        let pairs: Vec<(&str, &str)> = self
            .endpoints
            .iter()
            .flat_map(|endpoint| urls.iter().map(move |url| (endpoint.as_str(), url.as_str())))
            .collect();

        debug!(pings = pairs.len(), "Broadcasting pings");

        let attempts = join_all(pairs.into_iter().map(|(endpoint, url)| async move {
            let result = self.ping(endpoint, title, url).await;
            match &result {
                PingResult::Delivered { status } => {
                    debug!(endpoint = endpoint, url = url, status = status, "Ping delivered")
                }
                PingResult::Rejected { status, message } => warn!(
                    endpoint = endpoint,
                    url = url,
                    status = status,
                    message = %message,
                    "Ping rejected"
                ),
                PingResult::Failed { error } => {
                    warn!(endpoint = endpoint, url = url, error = %error, "Ping failed")
                }
            }
            PingAttempt {
                endpoint: endpoint.to_string(),
                url: url.to_string(),
                result,
            }
        }))
        .await;

        let report = BroadcastReport { attempts };
        info!(
            delivered = report.delivered(),
            failed = report.failed(),
            "Ping broadcast finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_without_endpoints_is_empty() {
        let notifier = PingNotifier::new(&NotifierConfig {
            endpoints: vec![],
            timeout_secs: 1,
        })
        .unwrap();

        let report = notifier
            .broadcast("Link Report", &["https://site/x.html".to_string()])
            .await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_collected_not_raised() {
        // Port 9 (discard) on localhost is closed in test environments
        let notifier = PingNotifier::new(&NotifierConfig {
            endpoints: vec!["http://127.0.0.1:9/".to_string()],
            timeout_secs: 1,
        })
        .unwrap();

        let report = notifier
            .broadcast("Link Report", &["https://site/x.html".to_string()])
            .await;
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.delivered(), 0);
        assert!(matches!(
            report.attempts[0].result,
            PingResult::Failed { .. }
        ));
    }
}
