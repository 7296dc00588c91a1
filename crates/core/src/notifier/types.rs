//! Types for the notifier module.

use serde::{Deserialize, Serialize};

/// How a single ping went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PingResult {
    /// Endpoint accepted the ping.
    Delivered { status: u16 },
    /// Endpoint answered but reported an error.
    Rejected { status: u16, message: String },
    /// No usable answer (timeout, connection error).
    Failed { error: String },
}

impl PingResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PingResult::Delivered { .. })
    }
}

/// One `(endpoint, url)` notification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingAttempt {
    pub endpoint: String,
    pub url: String,
    pub result: PingResult,
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub attempts: Vec<PingAttempt>,
}

impl BroadcastReport {
    pub fn delivered(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.result.is_delivered())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.len() - self.delivered()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(result: PingResult) -> PingAttempt {
        PingAttempt {
            endpoint: "http://rpc.pingomatic.com/".to_string(),
            url: "https://site/posts/x.html".to_string(),
            result,
        }
    }

    #[test]
    fn test_report_counts() {
        let report = BroadcastReport {
            attempts: vec![
                attempt(PingResult::Delivered { status: 200 }),
                attempt(PingResult::Rejected {
                    status: 200,
                    message: "flerror".to_string(),
                }),
                attempt(PingResult::Failed {
                    error: "timeout".to_string(),
                }),
            ],
        };
        assert_eq!(report.delivered(), 1);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_empty());
        assert!(BroadcastReport::default().is_empty());
    }

    #[test]
    fn test_ping_result_serialization() {
        let json = serde_json::to_string(&PingResult::Delivered { status: 200 }).unwrap();
        assert_eq!(json, r#"{"result":"delivered","status":200}"#);
    }
}
