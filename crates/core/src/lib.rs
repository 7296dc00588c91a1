pub mod config;
pub mod metrics;
pub mod notifier;
pub mod orchestrator;
pub mod publisher;
pub mod row_store;
pub mod testing;
pub mod xmlrpc;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, FeedFailurePolicy,
    PublisherBackend, SanitizedConfig,
};
pub use notifier::{BroadcastReport, Notifier, PingNotifier};
pub use orchestrator::{BatchOrchestrator, OrchestratorConfig, OrchestratorError, RunOutcome};
pub use publisher::{
    create_feed_publisher, create_publisher, Artifact, PublishError, PublishedArtifact, Publisher,
};
pub use row_store::{GoogleSheetsStore, Row, RowPosition, RowStatus, RowStore, StoreError};
