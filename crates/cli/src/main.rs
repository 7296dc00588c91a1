use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkdigest_core::{
    create_feed_publisher, create_publisher, load_config, metrics, validate_config,
    BatchOrchestrator, Config, GoogleSheetsStore, Notifier, OrchestratorConfig, PingNotifier,
    Publisher, RowStore, RunOutcome, SanitizedConfig,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "linkdigest",
    version,
    about = "Publish queued URLs from a spreadsheet as a link digest"
)]
struct Cli {
    /// Path to config TOML file
    #[arg(long, env = "LINKDIGEST_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Show the next batch without writing, publishing or pinging
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,linkdigest_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Runs one batch. Returns whether the run should exit successfully.
async fn run(cli: Cli) -> Result<bool> {
    info!(version = VERSION, "Starting linkdigest");

    // Load configuration
    info!("Loading configuration from {:?}", cli.config);
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    if let Some(size) = cli.batch_size {
        config.batch.size = size;
    }

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        config = %serde_json::to_string(&sanitized).unwrap_or_default(),
        "Configuration loaded successfully"
    );

    let orchestrator = build_orchestrator(&config)?;

    if cli.dry_run {
        let batch = orchestrator
            .preview()
            .await
            .context("Failed to read the row store")?;
        info!(
            pending = batch.pending_total(),
            batch = batch.len(),
            deferred = batch.deferred(),
            "Dry run, nothing written"
        );
        for row in batch.rows() {
            info!(row = %row.position, url = %row.url, "Would publish");
        }
        return Ok(true);
    }

    let result = orchestrator.run_once().await;

    if let Some(metrics_config) = &config.metrics {
        if let Err(e) = write_metrics(&metrics_config.textfile_path).await {
            warn!(error = %e, "Failed to write metrics textfile");
        }
    }

    match result.context("Batch run failed")? {
        RunOutcome::NoWork => {
            info!("Nothing to publish");
            Ok(true)
        }
        RunOutcome::Completed(summary) => {
            info!(
                completed = summary.completed,
                deferred = summary.deferred,
                urls = ?summary.public_urls(),
                pings_delivered = summary.broadcast.delivered(),
                pings_failed = summary.broadcast.failed(),
                "Batch completed"
            );
            Ok(true)
        }
        RunOutcome::Aborted(summary) => {
            if let Some(abort) = &summary.abort {
                error!(
                    backend = %abort.backend,
                    label = %abort.label,
                    detail = %abort.detail,
                    failed = summary.failed,
                    "Batch aborted"
                );
            }
            Ok(false)
        }
    }
}

fn build_orchestrator(config: &Config) -> Result<BatchOrchestrator> {
    let store: Arc<dyn RowStore> = Arc::new(
        GoogleSheetsStore::new(config.store.clone()).context("Failed to create row store")?,
    );
    info!(
        spreadsheet = %config.store.spreadsheet_id,
        sheet = %config.store.sheet_name,
        "Row store initialized"
    );

    let publisher: Arc<dyn Publisher> = Arc::from(
        create_publisher(&config.publisher).context("Failed to create publisher")?,
    );
    info!("Using publisher: {}", publisher.name());

    let notifier: Arc<dyn Notifier> = Arc::new(
        PingNotifier::new(&config.notifier).context("Failed to create ping notifier")?,
    );
    info!(endpoints = config.notifier.endpoints.len(), "Ping notifier initialized");

    let mut orchestrator = BatchOrchestrator::new(
        OrchestratorConfig::from_config(config),
        store,
        publisher,
        notifier,
    );

    // Create feed publisher if configured
    match &config.feed {
        Some(feed_config) => {
            let feed: Arc<dyn Publisher> = Arc::from(
                create_feed_publisher(feed_config).context("Failed to create feed publisher")?,
            );
            info!(on_failure = ?feed_config.on_failure, "Feed publisher initialized");
            orchestrator = orchestrator.with_feed_publisher(feed);
        }
        None => info!("No feed configured"),
    }

    Ok(orchestrator)
}

/// Writes the metrics registry for the node-exporter textfile collector.
///
/// The file is replaced atomically so the collector never reads a partial
/// write.
async fn write_metrics(path: &Path) -> Result<()> {
    let body = metrics::encode_metrics().context("Failed to encode metrics")?;
    let tmp = path.with_extension("prom.tmp");
    tokio::fs::write(&tmp, body)
        .await
        .with_context(|| format!("Failed to write {:?}", tmp))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move metrics into {:?}", path))?;
    info!("Metrics written to {:?}", path);
    Ok(())
}
