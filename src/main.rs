//! Uptime Graph Generator Binary

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uptime_graphs::{Config, GraphBatch, Result, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    initialize_tracing();

    info!("Starting uptime graph generator v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    let batch = GraphBatch::from_config(config)?;

    let config = batch.config();
    info!(
        "Generator configuration - Summary: {}, Output: {}, Prefix: {}, Window: {} days, Fail fast: {}, Incidents: {}",
        config.summary_path.display(),
        batch.store().output_dir().display(),
        config.graph_prefix,
        config.lookback_days,
        config.fail_fast,
        config
            .incidents_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let report = match batch.run(&SystemClock).await {
        Ok(report) => report,
        Err(e) => {
            error!("Graph generation failed: {}", e);
            std::process::exit(1);
        }
    };

    if !report.is_success() {
        warn!(
            "{} of {} services were skipped",
            report.failures.len(),
            report.failures.len() + report.generated.len()
        );
        std::process::exit(2);
    }

    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
