//! Fraud Risk Engine - Main Entry Point
//!
//! Consumes analysis submissions from NATS, runs the scoring pipeline, and
//! serves assessment, pattern and alert queries over request-reply.

use anyhow::Result;
use fraud_risk_engine::{
    alerts::AlertLedger,
    config::AppConfig,
    metrics::{EngineMetrics, MetricsReporter},
    patterns::PatternCatalog,
    pipeline::AnalysisPipeline,
    service::EngineService,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_risk_engine=info".parse()?),
        )
        .init();

    info!("Starting Fraud Risk Engine");

    // Load configuration
    let config = Arc::new(AppConfig::load()?);
    info!("Configuration loaded successfully");
    info!(
        "Classify thresholds: medium>{:.2} high>{:.2}; recommend: review>{:.2} block>{:.2}",
        config.classify.medium,
        config.classify.high,
        config.recommend.review_risk,
        config.recommend.block_risk
    );

    // Initialize components
    let metrics = Arc::new(EngineMetrics::new());

    let catalog = Arc::new(PatternCatalog::seeded());
    info!(
        "Pattern catalog seeded ({} patterns in {} categories)",
        catalog.pattern_count(),
        catalog.categories().len()
    );

    let ledger = Arc::new(AlertLedger::new());
    let pipeline = Arc::new(AnalysisPipeline::new(
        &config,
        catalog.clone(),
        ledger.clone(),
        metrics.clone(),
    ));
    info!(
        "Analysis pipeline initialized ({} workers, {}ms latency bound)",
        config.pipeline.workers, config.pipeline.timeout_ms
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Serve until the connection drops
    let service = Arc::new(EngineService::new(
        client,
        config.clone(),
        pipeline,
        catalog,
        ledger,
    ));
    service.run().await?;

    info!("Engine shutting down...");
    metrics.print_summary();

    Ok(())
}
