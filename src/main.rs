//! Command-line entry point for lead-verifier
//!
//! All settings come from flags or environment variables, see
//! `lead-verifier --help`. Logging is controlled with `RUST_LOG`; per-lead
//! lines are emitted at trace level.

use anyhow::Context;
use clap::Parser;
use lead_verifier::kafka::{KafkaSink, KafkaSource};
use lead_verifier::metrics::server;
use lead_verifier::{Config, LeadMetrics, Pipeline, RecordRouter, DLQ_TOPIC};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;
    info!(
        "Starting lead-verifier: brokers={} raw={} verified={} dlq={} group={}",
        config.brokers.join(","),
        config.raw_topic,
        config.verified_topic,
        DLQ_TOPIC,
        config.group_id
    );

    let shutdown = CancellationToken::new();

    let metrics = LeadMetrics::new();
    let listener = TcpListener::bind(config.metrics_addr)
        .await
        .with_context(|| format!("Failed to bind metrics endpoint on {}", config.metrics_addr))?;
    let metrics_task = tokio::spawn(server::serve(
        listener,
        metrics.handle(),
        shutdown.clone(),
    ));

    let source = KafkaSource::new(config.consumer_config()).context("Failed to create consumer")?;
    let verified = KafkaSink::new(config.verified_producer_config())
        .context("Failed to create verified producer")?;
    let dead_letter =
        KafkaSink::new(config.dlq_producer_config()).context("Failed to create DLQ producer")?;

    let router = RecordRouter::new(verified, dead_letter, metrics);
    let mut pipeline = Pipeline::new(source, router, config.backoff());

    tokio::spawn(wait_for_signal(shutdown.clone()));
    let stats = pipeline.run(shutdown.clone()).await;

    info!("Flushing producers");
    pipeline.router().flush(config.shutdown_flush_timeout).await;
    drop(pipeline);

    match metrics_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Metrics server exited with error: {e:#}"),
        Err(e) => warn!("Metrics server task failed: {e}"),
    }

    info!("Shutdown complete: {stats}");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = wait_for_ctrl_c() => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                wait_for_ctrl_c().await;
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
        info!("Received Ctrl-C");
    }

    shutdown.cancel();
}

/// Resolve on Ctrl-C. Never resolves if the handler cannot be installed.
async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
