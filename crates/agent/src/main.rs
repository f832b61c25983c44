//! `netmon-agent` -- bandwidth degradation monitor.
//!
//! Measures link throughput on a fixed interval and posts an alert to a
//! webhook when speed stays below the expected baseline for too many
//! consecutive checks. See [`netmon_agent::config`] for the environment
//! variables it reads.

use std::sync::Arc;

use netmon_agent::config::AgentConfig;
use netmon_agent::sampler::HttpSpeedTest;
use netmon_agent::scheduler::Scheduler;
use netmon_core::monitoring::AlertEvaluator;
use netmon_events::WebhookDelivery;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "netmon_agent=info,netmon_core=info,netmon_events=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let notifier = WebhookDelivery::new(
        config.credentials.webhook_url.clone(),
        config.credentials.token.clone(),
    )
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build webhook client");
        std::process::exit(1);
    });

    let sampler = HttpSpeedTest::new(config.speed_test.clone()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build speed test client");
        std::process::exit(1);
    });

    tracing::info!(
        credentials = %config.credentials_path.display(),
        download_url = %config.speed_test.download_url,
        upload_url = %config.speed_test.upload_url,
        interval_secs = config.monitor.poll_interval.as_secs(),
        threshold = config.monitor.consecutive_threshold,
        cooldown_secs = config.monitor.alert_cooldown.as_secs(),
        "Starting netmon-agent",
    );

    let poll_interval = config.monitor.poll_interval;
    let evaluator = AlertEvaluator::new(config.monitor, Arc::new(sampler), Arc::new(notifier))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid monitoring parameters");
            std::process::exit(1);
        });

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(Arc::new(evaluator), poll_interval, config.shutdown_timeout);
    let scheduler_handle = tokio::spawn(scheduler.run(cancel.clone()));

    shutdown_signal().await;
    cancel.cancel();

    if let Err(e) = scheduler_handle.await {
        tracing::error!(error = %e, "Scheduler task failed");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
