use anyhow::Result;
use collector_core::{Generator, Publisher, Reconciler, SpecIndex};
use collector_kube::{ConfigMapStore, KubeClient, KubeServiceSource};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::CollectorConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = CollectorConfig::from_env()?;
    init_tracing(config.debug, config.json_logs);

    info!("Collector v{} started", env!("CARGO_PKG_VERSION"));

    let client = KubeClient::try_default(config.request_timeout).await?;
    let namespace = config
        .namespace
        .clone()
        .unwrap_or_else(|| client.default_namespace().to_string());
    info!("Publishing artifacts to namespace {}", namespace);

    let reconciler = Reconciler::new(
        KubeServiceSource::new(client.clone()),
        Publisher::new(ConfigMapStore::new(client, namespace)),
        Generator::new(config.generator.clone()),
        Arc::new(SpecIndex::new()),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, exiting...");
        let _ = shutdown_tx.send(true);
    });

    reconciler.run(config.interval, shutdown_rx).await;
    Ok(())
}

fn init_tracing(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
