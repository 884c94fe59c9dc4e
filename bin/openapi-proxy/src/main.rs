use anyhow::Result;
use collector_proxy::{HttpFetcher, LoggingMiddleware, MiddlewareChain, ProxyConfig, SpecProxy};
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::tokio::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::ProxySettings;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ProxySettings::from_env()?;
    init_tracing(settings.debug, settings.json_logs);

    info!("Starting openapi-proxy v{}...", env!("CARGO_PKG_VERSION"));

    let config = ProxyConfig::new(&settings.upstream_header, &settings.document_filename)?;
    let fetcher = HttpFetcher::new(settings.upstream_timeout)?;
    info!(
        "Forwarding to the service named by the {} header with {:?} timeout",
        settings.upstream_header, settings.upstream_timeout
    );

    let middleware = MiddlewareChain::new().add(LoggingMiddleware);
    info!("Middleware chain initialized with {} middleware", middleware.len());
    let proxy = Arc::new(SpecProxy::new(config, fetcher, middleware));

    let listener = TcpListener::bind(settings.listen_addr).await?;
    info!("HTTP server listening on {}", settings.listen_addr);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(connection) => connection,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        };
        let io = TokioIo::new(stream);
        let proxy = proxy.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let proxy = proxy.clone();
                async move { Ok::<_, Infallible>(proxy.handle(req).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving HTTP connection from {}: {}", peer_addr, e);
            }
        });
    }

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
