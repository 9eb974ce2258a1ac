mod config;
mod metrics;
mod routes;

use anyhow::Context;
use clap::Parser;
use config::Config;
use routes::{router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "weather-server", about = "Cached, multi-provider current weather over HTTP")]
struct Args {
    /// Path to the TOML config file. Defaults apply if it does not exist.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `server.listen_addr`.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let args = Args::parse();

    let mut config = Config::load_or_default(&args.config)?;
    config.pipeline.apply_env();
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    let prometheus = metrics::install_recorder().context("installing prometheus recorder")?;

    let service = weather_core::build_service(&config.pipeline)
        .await
        .context("building weather pipeline")?;

    tracing::info!(
        listen = %config.server.listen_addr,
        providers = ?service.provider_info().provider_order,
        cache_backend = service.cache_backend(),
        cache_enabled = config.pipeline.cache.enabled,
        ttl_seconds = config.pipeline.cache.ttl_seconds,
        "weather server starting"
    );

    let state = Arc::new(AppState {
        service,
        prometheus: Some(prometheus),
    });
    let app = router(state, config.server.request_timeout());

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("http server error")?;

    tracing::info!("weather server shut down");
    Ok(())
}

/// Listen for SIGINT (Ctrl+C) or SIGTERM and cancel the shutdown token.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot install SIGTERM handler, waiting for Ctrl+C only");
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }

    tracing::info!("shutdown signal received, draining connections...");
    token.cancel();
}
