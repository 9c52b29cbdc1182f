use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signal_relay::{metrics, router, Config, RelayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let state = Arc::new(RelayState::new(&config));
    if let Some(every) = config.stats_interval() {
        let _reporter = metrics::spawn_reporter(Arc::clone(&state), every);
    }

    let path = config.signaling_path();
    info!(
        addr = %listener.local_addr()?,
        path = %path,
        capacity = %config.capacity(),
        "signaling relay listening"
    );

    axum::serve(listener, router(state, &path))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server failed")?;

    info!("signaling relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "unable to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
