//! counter-server
//!
//! - Restores `<data_dir>/*.json` snapshots before serving
//! - `POST /metric` queues samples; a single consumer folds them into minute buckets
//! - Retention sweep and periodic snapshots run beside the HTTP server
//! - Ctrl-C / SIGTERM: drain the queue, write a final snapshot, exit

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use counter_core::error::{CounterError, Result};
use counter_server::{app_state::AppState, config, lifecycle, router};

#[tokio::main]
async fn main() {
    let default_filter = if config::debug_enabled() { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "counter-server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen = cfg.server.listen_addr()?;

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| CounterError::Internal(format!("failed to bind {listen}: {e}")))?;

    let (state, background) = lifecycle::start(cfg).await;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "counter-server started");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await;

    background.shutdown().await;
    served.map_err(|e| CounterError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    state.set_draining();
    tracing::info!("signal received, starting graceful shutdown");
}
