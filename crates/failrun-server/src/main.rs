//! failrund: per-second request counter.
//!
//! Usage: `failrund [config.yaml]`. Without a config file every setting
//! takes its default (listen on 0.0.0.0:8080, assets from `web/`).

use std::net::SocketAddr;

use tokio::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use failrun_core::error::{FailRunError, Result};
use failrun_server::{app_state::AppState, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "failrund stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::load_from_file(&path)?,
        None => config::ServerConfig::default(),
    };
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| FailRunError::Config(format!("server.listen: {e}")))?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| FailRunError::Internal(format!("can't listen on {listen}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| FailRunError::Internal(format!("can't read local addr: {e}")))?;

    tracing::info!(
        %addr,
        seed = state.ids().seed(),
        assets = %state.cfg().server.assets,
        idle_timeout = ?state.idle_timeout(),
        "failrund starting"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|e| FailRunError::Internal(format!("can't serve: {e}")))?;

    let registry = state.registry();
    registry.shutdown();
    if !registry.drained(Duration::from_secs(5)).await {
        tracing::warn!(live = registry.len(), "sinks still live at exit");
    }
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "can't install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    state.set_draining();
    tracing::info!("draining");
}
