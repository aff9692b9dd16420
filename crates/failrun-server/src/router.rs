//! Axum router wiring.
//!
//! Sink routes and ops endpoints; every other path falls through to the
//! static assets directory.

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{app_state::AppState, ops, transport::http};

pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.cfg().server.assets);

    Router::new()
        .route(http::NEW_PATH, get(http::new_sink))
        .route("/s/", get(http::empty_sink))
        .route("/s/*id", get(http::hit_sink))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
