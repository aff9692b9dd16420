//! Sink endpoints.
//!
//! - `GET /new`     : mint an id, 303 to `/s/<id>`
//! - `GET /s/<id>`  : count a hit, return the window as JSON (anything
//!   under `/s/`, so malformed ids get a JSON 400 rather than a 404)
//! - `GET /s/`      : 303 to `/new`
//!
//! Ids longer than `ID_LEN` are never stored; the client is redirected to the
//! truncated path instead.

use axum::{
    extract::{rejection::PathRejection, Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tokio::time::Instant;

use failrun_core::error::{FailRunError, Result};
use failrun_core::{encode_snapshot, id};

use crate::app_state::AppState;

pub const NEW_PATH: &str = "/new";
pub const SINK_PREFIX: &str = "/s/";

/// Client-visible error: `{ "code": ..., "msg": ... }` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub FailRunError);

impl From<FailRunError> for ApiError {
    fn from(e: FailRunError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FailRunError::InvalidId(_) | FailRunError::Config(_) => StatusCode::BAD_REQUEST,
            FailRunError::SinkExpired(_) | FailRunError::ShuttingDown => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            FailRunError::Serialization(_) | FailRunError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = json!({
            "code": self.0.client_code().as_str(),
            "msg": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

pub async fn new_sink(State(app): State<AppState>) -> Redirect {
    let id = app.ids().generate();
    app.metrics().ids_minted.inc(&[]);
    Redirect::to(&format!("{SINK_PREFIX}{id}"))
}

pub async fn empty_sink() -> Redirect {
    Redirect::to(NEW_PATH)
}

pub async fn hit_sink(
    State(app): State<AppState>,
    raw_id: std::result::Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> Response {
    // nested segments and undecodable bytes are bad ids like any other
    let Path(raw_id) = match raw_id {
        Ok(path) => path,
        Err(rejection) => return reject(&app, FailRunError::InvalidId(rejection.body_text())),
    };

    if let Some(short) = id::truncate(&raw_id) {
        // only redirect to something that will be accepted
        if let Err(e) = id::validate(short) {
            return reject(&app, e);
        }
        let location = match query {
            Some(q) => format!("{SINK_PREFIX}{short}?{q}"),
            None => format!("{SINK_PREFIX}{short}"),
        };
        return Redirect::to(&location).into_response();
    }

    match record(&app, &raw_id).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => reject(&app, e),
    }
}

fn reject(app: &AppState, e: FailRunError) -> Response {
    app.metrics()
        .request_errors
        .inc(&[("code", e.client_code().as_str())]);
    ApiError(e).into_response()
}

async fn record(app: &AppState, id: &str) -> Result<Vec<u8>> {
    let started = Instant::now();
    let registry = app.registry();
    let sink = registry.get_or_create(id, app.idle_timeout())?;
    let snapshot = registry.record_hit(&sink).await?;

    let metrics = app.metrics();
    metrics.hits.inc(&[]);
    metrics.hit_duration.observe(&[], started.elapsed());

    encode_snapshot(&snapshot).map_err(|e| {
        tracing::error!(sink = id, error = %e, "can't encode measurements");
        e
    })
}
