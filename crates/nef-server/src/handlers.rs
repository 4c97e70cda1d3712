use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "service": "NEF Gateway",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "apis": [&*state.monitoring_root, &*state.qos_root],
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// 503 while the configured event source is replaced by the in-process
/// fallback, since no core network events can arrive.
pub async fn readyz(State(state): State<AppState>) -> Response {
    if state.events_degraded {
        let body = json!({
            "status": "degraded",
            "eventSource": state.events.name(),
            "detail": "configured core network event source is unavailable",
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }
    let body = json!({
        "status": "ready",
        "eventSource": state.events.name(),
    });
    (StatusCode::OK, Json(body)).into_response()
}
