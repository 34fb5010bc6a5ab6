//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    timestamp: String,
    version: &'static str,
}

/// `GET /health` — Service and store status.
///
/// Answers `503 Service Unavailable` while the store probe fails.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.store.is_healthy().await;
    let (code, status, store) = if store_ok {
        (StatusCode::OK, "healthy", "reachable")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unreachable")
    };
    (
        code,
        Json(HealthResponse {
            status,
            store,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
