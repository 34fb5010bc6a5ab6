//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use super::connection::run_session;
use super::dispatch::Dispatcher;
use crate::app_state::AppState;

/// `GET <ws_path>` — Upgrade HTTP connection to WebSocket.
///
/// The `Origin` header is checked before the upgrade is attempted; a
/// rejected origin gets `403 Forbidden` and no session is started.
pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let origin = match state.allowed_origins.check(&headers) {
        Ok(origin) => origin.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "websocket upgrade rejected");
            return e.into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(%origin, error = %rejection, "websocket upgrade failed");
            return rejection.into_response();
        }
    };

    let dispatcher = Dispatcher::new(state.store.clone());
    let span = tracing::info_span!(
        "ws_session",
        session_id = %uuid::Uuid::new_v4(),
        %origin
    );

    ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "websocket upgrade failed"))
        .on_upgrade(move |socket| {
            async move {
                run_session(socket, dispatcher).await;
            }
            .instrument(span)
        })
}
