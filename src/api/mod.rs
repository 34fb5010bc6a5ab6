//! HTTP surface: router composition for the WebSocket endpoint and
//! system routes.

pub mod system;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the router with the WebSocket endpoint at `ws_path`.
pub fn build_router(ws_path: &str) -> Router<AppState> {
    Router::new()
        .route(ws_path, get(ws_handler))
        .merge(system::routes())
}

/// Builds the complete service: routes, request tracing, and state.
pub fn build_app(state: AppState, ws_path: &str) -> Router {
    build_router(ws_path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
