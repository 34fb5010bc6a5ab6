//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::store::StoreClient;
use crate::ws::origin::AllowedOrigins;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Verified store handle shared by every session.
    pub store: StoreClient,
    /// Origins accepted by the WebSocket upgrade gate.
    pub allowed_origins: Arc<AllowedOrigins>,
}

impl AppState {
    /// Creates the state from its parts.
    #[must_use]
    pub fn new(store: StoreClient, allowed_origins: AllowedOrigins) -> Self {
        Self {
            store,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
