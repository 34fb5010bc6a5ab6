//! # kv-gateway
//!
//! WebSocket gateway that applies JSON upsert commands to a shared
//! key/value store.
//!
//! Clients connect from an allow-listed origin and send
//! `{"action":"update","data":{"key":..,"value":..}}`; every decoded
//! command gets exactly one `{"status":..,"message":..}` reply. The store
//! itself is external and reached through a connection pool.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── Upgrade gate: origin allow-list (ws/origin)
//!     ├── Session loop: read → decode → dispatch → reply (ws/connection)
//!     │
//!     ├── Dispatcher (ws/dispatch)
//!     │
//!     ├── StoreClient (store/)
//!     │
//!     └── PostgreSQL (kv_store table)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod store;
pub mod ws;
