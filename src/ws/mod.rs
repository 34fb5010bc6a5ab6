//! WebSocket layer: upgrade gate, session loop, codec, and dispatch.
//!
//! Each accepted upgrade runs [`connection::run_session`] on its own task.
//! Sessions share nothing but the [`crate::store::StoreClient`].

pub mod connection;
pub mod dispatch;
pub mod handler;
pub mod messages;
pub mod origin;
