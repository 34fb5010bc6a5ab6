//! Store layer: the client handle the dispatcher writes through.
//!
//! [`StoreClient`] wraps a [`KvBackend`] behind an `Arc` so every session
//! can hold a cheap clone. The backend owns whatever pooling it needs and
//! must tolerate concurrent calls; nothing above it takes locks.

pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;

use crate::error::{StartupError, StoreError};

/// Key/value storage reachable by the gateway.
pub trait KvBackend: fmt::Debug + Send + Sync {
    /// Inserts `key` or replaces its value, returning the rows affected.
    fn upsert<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<u64, StoreError>>;

    /// Liveness probe.
    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Releases held connections. Further calls may fail.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Shared, verified handle to the backing store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    backend: Arc<dyn KvBackend>,
}

impl StoreClient {
    /// Wraps `backend` after a successful liveness probe.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::StoreUnavailable`] if the probe fails.
    pub async fn open(backend: Arc<dyn KvBackend>) -> Result<Self, StartupError> {
        backend.ping().await.map_err(StartupError::StoreUnavailable)?;
        tracing::info!(?backend, "store connection verified");
        Ok(Self { backend })
    }

    /// Sets `key` to `value`, inserting the record if it does not exist.
    ///
    /// Attempted exactly once; never retried.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`], or
    /// [`StoreError::NoRowsAffected`] when the write reports no change.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let rows = self.backend.upsert(key, value).await?;
        if rows == 0 {
            return Err(StoreError::NoRowsAffected {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Probes the store without failing the caller.
    pub async fn is_healthy(&self) -> bool {
        match self.backend.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "store health probe failed");
                false
            }
        }
    }

    /// Closes the underlying backend.
    pub async fn close(&self) {
        self.backend.close().await;
        tracing::info!("store connection closed");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_fails_when_unreachable() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_reachable(false);
        let result = StoreClient::open(backend).await;
        assert!(matches!(result, Err(StartupError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn upsert_inserts_then_replaces() {
        let backend = Arc::new(MemoryBackend::new());
        let Ok(client) = StoreClient::open(Arc::clone(&backend) as Arc<dyn KvBackend>).await else {
            panic!("store should open");
        };

        assert!(client.upsert("a", "1").await.is_ok());
        assert_eq!(backend.get("a").await.as_deref(), Some("1"));

        assert!(client.upsert("a", "2").await.is_ok());
        assert_eq!(backend.get("a").await.as_deref(), Some("2"));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn zero_rows_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        let Ok(client) = StoreClient::open(Arc::clone(&backend) as Arc<dyn KvBackend>).await else {
            panic!("store should open");
        };
        backend.set_zero_rows(true);

        let result = client.upsert("a", "1").await;
        let Err(StoreError::NoRowsAffected { key }) = result else {
            panic!("expected NoRowsAffected, got {result:?}");
        };
        assert_eq!(key, "a");
    }

    #[tokio::test]
    async fn health_follows_reachability() {
        let backend = Arc::new(MemoryBackend::new());
        let Ok(client) = StoreClient::open(Arc::clone(&backend) as Arc<dyn KvBackend>).await else {
            panic!("store should open");
        };
        assert!(client.is_healthy().await);
        backend.set_reachable(false);
        assert!(!client.is_healthy().await);
    }
}
