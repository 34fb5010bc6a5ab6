//! In-process backend with fault injection.
//!
//! Last write wins, like the real store. Switches let tests make the probe
//! fail, make writes fail, or make writes report zero affected rows.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::BoxFuture;
use tokio::sync::RwLock;

use super::KvBackend;
use crate::error::StoreError;

/// Map-backed [`KvBackend`].
#[derive(Debug)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, String>>,
    reachable: AtomicBool,
    fail_writes: AtomicBool,
    zero_rows: AtomicBool,
}

impl MemoryBackend {
    /// Creates an empty, reachable backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            zero_rows: AtomicBool::new(false),
        }
    }

    /// Current value for `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.records.read().await.get(key).cloned()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Makes [`KvBackend::ping`] succeed or fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Makes every upsert fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every upsert succeed without writing and report zero rows.
    pub fn set_zero_rows(&self, zero: bool) {
        self.zero_rows.store(zero, Ordering::SeqCst);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryBackend {
    fn upsert<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("write rejected".to_string()));
            }
            if self.zero_rows.load(Ordering::SeqCst) {
                return Ok(0);
            }
            self.records
                .write()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(1)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            if self.reachable.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StoreError::Backend("store unreachable".to_string()))
            }
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.reachable.store(false, Ordering::SeqCst);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_writes_leave_map_untouched() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        assert!(backend.upsert("a", "1").await.is_err());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn close_makes_probe_fail() {
        let backend = MemoryBackend::new();
        assert!(backend.ping().await.is_ok());
        backend.close().await;
        assert!(backend.ping().await.is_err());
    }

    #[tokio::test]
    async fn concurrent_writers_last_value_wins_per_key() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let b = std::sync::Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                let key = format!("k{}", i % 4);
                b.upsert(&key, &i.to_string()).await
            }));
        }
        for h in handles {
            assert!(matches!(h.await, Ok(Ok(1))));
        }
        assert_eq!(backend.len().await, 4);
    }
}
