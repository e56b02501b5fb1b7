//! Durable key-value store interface.
//!
//! The hosting platform owns the real store (redis-shaped `get`/`set`/
//! `del`/`incrBy`); this trait is the seam the backend consumes it
//! through. [`MemoryKv`] backs local runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from the key-value backend.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value backend error: {0}")]
    Backend(String),

    #[error("value at `{key}` is not an integer")]
    NotAnInteger { key: String },
}

/// The store operations the backend needs.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set(&self, key: &str, value: String) -> Result<(), KvError>;

    async fn del(&self, key: &str) -> Result<(), KvError>;

    /// Add `delta` to the integer at `key` (missing counts as 0) and
    /// return the new value.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, KvError>;
}

/// In-memory [`KvStore`] for local runs and tests.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, KvError> {
        let mut entries = self.entries.write().await;
        let current = match entries.get(key) {
            None => 0,
            Some(raw) => raw.parse::<i64>().map_err(|_| KvError::NotAnInteger {
                key: key.to_string(),
            })?,
        };
        let next = current + delta;
        entries.insert(key.to_string(), next.to_string());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_del_round_trip() {
        let kv = MemoryKv::new();
        assert!(kv.get("missing").await.unwrap().is_none());

        kv.set("k", "v".to_string()).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));

        kv.del("k").await.unwrap();
        assert!(kv.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn incr_by_counts_from_zero() {
        let kv = MemoryKv::new();
        assert_eq!(kv.incr_by("count", 1).await.unwrap(), 1);
        assert_eq!(kv.incr_by("count", 1).await.unwrap(), 2);
        assert_eq!(kv.incr_by("count", -1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn incr_by_rejects_non_integers() {
        let kv = MemoryKv::new();
        kv.set("count", "not a number".to_string()).await.unwrap();
        let err = kv.incr_by("count", 1).await.unwrap_err();
        assert!(matches!(err, KvError::NotAnInteger { .. }));
    }
}
