//! The engine's progress gateway, implemented over the key-value store.
//!
//! Snapshots live under `progress:{instance}:{player}` as JSON strings,
//! exactly the shape the hosting platform's store expects. Semantics are
//! inherited from the store: last-writer-wins, no cross-session ordering.

use crate::kv::KvStore;
use async_trait::async_trait;
use simulife_core::persist::{PersistError, PersistedProgress, ProgressStore};
use std::sync::Arc;

/// Composite key for one player's progress in one story instance.
pub fn progress_key(instance: &str, player: &str) -> String {
    format!("progress:{instance}:{player}")
}

/// [`ProgressStore`] backed by a [`KvStore`].
pub struct KvProgressStore {
    kv: Arc<dyn KvStore>,
}

impl KvProgressStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl ProgressStore for KvProgressStore {
    async fn save(
        &self,
        instance: &str,
        player: &str,
        progress: &PersistedProgress,
    ) -> Result<(), PersistError> {
        let value = serde_json::to_string(progress)?;
        self.kv
            .set(&progress_key(instance, player), value)
            .await
            .map_err(|err| PersistError::Backend(err.to_string()))
    }

    async fn load(
        &self,
        instance: &str,
        player: &str,
    ) -> Result<Option<PersistedProgress>, PersistError> {
        let raw = self
            .kv
            .get(&progress_key(instance, player))
            .await
            .map_err(|err| PersistError::Backend(err.to_string()))?;

        match raw {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        }
    }

    async fn clear(&self, instance: &str, player: &str) -> Result<(), PersistError> {
        self.kv
            .del(&progress_key(instance, player))
            .await
            .map_err(|err| PersistError::Backend(err.to_string()))
    }
}
