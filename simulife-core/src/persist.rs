//! Progress persistence for resuming a player's traversal.
//!
//! Snapshots are versioned both by save format and by story-graph content
//! version, carry a timestamp and peekable metadata, and round-trip through
//! JSON. The [`ProgressStore`] trait is the gateway the engine consumes;
//! the real durable store is an external collaborator behind it. Semantics
//! are last-writer-wins: two concurrent sessions of the same player will
//! silently overwrite each other, and that is a documented limitation of
//! the gateway, not something the engine locks around.

use crate::graph::SceneId;
use crate::session::SessionState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Current snapshot format version.
pub const PROGRESS_VERSION: u32 = 1;

/// A persisted snapshot of one player's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProgress {
    /// Snapshot format version for compatibility checking.
    pub version: u32,

    /// Story graph content version the snapshot was taken against.
    pub graph_version: u32,

    /// When the snapshot was taken (unix seconds).
    pub saved_at: String,

    /// The complete session state.
    pub state: SessionState,

    /// Metadata about the snapshot.
    pub metadata: ProgressMetadata,
}

/// Quick-access metadata, readable without deserializing the full state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetadata {
    /// The player's position.
    pub current_scene: SceneId,

    /// Number of journal lines so far.
    pub journal_entries: usize,

    /// Active episode key, if a branch was chosen.
    pub episode: Option<String>,

    /// When the snapshot was taken (duplicated from parent for peek access).
    #[serde(default)]
    pub saved_at: String,
}

impl PersistedProgress {
    /// Snapshot a session state against a graph content version.
    pub fn new(graph_version: u32, state: SessionState) -> Self {
        let saved_at = timestamp();
        let metadata = ProgressMetadata {
            current_scene: state.current_scene.clone(),
            journal_entries: state.journal.len(),
            episode: state.selection.episode.clone(),
            saved_at: saved_at.clone(),
        };

        Self {
            version: PROGRESS_VERSION,
            graph_version,
            saved_at,
            state,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let progress: Self = serde_json::from_str(&content)?;

        if progress.version != PROGRESS_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: PROGRESS_VERSION,
                found: progress.version,
            });
        }

        Ok(progress)
    }

    /// Read a save file's metadata without loading the full state.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<ProgressMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        // Parse just enough to get metadata
        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: ProgressMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != PROGRESS_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: PROGRESS_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// The Progress Persistence Gateway.
///
/// `save` is last-writer-wins; `load` of a never-saved key returns
/// `Ok(None)`, which the session lifecycle treats as "start fresh". No
/// ordering or atomicity is guaranteed across concurrent sessions.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Persist a snapshot under `(story instance, player)`.
    async fn save(
        &self,
        instance: &str,
        player: &str,
        progress: &PersistedProgress,
    ) -> Result<(), PersistError>;

    /// Load the snapshot for `(story instance, player)`, if any.
    async fn load(
        &self,
        instance: &str,
        player: &str,
    ) -> Result<Option<PersistedProgress>, PersistError>;

    /// Delete the snapshot for `(story instance, player)`.
    async fn clear(&self, instance: &str, player: &str) -> Result<(), PersistError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory [`ProgressStore`] for tests and local runs.
#[derive(Default)]
pub struct MemoryProgressStore {
    entries: RwLock<HashMap<(String, String), PersistedProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn save(
        &self,
        instance: &str,
        player: &str,
        progress: &PersistedProgress,
    ) -> Result<(), PersistError> {
        let mut entries = self.entries.write().await;
        entries.insert((instance.to_string(), player.to_string()), progress.clone());
        Ok(())
    }

    async fn load(
        &self,
        instance: &str,
        player: &str,
    ) -> Result<Option<PersistedProgress>, PersistError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(instance.to_string(), player.to_string()))
            .cloned())
    }

    async fn clear(&self, instance: &str, player: &str) -> Result<(), PersistError> {
        let mut entries = self.entries.write().await;
        entries.remove(&(instance.to_string(), player.to_string()));
        Ok(())
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// File-backed [`ProgressStore`]: one pretty-printed JSON file per
/// `(story instance, player)` under a root directory.
pub struct FileProgressStore {
    root: PathBuf,
}

impl FileProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The save file path for a key pair.
    pub fn save_path(&self, instance: &str, player: &str) -> PathBuf {
        self.root
            .join(sanitize(instance))
            .join(format!("{}.json", sanitize(player)))
    }
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    async fn save(
        &self,
        instance: &str,
        player: &str,
        progress: &PersistedProgress,
    ) -> Result<(), PersistError> {
        let path = self.save_path(instance, player);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        progress.save_json(&path).await
    }

    async fn load(
        &self,
        instance: &str,
        player: &str,
    ) -> Result<Option<PersistedProgress>, PersistError> {
        let path = self.save_path(instance, player);
        match PersistedProgress::load_json(&path).await {
            Ok(progress) => Ok(Some(progress)),
            Err(PersistError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn clear(&self, instance: &str, player: &str) -> Result<(), PersistError> {
        let path = self.save_path(instance, player);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Information about one save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    /// Path to the save file.
    pub path: String,

    /// Save metadata.
    pub metadata: ProgressMetadata,
}

/// List all save files for a story instance, sorted by path.
pub async fn list_saves(
    store: &FileProgressStore,
    instance: &str,
) -> Result<Vec<SaveInfo>, PersistError> {
    let dir = store.root.join(sanitize(instance));
    let mut saves = Vec::new();

    if !dir.exists() {
        return Ok(saves);
    }

    let mut entries = fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(metadata) = PersistedProgress::peek_metadata(&path).await {
                saves.push(SaveInfo {
                    path: path.to_string_lossy().to_string(),
                    metadata,
                });
            }
        }
    }

    saves.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(saves)
}

/// Replace anything non-alphanumeric so keys are safe as file names.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Get current timestamp as unix seconds.
fn timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}
