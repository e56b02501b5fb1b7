//! Player session lifecycle over a story graph.
//!
//! A [`StorySession`] owns the only mutable record in the engine: the
//! player's position, journal, and branch selection. Every mutation happens
//! through [`StorySession::choose`] (resolve, journal append, and position
//! update as one atomic step on the in-memory state) or through the
//! explicit lifecycle operations `start`, `restore`, and `reset`.

use crate::graph::{ResolveError, SceneId, SceneNode, StoryGraph};
use crate::journal::Journal;
use crate::persist::PersistedProgress;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Which story branch/season/episode the player is inside.
///
/// Pure namespacing: `episode` selects a named entry point in the graph;
/// `community` and `season` are labels carried for the selection chrome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub community: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

impl Selection {
    /// No branch chosen.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn episode(episode: impl Into<String>) -> Self {
        Self {
            community: None,
            season: None,
            episode: Some(episode.into()),
        }
    }

    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = Some(community.into());
        self
    }

    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn is_none(&self) -> bool {
        self.community.is_none() && self.season.is_none() && self.episode.is_none()
    }
}

/// The complete mutable state of one player session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: Uuid,

    /// The player's position; always references an existing scene.
    pub current_scene: SceneId,

    pub journal: Journal,

    pub selection: Selection,
}

impl SessionState {
    fn fresh(entry: SceneId, selection: Selection) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            current_scene: entry,
            journal: Journal::new(),
            selection,
        }
    }
}

/// Why a snapshot could not be restored.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("snapshot was taken against story graph version {snapshot}, current is {current}")]
    GraphVersionMismatch { snapshot: u32, current: u32 },

    #[error("snapshot position `{0}` no longer exists in the story graph")]
    MissingScene(SceneId),
}

/// How [`StorySession::resume_or_start`] obtained its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// No snapshot existed; started at the entry scene.
    StartedFresh,

    /// The snapshot was valid and the session resumed from it verbatim.
    Restored,

    /// A snapshot existed but no longer matched the graph; it was discarded
    /// and the session started fresh.
    DiscardedStale,
}

/// One player's live traversal of the story graph.
#[derive(Debug)]
pub struct StorySession {
    graph: Arc<StoryGraph>,
    state: SessionState,
}

impl StorySession {
    /// Start a fresh session at the selection's entry scene.
    pub fn start(graph: Arc<StoryGraph>, selection: Selection) -> Self {
        let entry = graph.entry_for(selection.episode.as_deref()).clone();
        Self {
            graph,
            state: SessionState::fresh(entry, selection),
        }
    }

    /// Restore a session verbatim from a persisted snapshot.
    ///
    /// The snapshot must have been taken against the same graph version and
    /// its position must still exist; otherwise the caller decides what to
    /// do (usually fall back to [`StorySession::start`]).
    pub fn restore(
        graph: Arc<StoryGraph>,
        progress: PersistedProgress,
    ) -> Result<Self, RestoreError> {
        if progress.graph_version != graph.version() {
            return Err(RestoreError::GraphVersionMismatch {
                snapshot: progress.graph_version,
                current: graph.version(),
            });
        }
        if !graph.contains(&progress.state.current_scene) {
            return Err(RestoreError::MissingScene(progress.state.current_scene));
        }
        Ok(Self {
            graph,
            state: progress.state,
        })
    }

    /// Resume from a snapshot when one exists and still fits the graph,
    /// otherwise start fresh. `None` and stale snapshots both land on a
    /// fresh session; the outcome says which path was taken so callers can
    /// message the player.
    pub fn resume_or_start(
        graph: Arc<StoryGraph>,
        progress: Option<PersistedProgress>,
        selection: Selection,
    ) -> (Self, ResumeOutcome) {
        match progress {
            None => (Self::start(graph, selection), ResumeOutcome::StartedFresh),
            Some(progress) => match Self::restore(graph.clone(), progress) {
                Ok(session) => (session, ResumeOutcome::Restored),
                Err(err) => {
                    tracing::warn!(error = %err, "discarding stale progress snapshot");
                    (Self::start(graph, selection), ResumeOutcome::DiscardedStale)
                }
            },
        }
    }

    /// Resolve a choice and advance the session.
    ///
    /// On success the chosen choice's journal line (if any) is appended and
    /// the position moves to the successor scene; on any error the state is
    /// left exactly as it was.
    pub fn choose(&mut self, outcome: &str) -> Result<&SceneNode, ResolveError> {
        let next = self.graph.resolve(&self.state.current_scene, outcome)?;

        // Resolution succeeded, so the choice exists on the current scene.
        // Journal and position are updated together on the in-memory state;
        // there is no intermediate observable point.
        if let Some(entry) = self
            .scene()
            .choice(outcome)
            .and_then(|c| c.journal_entry.clone())
        {
            self.state.journal.append(entry);
        }

        tracing::debug!(
            from = %self.state.current_scene,
            to = %next,
            outcome,
            "scene transition"
        );
        self.state.current_scene = next;
        Ok(self.scene())
    }

    /// Restart: clear the journal, return to the default entry scene, and
    /// leave the current story branch (selection cleared).
    pub fn reset(&mut self) {
        self.state.journal.reset();
        self.state.selection = Selection::none();
        self.state.current_scene = self.graph.entry().clone();
    }

    /// The scene the player is on.
    pub fn scene(&self) -> &SceneNode {
        // current_scene is validated at construction and only replaced by
        // ids the resolver has already checked.
        self.graph
            .get(&self.state.current_scene)
            .expect("session position references a defined scene")
    }

    pub fn current_scene(&self) -> &SceneId {
        &self.state.current_scene
    }

    pub fn journal(&self) -> &Journal {
        &self.state.journal
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn session_id(&self) -> Uuid {
        self.state.session_id
    }

    /// Whether the player has reached an ending.
    pub fn is_ended(&self) -> bool {
        self.scene().is_terminal()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn graph(&self) -> &Arc<StoryGraph> {
        &self.graph
    }

    /// Snapshot the session for persistence.
    pub fn snapshot(&self) -> PersistedProgress {
        PersistedProgress::new(self.graph.version(), self.state.clone())
    }
}
