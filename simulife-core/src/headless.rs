//! Headless story interface for programmatic use.
//!
//! A simplified wrapper around [`StorySession`] for running the story
//! without a client. Designed for:
//! - Automated testing against the real story content
//! - Script-driven playthroughs
//! - Agents exploring the graph
//!
//! # Example
//!
//! ```
//! use simulife_core::headless::HeadlessStory;
//! use simulife_core::story;
//!
//! let mut game = HeadlessStory::new(story::simulife());
//! let step = game.choose("chicago").unwrap();
//! assert!(step.prompt.contains("newsroom"));
//! assert_eq!(game.journal().len(), 1);
//! ```

use crate::graph::{ResolveError, SceneId, Speaker, StoryGraph};
use crate::journal::Journal;
use crate::persist::{PersistError, ProgressStore};
use crate::session::{ResumeOutcome, Selection, StorySession};
use std::sync::Arc;

/// One step of a scripted playthrough.
#[derive(Debug, Clone)]
pub struct StepResponse {
    /// Where the choice landed.
    pub scene_id: SceneId,

    /// Narrative text of the new scene.
    pub prompt: String,

    /// Speaking character of the new scene, if any.
    pub speaker: Option<Speaker>,

    /// Outcome tokens available from the new scene; empty at an ending.
    pub outcomes: Vec<String>,

    /// Whether the playthrough has reached an ending.
    pub ended: bool,
}

/// An entry in the playthrough transcript.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// The scene the choice was made on.
    pub scene: SceneId,

    /// The outcome taken.
    pub outcome: String,

    /// Journal line the choice recorded, if any.
    pub journal_entry: Option<String>,

    /// Turn number.
    pub turn: usize,
}

/// A story that can be driven programmatically.
pub struct HeadlessStory {
    session: StorySession,
    transcript: Vec<TranscriptEntry>,
}

impl HeadlessStory {
    /// Start a fresh playthrough at the graph's default entry.
    pub fn new(graph: Arc<StoryGraph>) -> Self {
        Self::with_selection(graph, Selection::none())
    }

    /// Start a fresh playthrough inside a branch selection.
    pub fn with_selection(graph: Arc<StoryGraph>, selection: Selection) -> Self {
        Self {
            session: StorySession::start(graph, selection),
            transcript: Vec::new(),
        }
    }

    /// Resume from a store, starting fresh when nothing usable is saved.
    /// A load failure is treated like a missing snapshot: the player starts
    /// fresh rather than being blocked at the door.
    pub async fn resume(
        graph: Arc<StoryGraph>,
        store: &dyn ProgressStore,
        instance: &str,
        player: &str,
        selection: Selection,
    ) -> (Self, ResumeOutcome) {
        let progress = match store.load(instance, player).await {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!(error = %err, "progress load failed; starting fresh");
                None
            }
        };
        let (session, outcome) = StorySession::resume_or_start(graph, progress, selection);
        (
            Self {
                session,
                transcript: Vec::new(),
            },
            outcome,
        )
    }

    /// Take a choice and advance the story.
    pub fn choose(&mut self, outcome: &str) -> Result<StepResponse, ResolveError> {
        let from = self.session.current_scene().clone();
        let journal_before = self.session.journal().len();

        let scene = self.session.choose(outcome)?;

        let response = StepResponse {
            scene_id: scene.id.clone(),
            prompt: scene.prompt.clone(),
            speaker: scene.speaker.clone(),
            outcomes: scene.choices.iter().map(|c| c.outcome.clone()).collect(),
            ended: scene.is_terminal(),
        };

        let journal_entry = if self.session.journal().len() > journal_before {
            self.session.journal().last().map(str::to_string)
        } else {
            None
        };

        self.transcript.push(TranscriptEntry {
            scene: from,
            outcome: outcome.to_string(),
            journal_entry,
            turn: self.transcript.len() + 1,
        });

        Ok(response)
    }

    /// Persist the current position through a store.
    ///
    /// A save failure degrades to in-memory-only play: the session remains
    /// valid, the player just won't resume later.
    pub async fn save(
        &self,
        store: &dyn ProgressStore,
        instance: &str,
        player: &str,
    ) -> Result<(), PersistError> {
        store.save(instance, player, &self.session.snapshot()).await
    }

    /// Restart the story from the entry scene.
    pub fn restart(&mut self) {
        self.session.reset();
        self.transcript.clear();
    }

    // ========================================================================
    // State queries
    // ========================================================================

    pub fn current_scene(&self) -> &SceneId {
        self.session.current_scene()
    }

    pub fn prompt(&self) -> &str {
        &self.session.scene().prompt
    }

    pub fn journal(&self) -> &Journal {
        self.session.journal()
    }

    pub fn is_ended(&self) -> bool {
        self.session.is_ended()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn turn_count(&self) -> usize {
        self.transcript.len()
    }

    /// The underlying session for advanced use.
    pub fn session(&self) -> &StorySession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StorySession {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story;

    #[test]
    fn playthrough_reaches_an_ending() {
        let mut game = HeadlessStory::new(story::simulife());

        game.choose("minnesota").unwrap();
        game.choose("leave").unwrap();
        let last = game.choose("home").unwrap();

        assert!(last.ended);
        assert!(game.is_ended());
        assert_eq!(last.scene_id.as_str(), "ending_fresh_start");
        assert_eq!(game.turn_count(), 3);
        assert_eq!(game.journal().len(), 3);
    }

    #[test]
    fn transcript_records_journal_lines() {
        let mut game = HeadlessStory::new(story::simulife());
        game.choose("chicago").unwrap();

        let entry = &game.transcript()[0];
        assert_eq!(entry.scene.as_str(), "scene1");
        assert_eq!(entry.outcome, "chicago");
        assert!(entry.journal_entry.as_deref().unwrap().contains("32k"));
        assert_eq!(entry.turn, 1);
    }

    #[test]
    fn restart_clears_transcript_and_position() {
        let mut game = HeadlessStory::new(story::simulife());
        game.choose("connecticut").unwrap();
        game.restart();

        assert_eq!(game.current_scene().as_str(), "scene1");
        assert!(game.journal().is_empty());
        assert!(game.transcript().is_empty());
    }

    #[tokio::test]
    async fn save_and_resume_through_a_store() {
        use crate::persist::MemoryProgressStore;
        use crate::session::ResumeOutcome;

        let store = MemoryProgressStore::new();
        let graph = story::simulife();

        let mut game = HeadlessStory::new(graph.clone());
        game.choose("chicago").unwrap();
        game.save(&store, "post1", "cassey").await.unwrap();

        let (resumed, outcome) =
            HeadlessStory::resume(graph, &store, "post1", "cassey", Selection::none()).await;
        assert_eq!(outcome, ResumeOutcome::Restored);
        assert_eq!(resumed.current_scene().as_str(), "scene2_chicago");
        assert_eq!(resumed.journal().len(), 1);
    }

    #[tokio::test]
    async fn resume_with_nothing_saved_starts_fresh() {
        use crate::persist::MemoryProgressStore;
        use crate::session::ResumeOutcome;

        let store = MemoryProgressStore::new();
        let (game, outcome) = HeadlessStory::resume(
            story::simulife(),
            &store,
            "post1",
            "nobody",
            Selection::none(),
        )
        .await;

        assert_eq!(outcome, ResumeOutcome::StartedFresh);
        assert_eq!(game.current_scene().as_str(), "scene1");
    }
}
