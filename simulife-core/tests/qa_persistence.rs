//! QA tests for progress save/restore.
//!
//! These verify that a player's position round-trips through the gateway
//! and that stale snapshots fall back to a fresh start instead of wedging
//! the session. Run with: `cargo test -p simulife-core --test qa_persistence`

use simulife_core::persist::{
    FileProgressStore, MemoryProgressStore, PersistedProgress, ProgressStore,
};
use simulife_core::session::{ResumeOutcome, Selection, StorySession};
use simulife_core::story;
use simulife_core::SceneId;
use tempfile::TempDir;

const INSTANCE: &str = "post_t3_abc123";
const PLAYER: &str = "u_cassey_fan";

fn played_session() -> StorySession {
    let mut session = StorySession::start(
        story::simulife(),
        Selection::episode(story::EPISODE_PILOT).with_community("r/simulife"),
    );
    session.choose("chicago").unwrap();
    session.choose("grad").unwrap();
    session
}

// =============================================================================
// TEST 1: Round trip is deep-equal
// =============================================================================

#[tokio::test]
async fn memory_round_trip_is_deep_equal() {
    let store = MemoryProgressStore::new();
    let session = played_session();

    store
        .save(INSTANCE, PLAYER, &session.snapshot())
        .await
        .unwrap();
    let loaded = store.load(INSTANCE, PLAYER).await.unwrap().unwrap();

    assert_eq!(&loaded.state, session.state());

    let restored = StorySession::restore(story::simulife(), loaded).unwrap();
    assert_eq!(restored.state(), session.state());
}

#[tokio::test]
async fn file_round_trip_is_deep_equal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileProgressStore::new(temp_dir.path());
    let session = played_session();

    store
        .save(INSTANCE, PLAYER, &session.snapshot())
        .await
        .unwrap();
    let loaded = store.load(INSTANCE, PLAYER).await.unwrap().unwrap();

    assert_eq!(&loaded.state, session.state());
}

// =============================================================================
// TEST 2: Clear, and load of a never-saved player
// =============================================================================

#[tokio::test]
async fn clear_then_load_is_not_found() {
    let store = MemoryProgressStore::new();
    let session = played_session();

    store
        .save(INSTANCE, PLAYER, &session.snapshot())
        .await
        .unwrap();
    store.clear(INSTANCE, PLAYER).await.unwrap();

    assert!(store.load(INSTANCE, PLAYER).await.unwrap().is_none());
}

#[tokio::test]
async fn never_saved_player_starts_fresh() {
    let store = MemoryProgressStore::new();
    let progress = store.load(INSTANCE, "u_first_timer").await.unwrap();

    let (session, outcome) =
        StorySession::resume_or_start(story::simulife(), progress, Selection::none());
    assert_eq!(outcome, ResumeOutcome::StartedFresh);
    assert_eq!(session.current_scene(), story::simulife().entry());
}

// =============================================================================
// TEST 3: Stale snapshots fall back to a fresh start
// =============================================================================

#[tokio::test]
async fn old_graph_version_is_discarded() {
    let session = played_session();
    let mut snapshot = session.snapshot();
    snapshot.graph_version = story::GRAPH_VERSION + 1;

    let (fresh, outcome) =
        StorySession::resume_or_start(story::simulife(), Some(snapshot), Selection::none());
    assert_eq!(outcome, ResumeOutcome::DiscardedStale);
    assert_eq!(fresh.current_scene(), story::simulife().entry());
    assert!(fresh.journal().is_empty());
}

#[tokio::test]
async fn renamed_scene_is_discarded() {
    let session = played_session();
    let mut snapshot = session.snapshot();
    snapshot.state.current_scene = SceneId::new("scene2_detroit");

    let (fresh, outcome) =
        StorySession::resume_or_start(story::simulife(), Some(snapshot), Selection::none());
    assert_eq!(outcome, ResumeOutcome::DiscardedStale);
    assert_eq!(fresh.current_scene(), story::simulife().entry());
}

// =============================================================================
// TEST 4: Restored sessions keep playing
// =============================================================================

#[tokio::test]
async fn restored_session_continues_the_story() {
    let store = MemoryProgressStore::new();
    let session = played_session();
    store
        .save(INSTANCE, PLAYER, &session.snapshot())
        .await
        .unwrap();

    let progress = store.load(INSTANCE, PLAYER).await.unwrap();
    let (mut restored, outcome) =
        StorySession::resume_or_start(story::simulife(), progress, Selection::none());
    assert_eq!(outcome, ResumeOutcome::Restored);

    // scene3_chicago_grad: both outcomes go through the explicit table.
    let ending = restored.choose("bootcamp").unwrap();
    assert_eq!(ending.id.as_str(), "ending_code_career");
    assert!(restored.is_ended());
}

// =============================================================================
// TEST 5: Metadata peek matches the snapshot
// =============================================================================

#[tokio::test]
async fn peeked_metadata_matches_full_snapshot() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileProgressStore::new(temp_dir.path());
    let session = played_session();
    let snapshot = session.snapshot();

    store.save(INSTANCE, PLAYER, &snapshot).await.unwrap();

    let metadata = PersistedProgress::peek_metadata(store.save_path(INSTANCE, PLAYER))
        .await
        .unwrap();
    assert_eq!(metadata.current_scene, snapshot.metadata.current_scene);
    assert_eq!(metadata.journal_entries, session.journal().len());
    assert_eq!(metadata.episode.as_deref(), Some(story::EPISODE_PILOT));
}
