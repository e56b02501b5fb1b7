//! Testing utilities for the story engine.
//!
//! Provides small fixture graphs and assertion helpers used by the
//! integration suites. The fixtures are deliberately tiny so failures read
//! at a glance.

use crate::graph::{Choice, SceneNode, StoryGraph, TransitionRule};
use crate::session::{Selection, StorySession};
use std::sync::Arc;

/// A minimal three-scene graph:
///
/// ```text
/// intro --A--> branch_A --end--> ending_1
///   \----B--> branch_B
/// ```
///
/// `A` records a journal line, `B` does not; `branch_A` routes through an
/// explicit table; `branch_B` and `ending_1` are endings.
pub fn intro_graph() -> Arc<StoryGraph> {
    Arc::new(
        StoryGraph::builder(1, "intro")
            .episode("s1e1", "intro")
            .scene(
                SceneNode::new("intro", 0, "Two doors. Pick one.")
                    .with_choice(Choice::new("A", "The left door").with_journal("Chose A"))
                    .with_choice(Choice::new("B", "The right door"))
                    .with_transition(TransitionRule::prefixed("branch_")),
            )
            .scene(
                SceneNode::new("branch_A", 1, "A long hallway.")
                    .with_parent("intro")
                    .with_choice(Choice::new("end", "Walk to the end").with_journal("Kept walking"))
                    .with_transition(TransitionRule::explicit([("end", "ending_1")])),
            )
            .scene(SceneNode::new("branch_B", 1, "A brick wall. That's it.").with_parent("intro"))
            .scene(SceneNode::new("ending_1", 2, "Daylight.").with_parent("branch_A"))
            .build()
            .expect("intro fixture graph is well-formed"),
    )
}

/// A fresh session over [`intro_graph`].
pub fn sample_session() -> StorySession {
    StorySession::start(intro_graph(), Selection::none())
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the session is positioned on the given scene.
#[track_caller]
pub fn assert_scene(session: &StorySession, expected: &str) {
    assert_eq!(
        session.current_scene().as_str(),
        expected,
        "Expected session to be on scene `{expected}`, got `{}`",
        session.current_scene()
    );
}

/// Assert the journal holds exactly the given lines, in order.
#[track_caller]
pub fn assert_journal(session: &StorySession, expected: &[&str]) {
    let actual: Vec<&str> = session.journal().iter().collect();
    assert_eq!(
        actual, expected,
        "Journal mismatch: expected {expected:?}, got {actual:?}"
    );
}

/// Assert the session has reached an ending.
#[track_caller]
pub fn assert_ended(session: &StorySession) {
    assert!(
        session.is_ended(),
        "Expected session to be at an ending, but `{}` still has choices",
        session.current_scene()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_graph_builds_and_plays() {
        let mut session = sample_session();
        assert_scene(&session, "intro");

        session.choose("A").unwrap();
        assert_scene(&session, "branch_A");
        assert_journal(&session, &["Chose A"]);

        session.choose("end").unwrap();
        assert_ended(&session);
        assert_journal(&session, &["Chose A", "Kept walking"]);
    }

    #[test]
    fn fixture_branch_b_is_an_ending() {
        let mut session = sample_session();
        session.choose("B").unwrap();
        assert_ended(&session);
        assert_journal(&session, &[]);
    }
}
