//! Branching-narrative scene graph engine for SimuLife.
//!
//! This crate provides:
//! - A validated, read-only story graph of scenes and choices
//! - A deterministic transition resolver (prefix convention + explicit
//!   per-scene override tables)
//! - An append-only player journal
//! - Session lifecycle: fresh start, restore from snapshot, atomic choice
//!   resolution, restart
//! - A progress persistence gateway with in-memory and file-backed stores
//!
//! # Quick Start
//!
//! ```
//! use simulife_core::{HeadlessStory, story};
//!
//! let mut game = HeadlessStory::new(story::simulife());
//!
//! let step = game.choose("chicago").unwrap();
//! println!("{}", step.prompt);
//!
//! assert_eq!(game.journal().len(), 1);
//! ```

pub mod graph;
pub mod headless;
pub mod journal;
pub mod persist;
pub mod session;
pub mod story;
pub mod testing;

// Primary public API
pub use graph::{
    Choice, GraphError, ResolveError, SceneId, SceneNode, Speaker, StoryGraph, TransitionRule,
};
pub use headless::{HeadlessStory, StepResponse, TranscriptEntry};
pub use journal::Journal;
pub use persist::{
    FileProgressStore, MemoryProgressStore, PersistError, PersistedProgress, ProgressMetadata,
    ProgressStore, PROGRESS_VERSION,
};
pub use session::{
    RestoreError, ResumeOutcome, Selection, SessionState, StorySession,
};
pub use story::{mood_for, simulife, Mood};
