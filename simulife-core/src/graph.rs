//! Story graph types and the transition resolver.
//!
//! The graph is an arena of [`SceneNode`]s keyed by [`SceneId`], built once
//! through [`StoryGraph::builder`] and validated before use: outcomes are
//! unique per scene, every choice resolves to a defined scene, terminal
//! scenes carry no transition rule, and depth strictly increases along every
//! edge (which makes the graph acyclic by construction). A validation
//! failure is a content-authoring defect and is reported loudly instead of
//! being papered over with a default scene.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for scenes.
///
/// Authored content follows a depth-prefix convention (`scene1`,
/// `scene2_minnesota`, ...), but nothing is inferred from the string: depth
/// and parent linkage live on the node itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SceneId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Scene content
// ============================================================================

/// A character speaking in a scene. Purely descriptive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Character name.
    pub name: String,

    /// One-line bio shown under the name.
    pub bio: String,

    /// The character's reaction line for this scene.
    pub reaction: String,
}

impl Speaker {
    pub fn new(
        name: impl Into<String>,
        bio: impl Into<String>,
        reaction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bio: bio.into(),
            reaction: reaction.into(),
        }
    }
}

/// One selectable choice on a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Token identifying the branch taken; unique within the parent scene.
    pub outcome: String,

    /// Display text.
    pub label: String,

    /// Journal line appended when this choice is taken, if any.
    pub journal_entry: Option<String>,
}

impl Choice {
    pub fn new(outcome: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            label: label.into(),
            journal_entry: None,
        }
    }

    /// Attach the journal line recorded when this choice is taken.
    pub fn with_journal(mut self, entry: impl Into<String>) -> Self {
        self.journal_entry = Some(entry.into());
        self
    }
}

/// How a scene's choices map to successor scenes.
///
/// Most of the story uses the prefix convention; a few sub-branches were
/// authored with inconsistent names and carry an explicit table instead.
/// The variant is chosen per scene, so an explicit table always wins where
/// one is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionRule {
    /// Next scene id is `prefix + outcome`.
    Prefixed { prefix: String },

    /// Authored override: outcome token to successor id.
    Explicit(BTreeMap<String, SceneId>),
}

impl TransitionRule {
    /// Build an explicit table from `(outcome, scene id)` pairs.
    pub fn explicit<I, O, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (O, S)>,
        O: Into<String>,
        S: Into<SceneId>,
    {
        Self::Explicit(
            entries
                .into_iter()
                .map(|(outcome, id)| (outcome.into(), id.into()))
                .collect(),
        )
    }

    /// Build the prefix rule.
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self::Prefixed {
            prefix: prefix.into(),
        }
    }

    /// Successor id for an outcome, or `None` when an explicit table has no
    /// entry for it (a validation error in authored content).
    fn successor(&self, outcome: &str) -> Option<SceneId> {
        match self {
            Self::Prefixed { prefix } => Some(SceneId::new(format!("{prefix}{outcome}"))),
            Self::Explicit(table) => table.get(outcome).cloned(),
        }
    }
}

/// One narrative beat: prompt, optional speaker, and the player's choices.
///
/// A terminal scene (an ending) has no choices and no transition rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: SceneId,

    /// Distance from an entry scene. Strictly increases along every edge.
    pub depth: u8,

    /// The scene this one was authored under, if any. Converging scenes
    /// keep the branch they were first written for.
    pub parent: Option<SceneId>,

    /// Narrative text shown to the player.
    pub prompt: String,

    /// Speaking character, if the scene has one.
    pub speaker: Option<Speaker>,

    /// Ordered choices; empty for endings.
    pub choices: Vec<Choice>,

    /// Successor rule; `None` only on terminal scenes.
    pub transition: Option<TransitionRule>,
}

impl SceneNode {
    pub fn new(id: impl Into<SceneId>, depth: u8, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            depth,
            parent: None,
            prompt: prompt.into(),
            speaker: None,
            choices: Vec::new(),
            transition: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<SceneId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_transition(mut self, rule: TransitionRule) -> Self {
        self.transition = Some(rule);
        self
    }

    /// An ending: no further choices are possible from here.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    /// Find a choice by its outcome token.
    pub fn choice(&self, outcome: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.outcome == outcome)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Content-authoring defects caught when a graph is built.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("scene `{0}` is not defined in the story graph")]
    NotFound(SceneId),

    #[error("entry scene `{0}` is not defined")]
    MissingEntry(SceneId),

    #[error("episode `{episode}` names entry scene `{scene}`, which is not defined")]
    MissingEpisodeEntry { episode: String, scene: SceneId },

    #[error("scene `{scene}` defines outcome `{outcome}` more than once")]
    DuplicateOutcome { scene: SceneId, outcome: String },

    #[error("scene `{scene}` has choices but no transition rule")]
    MissingTransition { scene: SceneId },

    #[error("terminal scene `{scene}` carries a transition rule")]
    TerminalWithTransition { scene: SceneId },

    #[error("scene `{scene}` outcome `{outcome}` has no entry in its explicit table")]
    IncompleteTable { scene: SceneId, outcome: String },

    #[error("scene `{scene}` outcome `{outcome}` resolves to undefined scene `{target}`")]
    DanglingChoice {
        scene: SceneId,
        outcome: String,
        target: SceneId,
    },

    #[error(
        "scene `{scene}` (depth {depth}) resolves to `{target}` at depth {target_depth}; \
         successors must sit one level deeper"
    )]
    DepthMismatch {
        scene: SceneId,
        depth: u8,
        target: SceneId,
        target_depth: u8,
    },

    #[error("scene `{scene}` names parent `{parent}`, which is not defined")]
    MissingParent { scene: SceneId, parent: SceneId },

    #[error("scene `{scene}` (depth {depth}) names parent `{parent}` at depth {parent_depth}")]
    ParentDepthMismatch {
        scene: SceneId,
        depth: u8,
        parent: SceneId,
        parent_depth: u8,
    },
}

/// Failures while resolving a transition at play time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The outcome is not among the current scene's choices. Recoverable;
    /// the caller re-prompts and session state is untouched.
    #[error("`{outcome}` is not a valid choice for scene `{scene}`")]
    InvalidChoice { scene: SceneId, outcome: String },

    /// A transition was attempted from an ending. Caller bug.
    #[error("scene `{scene}` is an ending; no further choices are possible")]
    TerminalState { scene: SceneId },

    /// The resolver produced an id with no matching scene. Fatal for the
    /// session; the offending pair is logged for content-authoring fixes.
    #[error("scene `{scene}` with outcome `{outcome}` resolved to undefined scene `{target}`")]
    GraphIntegrity {
        scene: SceneId,
        outcome: String,
        target: SceneId,
    },
}

// ============================================================================
// Story graph
// ============================================================================

/// The canonical, read-only set of scenes for one story, with a default
/// entry point and named episode entry points acting as selection
/// namespaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryGraph {
    version: u32,
    entry: SceneId,
    episodes: BTreeMap<String, SceneId>,
    scenes: HashMap<SceneId, SceneNode>,
}

impl StoryGraph {
    /// Start building a graph with the given content version and default
    /// entry scene.
    pub fn builder(version: u32, entry: impl Into<SceneId>) -> StoryGraphBuilder {
        StoryGraphBuilder {
            version,
            entry: entry.into(),
            episodes: BTreeMap::new(),
            scenes: HashMap::new(),
        }
    }

    /// Content version, stamped into persisted snapshots.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The default entry scene.
    pub fn entry(&self) -> &SceneId {
        &self.entry
    }

    /// Entry scene for a named episode, falling back to the default entry
    /// for unknown or absent episode keys.
    pub fn entry_for(&self, episode: Option<&str>) -> &SceneId {
        episode
            .and_then(|key| self.episodes.get(key))
            .unwrap_or(&self.entry)
    }

    /// Named episode entry points.
    pub fn episodes(&self) -> impl Iterator<Item = (&str, &SceneId)> {
        self.episodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn get(&self, id: &SceneId) -> Option<&SceneNode> {
        self.scenes.get(id)
    }

    /// Look up a scene, failing loudly when it does not exist.
    pub fn lookup(&self, id: &SceneId) -> Result<&SceneNode, GraphError> {
        self.scenes
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn scenes(&self) -> impl Iterator<Item = &SceneNode> {
        self.scenes.values()
    }

    /// Compute the successor of `current` for `outcome`.
    ///
    /// Pure with respect to session state; the caller applies the result.
    pub fn resolve(&self, current: &SceneId, outcome: &str) -> Result<SceneId, ResolveError> {
        let node = match self.get(current) {
            Some(node) => node,
            None => {
                // Only reachable with a scene id from outside this graph.
                tracing::error!(scene = %current, outcome, "resolve called with undefined scene");
                return Err(ResolveError::GraphIntegrity {
                    scene: current.clone(),
                    outcome: outcome.to_string(),
                    target: current.clone(),
                });
            }
        };

        if node.is_terminal() {
            tracing::error!(scene = %current, outcome, "transition attempted from an ending");
            return Err(ResolveError::TerminalState {
                scene: current.clone(),
            });
        }

        if node.choice(outcome).is_none() {
            return Err(ResolveError::InvalidChoice {
                scene: current.clone(),
                outcome: outcome.to_string(),
            });
        }

        // Validation guarantees a rule on every non-terminal scene and a
        // table entry for every outcome; going through GraphIntegrity keeps
        // hand-built graphs loud instead of panicking.
        let target = node
            .transition
            .as_ref()
            .and_then(|rule| rule.successor(outcome))
            .ok_or_else(|| ResolveError::GraphIntegrity {
                scene: current.clone(),
                outcome: outcome.to_string(),
                target: current.clone(),
            })?;

        if !self.contains(&target) {
            tracing::error!(
                scene = %current,
                outcome,
                target = %target,
                "choice resolved to an undefined scene"
            );
            return Err(ResolveError::GraphIntegrity {
                scene: current.clone(),
                outcome: outcome.to_string(),
                target,
            });
        }

        Ok(target)
    }

    /// Scenes not reachable from any entry point. Empty for well-authored
    /// content; exposed so tests can assert it.
    pub fn unreachable_scenes(&self) -> Vec<&SceneId> {
        let mut seen: HashSet<&SceneId> = HashSet::new();
        let mut stack: Vec<&SceneId> = Vec::new();

        stack.push(&self.entry);
        stack.extend(self.episodes.values());

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.get(id) {
                for choice in &node.choices {
                    if let Some(rule) = &node.transition {
                        if let Some(target) = rule.successor(&choice.outcome) {
                            if let Some((key, _)) = self.scenes.get_key_value(&target) {
                                stack.push(key);
                            }
                        }
                    }
                }
            }
        }

        let mut missing: Vec<&SceneId> = self
            .scenes
            .keys()
            .filter(|id| !seen.contains(*id))
            .collect();
        missing.sort();
        missing
    }

    fn validate(&self) -> Result<(), GraphError> {
        if !self.contains(&self.entry) {
            return Err(GraphError::MissingEntry(self.entry.clone()));
        }

        for (episode, entry) in &self.episodes {
            if !self.contains(entry) {
                return Err(GraphError::MissingEpisodeEntry {
                    episode: episode.clone(),
                    scene: entry.clone(),
                });
            }
        }

        for node in self.scenes.values() {
            let mut outcomes = HashSet::new();
            for choice in &node.choices {
                if !outcomes.insert(choice.outcome.as_str()) {
                    return Err(GraphError::DuplicateOutcome {
                        scene: node.id.clone(),
                        outcome: choice.outcome.clone(),
                    });
                }
            }

            match (&node.transition, node.is_terminal()) {
                (None, false) => {
                    return Err(GraphError::MissingTransition {
                        scene: node.id.clone(),
                    });
                }
                (Some(_), true) => {
                    return Err(GraphError::TerminalWithTransition {
                        scene: node.id.clone(),
                    });
                }
                _ => {}
            }

            if let Some(rule) = &node.transition {
                for choice in &node.choices {
                    let target = rule.successor(&choice.outcome).ok_or_else(|| {
                        GraphError::IncompleteTable {
                            scene: node.id.clone(),
                            outcome: choice.outcome.clone(),
                        }
                    })?;

                    let successor =
                        self.get(&target)
                            .ok_or_else(|| GraphError::DanglingChoice {
                                scene: node.id.clone(),
                                outcome: choice.outcome.clone(),
                                target: target.clone(),
                            })?;

                    // Depth strictly increases along every edge, so the
                    // graph cannot contain a cycle.
                    if successor.depth != node.depth + 1 {
                        return Err(GraphError::DepthMismatch {
                            scene: node.id.clone(),
                            depth: node.depth,
                            target: target.clone(),
                            target_depth: successor.depth,
                        });
                    }
                }
            }

            if let Some(parent) = &node.parent {
                let parent_node =
                    self.get(parent)
                        .ok_or_else(|| GraphError::MissingParent {
                            scene: node.id.clone(),
                            parent: parent.clone(),
                        })?;
                if parent_node.depth + 1 != node.depth {
                    return Err(GraphError::ParentDepthMismatch {
                        scene: node.id.clone(),
                        depth: node.depth,
                        parent: parent.clone(),
                        parent_depth: parent_node.depth,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Builder for [`StoryGraph`]; `build` runs the full validation pass.
pub struct StoryGraphBuilder {
    version: u32,
    entry: SceneId,
    episodes: BTreeMap<String, SceneId>,
    scenes: HashMap<SceneId, SceneNode>,
}

impl StoryGraphBuilder {
    /// Add a scene. Later additions with the same id replace earlier ones.
    pub fn scene(mut self, node: SceneNode) -> Self {
        self.scenes.insert(node.id.clone(), node);
        self
    }

    /// Name an episode entry point.
    pub fn episode(mut self, key: impl Into<String>, entry: impl Into<SceneId>) -> Self {
        self.episodes.insert(key.into(), entry.into());
        self
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<StoryGraph, GraphError> {
        let graph = StoryGraph {
            version: self.version,
            entry: self.entry,
            episodes: self.episodes,
            scenes: self.scenes,
        };
        graph.validate()?;
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_graph() -> StoryGraph {
        StoryGraph::builder(1, "intro")
            .scene(
                SceneNode::new("intro", 0, "Where to?")
                    .with_choice(Choice::new("A", "Go left").with_journal("Chose A"))
                    .with_choice(Choice::new("B", "Go right"))
                    .with_transition(TransitionRule::prefixed("branch_")),
            )
            .scene(SceneNode::new("branch_A", 1, "Left it is.").with_parent("intro"))
            .scene(SceneNode::new("branch_B", 1, "Right it is.").with_parent("intro"))
            .build()
            .expect("tiny graph is well-formed")
    }

    #[test]
    fn prefixed_resolution() {
        let graph = tiny_graph();
        let next = graph.resolve(&SceneId::new("intro"), "A").unwrap();
        assert_eq!(next.as_str(), "branch_A");
    }

    #[test]
    fn invalid_choice_is_rejected() {
        let graph = tiny_graph();
        let err = graph.resolve(&SceneId::new("intro"), "C").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidChoice { .. }));
    }

    #[test]
    fn terminal_scene_rejects_resolution() {
        let graph = tiny_graph();
        let err = graph.resolve(&SceneId::new("branch_A"), "A").unwrap_err();
        assert!(matches!(err, ResolveError::TerminalState { .. }));
    }

    #[test]
    fn explicit_table_wins_over_naming() {
        let graph = StoryGraph::builder(1, "start")
            .scene(
                SceneNode::new("start", 0, "Pick.")
                    .with_choice(Choice::new("odd", "Oddly named"))
                    .with_transition(TransitionRule::explicit([("odd", "the_weird_one")])),
            )
            .scene(SceneNode::new("the_weird_one", 1, "Found it.").with_parent("start"))
            .build()
            .unwrap();

        let next = graph.resolve(&SceneId::new("start"), "odd").unwrap();
        assert_eq!(next.as_str(), "the_weird_one");
    }

    #[test]
    fn dangling_choice_fails_validation() {
        let err = StoryGraph::builder(1, "start")
            .scene(
                SceneNode::new("start", 0, "Pick.")
                    .with_choice(Choice::new("go", "Go"))
                    .with_transition(TransitionRule::prefixed("nowhere_")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingChoice { .. }));
    }

    #[test]
    fn duplicate_outcomes_fail_validation() {
        let err = StoryGraph::builder(1, "start")
            .scene(
                SceneNode::new("start", 0, "Pick.")
                    .with_choice(Choice::new("go", "Go"))
                    .with_choice(Choice::new("go", "Go again"))
                    .with_transition(TransitionRule::prefixed("next_")),
            )
            .scene(SceneNode::new("next_go", 1, "Done."))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateOutcome { .. }));
    }

    #[test]
    fn terminal_with_rule_fails_validation() {
        let err = StoryGraph::builder(1, "start")
            .scene(
                SceneNode::new("start", 0, "The end.")
                    .with_transition(TransitionRule::prefixed("next_")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::TerminalWithTransition { .. }));
    }

    #[test]
    fn non_terminal_without_rule_fails_validation() {
        let err = StoryGraph::builder(1, "start")
            .scene(SceneNode::new("start", 0, "Pick.").with_choice(Choice::new("go", "Go")))
            .scene(SceneNode::new("next_go", 1, "Done."))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingTransition { .. }));
    }

    #[test]
    fn depth_must_increase_along_edges() {
        let err = StoryGraph::builder(1, "start")
            .scene(
                SceneNode::new("start", 0, "Pick.")
                    .with_choice(Choice::new("go", "Go"))
                    .with_transition(TransitionRule::prefixed("next_")),
            )
            .scene(SceneNode::new("next_go", 2, "Skipped a level."))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::DepthMismatch { .. }));
    }

    #[test]
    fn missing_entry_fails_validation() {
        let err = StoryGraph::builder(1, "nowhere")
            .scene(SceneNode::new("somewhere", 0, "Hello."))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingEntry(_)));
    }

    #[test]
    fn episode_entry_falls_back_to_default() {
        let graph = tiny_graph();
        assert_eq!(graph.entry_for(Some("s9e9")).as_str(), "intro");
        assert_eq!(graph.entry_for(None).as_str(), "intro");
    }

    #[test]
    fn unreachable_scenes_are_reported() {
        let graph = StoryGraph::builder(1, "start")
            .scene(SceneNode::new("start", 0, "The end."))
            .scene(SceneNode::new("orphan", 0, "No way in."))
            .build()
            .unwrap();
        let orphans = graph.unreachable_scenes();
        assert_eq!(orphans, vec![&SceneId::new("orphan")]);
    }
}
