//! The built-in SimuLife story: Cassey's post-graduation year.
//!
//! Hand-authored content, built once into a validated [`StoryGraph`] and
//! shared process-wide. Scene ids follow the `scene<depth>_<branch>_...`
//! naming convention except where noted; the handful of scenes whose names
//! drifted during authoring carry explicit transition tables instead.

use crate::graph::{Choice, SceneNode, Speaker, StoryGraph, TransitionRule};
use crate::journal::Journal;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Content version of the built-in story. Bumped whenever scenes are added,
/// renamed, or removed, so stale snapshots are detected on restore.
pub const GRAPH_VERSION: u32 = 1;

/// Episode key for the pilot.
pub const EPISODE_PILOT: &str = "s1e1";

/// Episode key for the "one year later" coda.
pub const EPISODE_ONE_YEAR_LATER: &str = "s1e2";

// Journal marker lines the client derives Cassey's avatar from.
const MARKER_CHAOS: &str = "I packed my bag. I'm done being someone's excuse.";
const MARKER_BOLD: &str = "I pitched a story. They laughed. I wrote it anyway.";
const MARKER_AWKWARD: &str = "Back to the bakery. I hope no one notices the bruises.";

/// Cassey's mood, derived from journal markers; drives the avatar shown in
/// the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Neutral,
    Chaos,
    Bold,
    Awkward,
}

/// Derive the avatar mood from the journal. First marker wins, in the same
/// priority order the client checks them.
pub fn mood_for(journal: &Journal) -> Mood {
    if journal.contains(MARKER_CHAOS) {
        Mood::Chaos
    } else if journal.contains(MARKER_BOLD) {
        Mood::Bold
    } else if journal.contains(MARKER_AWKWARD) {
        Mood::Awkward
    } else {
        Mood::Neutral
    }
}

lazy_static! {
    // Built and validated once; an invalid built-in story is an authoring
    // defect that must fail loudly at first use, not be worked around.
    static ref SIMULIFE: Arc<StoryGraph> =
        Arc::new(build_simulife().expect("built-in SimuLife story graph must validate"));
}

/// The shared, validated SimuLife story graph.
pub fn simulife() -> Arc<StoryGraph> {
    SIMULIFE.clone()
}

fn zeke() -> Speaker {
    Speaker::new(
        "Zeke",
        "Pothead boyfriend, aspiring DJ, allergic to responsibility",
        "Yo babe, I forgot to pay rent again. Can you cover it again?",
    )
}

fn mom() -> Speaker {
    Speaker::new(
        "Mom",
        "Bakery owner, emotionally manipulative, frosting perfectionist",
        "Your posture is terrible. Customers can smell weakness.",
    )
}

fn editor() -> Speaker {
    Speaker::new(
        "Editor",
        "Grizzled newsroom vet, drinks cold brew and hard bagels",
        "Kid, you're lucky we even hired you. Now fix that tabloid piece.",
    )
}

fn build_simulife() -> Result<StoryGraph, crate::graph::GraphError> {
    StoryGraph::builder(GRAPH_VERSION, "scene1")
        .episode(EPISODE_PILOT, "scene1")
        .episode(EPISODE_ONE_YEAR_LATER, "ep2_scene1")
        // ------------------------------------------------------------------
        // Entry
        // ------------------------------------------------------------------
        .scene(
            SceneNode::new(
                "scene1",
                0,
                "Cassey (22) just graduated with a journalism degree in Chicago. \
                 She's staring at her cracked phone, weighing three impossible paths:\n\n\
                 1. Move to Minnesota with her pothead boyfriend.\n\
                 2. Return to Connecticut to live with her abusive mom and work in the family bakery.\n\
                 3. Stay in Chicago and take a $32k newsroom job.\n\n\
                 What should Cassey do?",
            )
            .with_choice(
                Choice::new("minnesota", "Move to Minnesota")
                    .with_journal("I chose love over logic. I hope he's worth it."),
            )
            .with_choice(
                Choice::new("connecticut", "Return to the CT bakery").with_journal(MARKER_AWKWARD),
            )
            .with_choice(
                Choice::new("chicago", "Stay in Chicago")
                    .with_journal("32k and a broken heater. But it's mine."),
            )
            .with_transition(TransitionRule::prefixed("scene2_")),
        )
        // ------------------------------------------------------------------
        // Depth 1: the three cities
        // ------------------------------------------------------------------
        .scene(
            SceneNode::new(
                "scene2_minnesota",
                1,
                "Cassey moves in with her pothead boyfriend. The apartment smells like \
                 weed and ramen. He forgot to pay rent. What now?",
            )
            .with_parent("scene1")
            .with_speaker(zeke())
            .with_choice(
                Choice::new("stay", "Suck it up, where else would she go?")
                    .with_journal("I cleaned the mess. Maybe I can fix this."),
            )
            .with_choice(
                Choice::new(
                    "leave",
                    "Make a plan to leave him and start from scratch in a city she has never known",
                )
                .with_journal(MARKER_CHAOS),
            )
            .with_transition(TransitionRule::prefixed("scene3_minnesota_")),
        )
        .scene(
            SceneNode::new(
                "scene2_connecticut",
                1,
                "Cassey returns to Connecticut. Her mom critiques her posture while \
                 frosting cupcakes. Her stepdad calls her \"kiddo\" and hands her a mop. \
                 What now?",
            )
            .with_parent("scene1")
            .with_speaker(mom())
            .with_choice(
                Choice::new("bake", "Bake and bear it")
                    .with_journal("I baked quietly. I'm good at disappearing."),
            )
            .with_choice(
                Choice::new("escape", "Pack and vanish")
                    .with_journal("I left a note on the flour sack. I'm not coming back."),
            )
            .with_transition(TransitionRule::prefixed("scene3_connecticut_")),
        )
        .scene(
            SceneNode::new(
                "scene2_chicago",
                1,
                "Cassey stays in Chicago. She's editing obits in a freezing newsroom \
                 with a broken heater. Her boss calls her \"temporary hire\". What now?",
            )
            .with_parent("scene1")
            .with_speaker(editor())
            .with_choice(Choice::new("pitch", "Pitch her own story anyway").with_journal(MARKER_BOLD))
            .with_choice(
                Choice::new("grad", "Learn a new skill and shelve the passion")
                    .with_journal("I applied to a python course. Journalism can wait."),
            )
            .with_transition(TransitionRule::prefixed("scene3_chicago_")),
        )
        // ------------------------------------------------------------------
        // Depth 2: consequences
        // ------------------------------------------------------------------
        .scene(
            SceneNode::new(
                "scene3_minnesota_stay",
                2,
                "Three months in. Cassey covers rent again. Zeke books one gig and \
                 spends the payout on a fog machine. Her savings hit zero. What now?",
            )
            .with_parent("scene2_minnesota")
            .with_speaker(zeke())
            .with_choice(
                Choice::new("ultimatum", "Give him one last chance to grow up")
                    .with_journal("One more month. I said it out loud so it has to count."),
            )
            .with_choice(
                Choice::new("settle", "Keep the peace and keep paying")
                    .with_journal("I stopped checking my account balance. Easier that way."),
            )
            .with_transition(TransitionRule::prefixed("scene4_minnesota_stay_")),
        )
        .scene(
            // Authored late; its endings predate the scene4_ convention, so
            // the successors are tabled explicitly.
            SceneNode::new(
                "scene3_minnesota_leave",
                2,
                "Bag packed, bus ticket in hand. Minneapolis is behind her. The only \
                 question left is what's ahead.",
            )
            .with_parent("scene2_minnesota")
            .with_choice(
                Choice::new("home", "Crash on a college friend's couch in Chicago")
                    .with_journal("Greyhound seat 14C. Chicago, take two."),
            )
            .with_choice(
                Choice::new("solo", "Stay in Minnesota, alone, and make it work")
                    .with_journal("New lease. One name on it. Mine."),
            )
            .with_transition(TransitionRule::explicit([
                ("home", "ending_fresh_start"),
                ("solo", "scene4_minnesota_leave_solo"),
            ])),
        )
        .scene(
            SceneNode::new(
                "scene3_connecticut_bake",
                2,
                "Six months of 4am shifts. Mom critiques the crumb structure of \
                 everything Cassey touches. A regular says her scones are the best \
                 in town. What now?",
            )
            .with_parent("scene2_connecticut")
            .with_speaker(mom())
            .with_choice(
                Choice::new("recipes", "Start a secret recipe blog after close")
                    .with_journal("Posted the brown butter recipe at midnight. Forty-two readers."),
            )
            .with_choice(
                Choice::new("manage", "Ask to run the front of house")
                    .with_journal("I asked for the keys. She laughed, then handed them over."),
            )
            .with_transition(TransitionRule::prefixed("scene4_connecticut_bake_")),
        )
        .scene(
            SceneNode::new(
                "scene3_connecticut_escape",
                2,
                "The note is on the flour sack. The car holds everything she owns. \
                 Which way does she drive?",
            )
            .with_parent("scene2_connecticut")
            .with_choice(
                Choice::new("chicago", "West, back to Chicago")
                    .with_journal("Sixteen hours of highway. I sang the whole way."),
            )
            .with_choice(
                Choice::new("coast", "North, to a seaside town she's never seen")
                    .with_journal("Picked a dot on the map. Portland, Maine. Why not."),
            )
            .with_transition(TransitionRule::explicit([
                ("chicago", "ending_fresh_start"),
                ("coast", "scene4_connecticut_escape_coast"),
            ])),
        )
        .scene(
            SceneNode::new(
                "scene3_chicago_pitch",
                2,
                "Her story runs. Page B7, under the fold, but it runs, and the byline \
                 says Cassey. An editor from a bigger paper emails. What now?",
            )
            .with_parent("scene2_chicago")
            .with_speaker(Speaker::new(
                "Editor",
                "Grizzled newsroom vet, drinks cold brew and hard bagels",
                "This... isn't terrible. Cut it by half and it runs Sunday.",
            ))
            .with_choice(
                Choice::new("jump", "Take the interview at the bigger paper")
                    .with_journal("Printed my clips at the library. Wore the good blazer."),
            )
            .with_choice(
                Choice::new("loyal", "Stay and build the beat she started")
                    .with_journal("B7 today. A1 eventually. I can wait."),
            )
            .with_transition(TransitionRule::prefixed("scene4_chicago_pitch_")),
        )
        .scene(
            SceneNode::new(
                "scene3_chicago_grad",
                2,
                "The python course is half done. Cassey automates the newsroom's obit \
                 template in an afternoon. Her boss doesn't notice. What now?",
            )
            .with_parent("scene2_chicago")
            .with_choice(
                Choice::new("bootcamp", "Quit and finish the course full-time")
                    .with_journal("Last obit filed. First pull request opened."),
            )
            .with_choice(
                Choice::new("moonlight", "Keep the job, code at night")
                    .with_journal("Day job, night terminal. Both cursors blinking."),
            )
            .with_transition(TransitionRule::explicit([
                ("bootcamp", "ending_code_career"),
                ("moonlight", "scene4_chicago_grad_moonlight"),
            ])),
        )
        // ------------------------------------------------------------------
        // Depth 3: endings
        // ------------------------------------------------------------------
        .scene(
            SceneNode::new(
                "scene4_minnesota_stay_ultimatum",
                3,
                "The month passes. Zeke sells the fog machine and buys a ring light \
                 for his streams. Cassey finally hears what the silence has been \
                 saying, and leaves in daylight, unhurried. Some endings take their \
                 time.",
            )
            .with_parent("scene3_minnesota_stay"),
        )
        .scene(
            SceneNode::new(
                "scene4_minnesota_stay_settle",
                3,
                "Cassey stays. The apartment slowly fills with posters for shows that \
                 never pay out. Years later she can't point to the day the choosing \
                 stopped.",
            )
            .with_parent("scene3_minnesota_stay"),
        )
        .scene(
            SceneNode::new(
                "scene4_minnesota_leave_solo",
                3,
                "The lease is hers, the heater works, and nobody forgets rent. \
                 Minneapolis in winter is brutal and gorgeous. So is starting over.",
            )
            .with_parent("scene3_minnesota_leave"),
        )
        .scene(
            // Shared ending: reachable from the Minnesota and Connecticut
            // branches alike.
            SceneNode::new(
                "ending_fresh_start",
                3,
                "Chicago again, but on her own terms this time. A sublet, a stack of \
                 clips, and nothing to prove to anyone but herself.",
            )
            .with_parent("scene3_minnesota_leave"),
        )
        .scene(
            SceneNode::new(
                "scene4_connecticut_bake_recipes",
                3,
                "The blog outgrows the bakery. A food editor asks whether she writes \
                 professionally; Cassey laughs, then says yes. Mom never reads it. \
                 The readers do.",
            )
            .with_parent("scene3_connecticut_bake"),
        )
        .scene(
            SceneNode::new(
                "scene4_connecticut_bake_manage",
                3,
                "Front of house runs on time now. Mom critiques from the kitchen, \
                 softer these days. It isn't journalism. It's hers, mostly.",
            )
            .with_parent("scene3_connecticut_bake"),
        )
        .scene(
            SceneNode::new(
                "scene4_connecticut_escape_coast",
                3,
                "Portland smells like salt and fryer oil. She waits tables, files \
                 freelance pieces about the harbor, and nobody here has an opinion \
                 about her posture.",
            )
            .with_parent("scene3_connecticut_escape"),
        )
        .scene(
            SceneNode::new(
                "scene4_chicago_pitch_jump",
                3,
                "The bigger paper says yes. The new newsroom has working heaters. Her \
                 old boss calls her \"temporary hire\" to the end; the new masthead \
                 spells her name right.",
            )
            .with_parent("scene3_chicago_pitch"),
        )
        .scene(
            SceneNode::new(
                "scene4_chicago_pitch_loyal",
                3,
                "Two years on the beat nobody wanted, until it's the beat everybody \
                 reads. A1, eventually, above the fold.",
            )
            .with_parent("scene3_chicago_pitch"),
        )
        .scene(
            SceneNode::new(
                "ending_code_career",
                3,
                "She ships scripts instead of stories now. Better pay, working heat, \
                 and every obit template in the city quietly runs her code.",
            )
            .with_parent("scene3_chicago_grad"),
        )
        .scene(
            SceneNode::new(
                "scene4_chicago_grad_moonlight",
                3,
                "Reporter by day, builder by night. She writes the story and the \
                 scraper that found it; the byline covers both.",
            )
            .with_parent("scene3_chicago_grad"),
        )
        // ------------------------------------------------------------------
        // Episode 2: one year later
        // ------------------------------------------------------------------
        .scene(
            SceneNode::new(
                "ep2_scene1",
                0,
                "One year later. A wedding invitation arrives from Connecticut: Mom \
                 is remarrying. Plus-one optional. What does Cassey do?",
            )
            .with_choice(
                Choice::new("attend", "Go, with a tray of her own scones").with_journal(
                    "RSVP'd yes. Bringing scones. Petty? Maybe. Delicious? Definitely.",
                ),
            )
            .with_choice(
                Choice::new("decline", "Mail a card and keep the weekend")
                    .with_journal("Sent a card. Kept my weekend."),
            )
            .with_transition(TransitionRule::prefixed("ep2_scene2_")),
        )
        .scene(
            SceneNode::new(
                "ep2_scene2_attend",
                1,
                "The scones disappear before the cake is cut. Mom says nothing, which \
                 from her is a standing ovation. Cassey drives home before the \
                 bouquet toss, radio loud.",
            )
            .with_parent("ep2_scene1"),
        )
        .scene(
            SceneNode::new(
                "ep2_scene2_decline",
                1,
                "The card says congratulations and means it. Cassey spends the \
                 weekend exactly as she pleases, which turns out to be the whole \
                 point.",
            )
            .with_parent("ep2_scene1"),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SceneId;

    #[test]
    fn built_in_story_validates() {
        // Force the lazy build; an invalid graph panics here.
        let graph = simulife();
        assert_eq!(graph.version(), GRAPH_VERSION);
        assert_eq!(graph.entry().as_str(), "scene1");
    }

    #[test]
    fn every_scene_is_reachable() {
        assert!(simulife().unreachable_scenes().is_empty());
    }

    #[test]
    fn episodes_name_their_entries() {
        let graph = simulife();
        assert_eq!(graph.entry_for(Some(EPISODE_PILOT)).as_str(), "scene1");
        assert_eq!(
            graph.entry_for(Some(EPISODE_ONE_YEAR_LATER)).as_str(),
            "ep2_scene1"
        );
    }

    #[test]
    fn branches_converge_on_the_shared_ending() {
        let graph = simulife();
        let from_minnesota = graph
            .resolve(&SceneId::new("scene3_minnesota_leave"), "home")
            .unwrap();
        let from_connecticut = graph
            .resolve(&SceneId::new("scene3_connecticut_escape"), "chicago")
            .unwrap();
        assert_eq!(from_minnesota, from_connecticut);
        assert_eq!(from_minnesota.as_str(), "ending_fresh_start");
    }

    #[test]
    fn mood_follows_journal_markers() {
        let mut journal = Journal::new();
        assert_eq!(mood_for(&journal), Mood::Neutral);

        journal.append(MARKER_AWKWARD);
        assert_eq!(mood_for(&journal), Mood::Awkward);

        journal.append(MARKER_BOLD);
        assert_eq!(mood_for(&journal), Mood::Bold);

        // Chaos outranks everything else.
        journal.append(MARKER_CHAOS);
        assert_eq!(mood_for(&journal), Mood::Chaos);
    }

    #[test]
    fn endings_have_no_choices() {
        let graph = simulife();
        for id in [
            "scene4_minnesota_stay_settle",
            "ending_fresh_start",
            "ending_code_career",
            "ep2_scene2_attend",
        ] {
            let node = graph.lookup(&SceneId::new(id)).unwrap();
            assert!(node.is_terminal(), "{id} should be an ending");
        }
    }
}
