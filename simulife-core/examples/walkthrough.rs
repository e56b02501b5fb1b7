//! Quick walkthrough of the built-in SimuLife story.

use simulife_core::persist::{MemoryProgressStore, ProgressStore};
use simulife_core::story;
use simulife_core::HeadlessStory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== SimuLife Walkthrough ===\n");

    let mut game = HeadlessStory::new(story::simulife());
    println!("{}\n", game.prompt());

    for outcome in ["chicago", "pitch", "loyal"] {
        println!("> {outcome}");
        let step = game.choose(outcome)?;
        println!("{}\n", step.prompt);
        if let Some(speaker) = &step.speaker {
            println!("  {} ({}): {}\n", speaker.name, speaker.bio, speaker.reaction);
        }
    }

    println!("--- Journal ---");
    for entry in game.journal().iter() {
        println!("  * {entry}");
    }
    println!("Mood: {:?}", story::mood_for(game.journal()));

    // Save and resume through an in-memory store.
    let store = MemoryProgressStore::new();
    game.save(&store, "demo_post", "demo_player").await?;
    let loaded = store.load("demo_post", "demo_player").await?;
    println!(
        "\nSaved at scene `{}`, {} journal entries.",
        loaded.as_ref().map(|p| p.metadata.current_scene.as_str()).unwrap_or("?"),
        loaded.as_ref().map(|p| p.metadata.journal_entries).unwrap_or(0),
    );

    Ok(())
}
