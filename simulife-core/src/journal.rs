//! The player-visible journal of narrative consequences.
//!
//! Append-only: entries are added when a choice that defines a journal line
//! is resolved, and the list is cleared only by an explicit restart. There
//! is no cap; the capped message history belongs to the live-chat
//! broadcaster, which is not part of this engine.

use serde::{Deserialize, Serialize};

/// Ordered, append-only log of journal lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<String>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line to the end of the journal.
    pub fn append(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Clear the journal. Called only on explicit player restart.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Whether the journal contains an exact line. The client derives the
    /// player's avatar from marker lines this way.
    pub fn contains(&self, line: &str) -> bool {
        self.entries.iter().any(|e| e == line)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a Journal {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
