use serde::{Deserialize, Serialize};

use crate::types::{Role, Turn};

/// Ordered, append-only record of the conversation for the active session.
///
/// Insertion order is conversation order. The log is owned exclusively by the
/// session controller; the transport layer and renderers only ever see
/// snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog {
    turns: Vec<Turn>,
}

impl MessageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user turn and returns its index.
    pub fn push_user(&mut self, text: impl Into<String>) -> usize {
        self.turns.push(Turn::user(text));
        self.turns.len() - 1
    }

    /// Appends an assistant turn and returns its index.
    pub fn push_assistant(&mut self, text: impl Into<String>) -> usize {
        self.turns.push(Turn::assistant(text));
        self.turns.len() - 1
    }

    /// Appends `fragment` to the text of the turn at `index`.
    ///
    /// Only valid for the in-progress assistant turn; callers go through the
    /// accumulator rather than calling this directly.
    pub(crate) fn append_to(&mut self, index: usize, fragment: &str) {
        if let Some(turn) = self.turns.get_mut(index) {
            debug_assert_eq!(turn.role, Role::Assistant);
            turn.text.push_str(fragment);
        }
    }

    /// Returns the turns in conversation order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the turn at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    /// Returns the most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Returns the number of turns in the conversation.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if the conversation has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Removes every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl From<Vec<Turn>> for MessageLog {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}
