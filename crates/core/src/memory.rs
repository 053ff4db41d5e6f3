//! Conversation memory: the append-only turn log of one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Maximum characters of the first question used as a session title.
const TITLE_MAX_CHARS: usize = 60;

/// An ordered, append-only sequence of conversation turns.
///
/// Turns are never reordered or edited. The answerer appends a
/// user/assistant pair per successful question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMemory {
    turns: Vec<Message>,

    /// When this memory was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was added
    pub updated_at: DateTime<Utc>,
}

impl ConversationMemory {
    /// Create a new empty memory.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a turn to the end of the sequence.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.updated_at = Utc::now();
        self.turns.push(Message::new(role, content));
    }

    /// Read-only view of all turns, oldest first.
    pub fn as_ordered_turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Short title derived from the first user turn.
    pub fn title(&self) -> Option<String> {
        self.turns
            .iter()
            .find(|t| t.role == Role::User)
            .map(|t| truncate_chars(t.content.trim(), TITLE_MAX_CHARS))
    }

    /// The most recent assistant turn, if any.
    pub fn last_answer(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.as_str())
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}
