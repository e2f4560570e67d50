//! The in-memory conversation history of one chat session.

use crate::types::{Content, Role};

/// Persona instructions sent as the first (hidden) user message of every conversation.
pub const SYSTEM_PREAMBLE: &str = "You are a professional AI assistant. Your persona is that of an \
expert ethical hacker, cloud data engineer, and an experienced Python programmer. When using \
search results, synthesize the information into a comprehensive answer and start by saying \
\"Searching the web, I found that...\". For all other queries, respond directly.";

/// The model's (hidden) acknowledgment of [`SYSTEM_PREAMBLE`].
pub const PREAMBLE_ACK: &str =
    "Understood. I am your expert AI assistant with live web access. How can I help you today?";

/// Number of hidden seed messages at the head of every conversation.
pub const SEED_LEN: usize = 2;

/// An append-only, seeded message history.
///
/// The first [`SEED_LEN`] entries are a synthetic user instruction and a synthetic model
/// acknowledgment.  They are sent to the model on every turn but never shown to the user, and
/// nothing can remove or reorder them.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Content>,
}

impl Conversation {
    /// Start a conversation seeded with the default persona.
    pub fn new() -> Self {
        Self::with_preamble(SYSTEM_PREAMBLE, PREAMBLE_ACK)
    }

    /// Start a conversation seeded with a custom instruction and acknowledgment.
    pub fn with_preamble(preamble: impl Into<String>, ack: impl Into<String>) -> Self {
        Self {
            messages: vec![Content::user(preamble), Content::model(ack)],
        }
    }

    /// Every message, seed pair included, oldest first.
    pub fn messages(&self) -> &[Content] {
        &self.messages
    }

    /// The messages a user should see: everything after the seed pair.
    pub fn visible(&self) -> &[Content] {
        &self.messages[SEED_LEN..]
    }

    /// Append a user message.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Content::user(text));
    }

    /// Append a model message.
    pub fn push_model(&mut self, text: impl Into<String>) {
        self.messages.push(Content::model(text));
    }

    /// Total number of stored messages, seed pair included.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing beyond the seed pair has been stored.
    pub fn is_empty(&self) -> bool {
        self.messages.len() == SEED_LEN
    }

    /// Number of completed user/model exchanges.
    pub fn turns(&self) -> usize {
        self.visible()
            .iter()
            .filter(|message| message.role == Role::Model)
            .count()
    }

    /// Drop everything after the seed pair.
    pub fn reset(&mut self) {
        self.messages.truncate(SEED_LEN);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
