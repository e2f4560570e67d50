use std::fmt;

use serde::{Deserialize, Serialize};

/// The author of a conversation entry.
///
/// Response content may omit the role; it then defaults to [`Role::Model`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the chat.
    User,

    /// The language model.
    #[default]
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// A single text segment of a [`Content`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Part {
    /// The text of the segment.
    #[serde(default)]
    pub text: String,

    /// Set by the provider when the segment is model reasoning rather than answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    /// Create a new text `Part`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            thought: None,
        }
    }

    /// Returns true if this part is reasoning output rather than answer text.
    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

/// A role-tagged message: the unit of conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Who authored the message.
    #[serde(default)]
    pub role: Role,

    /// Ordered text segments.  Messages built by this crate carry exactly one.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a new `Content` with a single text part.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a new user `Content`.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a new model `Content`.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// The concatenated answer text of every non-thought part.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|part| !part.is_thought())
            .map(|part| part.text.as_str())
            .collect()
    }
}
