//! Chat turn types.

use serde::{Deserialize, Serialize};

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User/human turn.
    User,
    /// Assistant/AI turn.
    Assistant,
    /// System turn.
    System,
}

/// One role-tagged message in a conversation.
///
/// Turns are supplied by the caller per request and are not persisted;
/// they carry no identity of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Turn role.
    pub role: TurnRole,
    /// Turn content.
    pub content: String,
}

impl ChatTurn {
    /// Creates a new turn.
    #[must_use]
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    /// Creates a system turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content)
    }

    /// Returns true if this turn is forwarded to the model.
    ///
    /// Only non-empty user and assistant turns are included in the
    /// assembled prompt; anything else supplied by the caller is dropped
    /// silently.
    #[must_use]
    pub fn is_promptable(&self) -> bool {
        matches!(self.role, TurnRole::User | TurnRole::Assistant) && !self.content.is_empty()
    }
}
