//! Conversation history records.

use serde::{Deserialize, Serialize};

/// Producer of a conversation entry.
///
/// `system` entries are answers previously produced by a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    User,
    System,
}

/// One entry of the conversation history, oldest first in a history slice.
///
/// All three fields are required when deserializing: a record missing any of
/// them is rejected instead of being filled with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub content: String,
    /// Whether the frontend animates this entry when displaying it.
    pub typewriter: bool,
}

impl ConversationItem {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            kind: ConversationKind::User,
            content: content.into(),
            typewriter: false,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            kind: ConversationKind::System,
            content: content.into(),
            typewriter: false,
        }
    }

    /// Same record with its content replaced.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            content: content.into(),
            typewriter: self.typewriter,
        }
    }
}
