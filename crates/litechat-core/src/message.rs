//! Conversation turn types shared by extraction and summary rendering.

use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when rendering conversation history.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User:",
            Self::Assistant => "Assistant:",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One extracted conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Sanitized text with fenced code blocks re-inserted in place.
    pub content: String,
    /// Zero-based position within the extracted window, oldest first.
    pub index: usize,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, index: usize) -> Self {
        Self {
            role,
            content: content.into(),
            index,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
