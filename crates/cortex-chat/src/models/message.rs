use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message in the chat transcript
pub struct ChatMessage {
    pub role: Role,
    pub created: i64,
    pub content: String,
}

impl ChatMessage {
    /// Create a new user message with the current timestamp
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new<S: Into<String>>(role: Role, content: S) -> Self {
        ChatMessage {
            role,
            created: Utc::now().timestamp(),
            content: content.into(),
        }
    }

    /// The content as markdown, with agent bullet glyphs turned into list items
    pub fn display_markdown(&self) -> String {
        self.content.replace('•', "\n\n-")
    }
}
