use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// A conversation split into the prior turns and the active query.
///
/// Built once per request from the caller's message list and never stored.
#[derive(Debug, Clone)]
pub struct Conversation {
    history: Vec<Message>,
    query: Message,
}

impl Conversation {
    /// Treats the last message as the active query and everything before it as history.
    pub fn from_messages(mut messages: Vec<Message>) -> Result<Self, DomainError> {
        let query = messages
            .pop()
            .ok_or_else(|| DomainError::malformed("conversation must contain at least one message"))?;

        Ok(Self {
            history: messages,
            query,
        })
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn query(&self) -> &str {
        &self.query.content
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}
