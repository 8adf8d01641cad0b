use serde::{Deserialize, Serialize};

use super::message::Message;
use super::role::Role;

/// A single turn of the conversation history as the browser interface keeps it.
///
/// History is owned by the caller and passed in whole on every request; order is
/// chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for Message {
    fn from(chat: &ChatMessage) -> Self {
        Message::new(chat.role).with_text(chat.content.clone())
    }
}
