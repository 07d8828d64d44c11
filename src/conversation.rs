// Conversation transcript for a chat session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Bot,
}

/// One message in a transcript. Never changed after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub role: SenderRole,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: SenderRole::User,
            timestamp: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: SenderRole::Bot,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only, ordered message log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `max_messages` messages, trimmed further from the front until
    /// their combined text fits in `max_chars`
    pub fn recent(&self, max_messages: usize, max_chars: usize) -> &[Message] {
        let mut start = self.messages.len().saturating_sub(max_messages);
        let mut total: usize = self.messages[start..].iter().map(|m| m.text.len()).sum();

        while total > max_chars && start < self.messages.len() {
            total -= self.messages[start].text.len();
            start += 1;
        }

        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
