use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::message::Message;

/// Unique session identifier
pub type SessionId = String;

/// All known sessions keyed by id
pub type SessionMap = HashMap<SessionId, ChatSession>;

/// One conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: SessionId,
    pub name: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a session seeded with a welcome message
    pub fn new(name: impl Into<String>, welcome: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Self::generate_id(),
            name: name.into(),
            messages: vec![Message::welcome(welcome)],
            created_at: now,
            last_updated_at: now,
        }
    }

    /// Random ids stay unique under rapid successive creation
    pub fn generate_id() -> SessionId {
        format!("chat-{}", Uuid::new_v4())
    }

    /// Append a message and bump the update time
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.last_updated_at = Utc::now();
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages that do not carry an image
    pub fn text_message_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.has_image()).count()
    }
}

/// Per-session in-flight state, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    AwaitingReply,
    AwaitingImage,
}

impl SessionStatus {
    pub fn is_busy(&self) -> bool {
        !matches!(self, SessionStatus::Idle)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::AwaitingReply => write!(f, "awaiting-reply"),
            SessionStatus::AwaitingImage => write!(f, "awaiting-image"),
        }
    }
}
