use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::WELCOME_ID_PREFIX;

/// Unique message identifier
pub type MessageId = String;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Ai => write!(f, "ai"),
        }
    }
}

/// Source reference attached to a grounded reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

impl Citation {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }
}

/// A single chat message.
///
/// Messages are never edited after they are stored; sessions only append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    fn with_prefix(prefix: &str, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: format!("{}-{}", prefix, Uuid::new_v4()),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            image_url: None,
            image_alt_text: None,
            citations: None,
            is_error: false,
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_prefix("user", Sender::User, text)
    }

    /// Create an assistant message
    pub fn ai(text: impl Into<String>) -> Self {
        Self::with_prefix("ai", Sender::Ai, text)
    }

    /// Create an error-flagged assistant message
    pub fn ai_error(text: impl Into<String>) -> Self {
        let mut message = Self::with_prefix("ai-error", Sender::Ai, text);
        message.is_error = true;
        message
    }

    /// Create the greeting every new session starts with
    pub fn welcome(text: impl Into<String>) -> Self {
        let mut message = Self::ai(text);
        message.id = format!("{}{}", WELCOME_ID_PREFIX, Uuid::new_v4());
        message
    }

    /// Create an assistant message carrying an image
    pub fn ai_image(
        text: impl Into<String>,
        image_url: impl Into<String>,
        alt_text: impl Into<String>,
    ) -> Self {
        let mut message = Self::with_prefix("ai-img", Sender::Ai, text);
        message.image_url = Some(image_url.into());
        message.image_alt_text = Some(alt_text.into());
        message
    }

    /// Attach citations; an empty list is stored as `None`
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = if citations.is_empty() {
            None
        } else {
            Some(citations)
        };
        self
    }

    pub fn flagged(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    pub fn is_welcome(&self) -> bool {
        self.id.starts_with(WELCOME_ID_PREFIX)
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello!");
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.text, "Hello!");
        assert!(msg.id.starts_with("user-"));
        assert!(!msg.is_error);
    }

    #[test]
    fn test_welcome_message_is_recognised() {
        let msg = Message::welcome("hi");
        assert!(msg.is_welcome());
        assert_eq!(msg.sender, Sender::Ai);
        assert!(!Message::ai("hi").is_welcome());
    }

    #[test]
    fn test_empty_citations_are_dropped() {
        let msg = Message::ai("answer").with_citations(vec![]);
        assert!(msg.citations.is_none());

        let msg = Message::ai("answer").with_citations(vec![Citation::new("https://a", "A")]);
        assert_eq!(msg.citations.unwrap().len(), 1);
    }

    #[test]
    fn test_serialized_field_names() {
        let msg = Message::ai_image("done", "data:image/png;base64,AAAA", "a cat");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "ai");
        assert_eq!(json["imageUrl"], "data:image/png;base64,AAAA");
        assert_eq!(json["imageAltText"], "a cat");
        assert!(json.get("isError").is_none());
        assert!(json["timestamp"].is_string());
    }
}
