use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use aura_core::Citation;

use crate::error::Result;

/// Role of a replayed turn on the model side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One entry of conversation history sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Reply text plus any web sources the model grounded it on
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelReply {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Result of an image request. Expected failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Generated {
        image_url: String,
        alt_text: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// Factory for model-side conversation handles
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs
    fn model_id(&self) -> &str;

    /// Build a conversation seeded with prior turns
    async fn start_conversation(&self, history: Vec<Turn>) -> Result<Box<dyn Conversation>>;
}

/// A stateful conversation with the model
#[async_trait]
pub trait Conversation: Send {
    /// Send user text and wait for the full reply.
    ///
    /// History only grows when the call succeeds.
    async fn send(&mut self, text: &str) -> Result<ModelReply>;

    /// Turns committed so far
    fn history(&self) -> &[Turn];
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> ImageOutcome;
}

/// One-shot title generation from a conversation excerpt
#[async_trait]
pub trait NameGenerator: Send + Sync {
    async fn propose_name(&self, snippet: &str) -> Result<String>;
}
