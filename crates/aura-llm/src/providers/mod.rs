pub mod gemini_chat;
pub mod imagen;
pub mod naming;

pub use gemini_chat::{GeminiChatModel, GeminiConversation};
pub use imagen::GeminiImageGenerator;
pub use naming::{title_prompt, GeminiNameGenerator};

use std::sync::Arc;

use crate::error::Result;
use crate::provider::{ChatModel, GeminiClient, GeminiConfig, ImageGenerator, NameGenerator};

/// The three adapters the chat core drives
pub struct ModelStack {
    pub chat: Arc<dyn ChatModel>,
    pub image: Arc<dyn ImageGenerator>,
    pub naming: Arc<dyn NameGenerator>,
}

impl ModelStack {
    /// Gemini adapters sharing one HTTP client and credential
    pub fn gemini(client: Arc<GeminiClient>) -> Self {
        Self {
            chat: Arc::new(GeminiChatModel::new(Arc::clone(&client))),
            image: Arc::new(GeminiImageGenerator::new(Arc::clone(&client))),
            naming: Arc::new(GeminiNameGenerator::new(client)),
        }
    }

    /// Build the stack, reading the API key from the environment once
    pub fn gemini_from_env(config: GeminiConfig) -> Result<Self> {
        Ok(Self::gemini(Arc::new(GeminiClient::from_env(config)?)))
    }
}
