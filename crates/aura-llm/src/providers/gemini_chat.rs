use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::provider::{ChatModel, Conversation, GeminiClient, ModelReply, Turn};
use crate::transformer::{build_generate_request, parse_generate_response};

/// Conversational model backed by `generateContent`
pub struct GeminiChatModel {
    client: Arc<GeminiClient>,
}

impl GeminiChatModel {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn model_id(&self) -> &str {
        &self.client.config().chat_model
    }

    async fn start_conversation(&self, history: Vec<Turn>) -> Result<Box<dyn Conversation>> {
        self.client.ensure_credential()?;
        debug!(
            "Starting {} conversation with {} prior turns",
            self.model_id(),
            history.len()
        );
        Ok(Box::new(GeminiConversation {
            client: Arc::clone(&self.client),
            history,
        }))
    }
}

/// Client-side history; the REST API itself is stateless
pub struct GeminiConversation {
    client: Arc<GeminiClient>,
    history: Vec<Turn>,
}

#[async_trait]
impl Conversation for GeminiConversation {
    async fn send(&mut self, text: &str) -> Result<ModelReply> {
        let config = self.client.config();
        let body = build_generate_request(
            &self.history,
            text,
            config.system_instruction.as_deref(),
            config.web_search,
        );

        let data = self
            .client
            .post_model(&config.chat_model, "generateContent", &body)
            .await?;
        let reply = parse_generate_response(&data)?;

        self.history.push(Turn::user(text));
        self.history.push(Turn::model(reply.text.clone()));
        debug!(
            "Reply received: {} chars, {} citations",
            reply.text.len(),
            reply.citations.len()
        );
        Ok(reply)
    }

    fn history(&self) -> &[Turn] {
        &self.history
    }
}
