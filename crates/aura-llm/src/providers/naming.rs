use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::provider::{GeminiClient, NameGenerator};
use crate::transformer::{build_generate_request, parse_generate_response};

/// Prompt asking for a short chat title
pub fn title_prompt(snippet: &str) -> String {
    format!(
        "Based on the following excerpt from a conversation, generate a concise and relevant title for the chat session, ideally 2-6 words.\n\
         Examples: \"Luau Inventory System\", \"Python API Scaffolding\", \"Essay on Climate Change\", \"Game Character: Zephyr\", \"Image: Cyberpunk City\", \"Calculus Problem Help\", \"Translate JS to Python\".\n\
         Do not use quotes in the title.\n\
         Conversation excerpt:\n\
         ---\n\
         {snippet}\n\
         ---\n\
         Title:"
    )
}

/// One-shot `generateContent` call without history, tools or persona
pub struct GeminiNameGenerator {
    client: Arc<GeminiClient>,
}

impl GeminiNameGenerator {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NameGenerator for GeminiNameGenerator {
    async fn propose_name(&self, snippet: &str) -> Result<String> {
        let body = build_generate_request(&[], &title_prompt(snippet), None, false);
        let data = self
            .client
            .post_model(&self.client.config().naming_model, "generateContent", &body)
            .await?;
        let reply = parse_generate_response(&data)?;
        Ok(reply.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prompt_embeds_snippet() {
        let prompt = title_prompt("User: hi\nAura: hello");
        assert!(prompt.contains("---\nUser: hi\nAura: hello\n---\nTitle:"));
        assert!(prompt.starts_with("Based on the following excerpt"));
        assert!(prompt.contains("\nDo not use quotes in the title.\n"));
    }
}
