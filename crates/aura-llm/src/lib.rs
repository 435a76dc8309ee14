pub mod auth;
pub mod error;
pub mod provider;
pub mod providers;
pub mod transformer;

pub use auth::{ApiKeyAuth, Authenticator, NoAuth};
pub use error::{ConversionError, LLMError, Result};
pub use provider::{
    ChatModel, Conversation, GeminiClient, GeminiConfig, ImageGenerator, ImageOutcome,
    ModelReply, NameGenerator, Turn, TurnRole,
};
pub use providers::{
    title_prompt, GeminiChatModel, GeminiImageGenerator, GeminiNameGenerator, ModelStack,
};
