pub mod base;
pub mod config;
pub mod model;

pub use base::GeminiClient;
pub use config::GeminiConfig;
pub use model::{
    ChatModel, Conversation, ImageGenerator, ImageOutcome, ModelReply, NameGenerator, Turn,
    TurnRole,
};
