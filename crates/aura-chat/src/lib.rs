//! # Aura Chat
//!
//! 会话编排层：接收用户输入，区分普通消息与 `/image` 命令，驱动模型适配器，
//! 追加结果消息，触发自动命名并安排持久化。

pub mod command;
pub mod error;
pub mod naming;
pub mod orchestrator;

pub use command::Input;
pub use error::TurnError;
pub use naming::{build_snippet, clean_name, NamingAgent};
pub use orchestrator::{
    conversation_turns, ChatOrchestrator, ChatSettings, SessionSummary, TurnOutcome, TurnReport,
};
