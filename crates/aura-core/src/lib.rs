pub mod defaults;
pub mod types;

pub use types::{
    ChatSession, Citation, Message, MessageId, Sender, SessionId, SessionMap, SessionStatus,
    Theme, ThemeParseError,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
