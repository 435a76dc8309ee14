pub mod message;
pub mod session;
pub mod theme;

pub use message::{Citation, Message, MessageId, Sender};
pub use session::{ChatSession, SessionId, SessionMap, SessionStatus};
pub use theme::{Theme, ThemeParseError};
