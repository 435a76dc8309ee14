use thiserror::Error;

/// Why a turn did not produce a normal reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// Credential missing; fatal until fixed outside the app
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Conversation handle could not be built
    #[error("initialization error: {0}")]
    Initialization(String),

    /// A send or generation call failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Input rejected before any remote call
    #[error("validation error: {0}")]
    Validation(String),
}
