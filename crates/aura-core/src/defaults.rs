//! Built-in defaults shared by the config layer and the chat core.

/// Greeting seeded into every new session.
pub const WELCOME_MESSAGE: &str = "Hello! I'm Aura. Ask me anything, or type '/image <prompt>' \
to create a picture. How can I help you today?";

/// Session name meaning "not yet auto-titled".
pub const PLACEHOLDER_NAME: &str = "New Chat";

/// Name used when the naming model answers with an empty title.
pub const FALLBACK_NAME: &str = "Chat Summary";

/// Input prefix that routes a turn to the image model.
pub const IMAGE_COMMAND: &str = "/image";

pub const MIN_MESSAGES_FOR_NAMING: usize = 3;
pub const MAX_SNIPPET_CHARS: usize = 400;

/// Trailing-edge window for collapsing session writes.
pub const DEBOUNCE_MS: u64 = 500;

/// Label the naming snippet uses for assistant lines.
pub const ASSISTANT_LABEL: &str = "Aura";

/// Id prefix of the seeded welcome message.
pub const WELCOME_ID_PREFIX: &str = "ai-welcome-";
