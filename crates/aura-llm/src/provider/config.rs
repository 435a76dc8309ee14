use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for the API, without the `/models` suffix
    pub base_url: String,
    /// Model used for conversations
    pub chat_model: String,
    /// Model used for `/image` prompts
    pub image_model: String,
    /// Model used for chat titles
    pub naming_model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    #[serde(with = "serde_duration", default = "default_timeout")]
    pub timeout: Duration,
    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Attach the google_search tool to chat requests
    #[serde(default)]
    pub web_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl GeminiConfig {
    /// Set base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    /// Endpoint for `method` on `model`, e.g. `.../models/gemini:generateContent`
    pub fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            model,
            method
        )
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-2.5-flash-preview-04-17".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            naming_model: "gemini-2.5-flash-preview-04-17".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            web_search: true,
            system_instruction: None,
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_retries() -> u32 {
    3
}

// Custom serialization for Duration
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = GeminiConfig::default().with_base_url("http://localhost:9000/v1beta/");
        assert_eq!(
            config.endpoint("imagen-3.0-generate-002", "predict"),
            "http://localhost:9000/v1beta/models/imagen-3.0-generate-002:predict"
        );
    }

    #[test]
    fn test_timeout_serialized_as_seconds() {
        let config = GeminiConfig::default().with_timeout(Duration::from_secs(15));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 15);

        let back: GeminiConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, Duration::from_secs(15));
    }
}
