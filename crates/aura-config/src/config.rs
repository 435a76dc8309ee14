use serde::{Deserialize, Serialize};

use aura_core::defaults;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            llm: LlmConfig::default(),
            chat: ChatConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["llm", "base_url"] => Some(self.llm.base_url.clone()),
            ["llm", "chat_model"] => Some(self.llm.chat_model.clone()),
            ["llm", "image_model"] => Some(self.llm.image_model.clone()),
            ["llm", "naming_model"] => Some(self.llm.naming_model.clone()),
            ["llm", "api_key_env"] => Some(self.llm.api_key_env.clone()),
            ["llm", "timeout_seconds"] => Some(self.llm.timeout_seconds.to_string()),
            ["llm", "web_search"] => Some(self.llm.web_search.to_string()),
            ["chat", "placeholder_name"] => Some(self.chat.placeholder_name.clone()),
            ["chat", "image_command"] => Some(self.chat.image_command.clone()),
            ["chat", "min_messages_for_naming"] => {
                Some(self.chat.min_messages_for_naming.to_string())
            }
            ["chat", "max_snippet_chars"] => Some(self.chat.max_snippet_chars.to_string()),
            ["storage", "path"] => Some(self.storage.path.clone()),
            ["storage", "debounce_ms"] => Some(self.storage.debounce_ms.to_string()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["llm", "base_url"] => self.llm.base_url = value.to_string(),
            ["llm", "chat_model"] => self.llm.chat_model = value.to_string(),
            ["llm", "image_model"] => self.llm.image_model = value.to_string(),
            ["llm", "naming_model"] => self.llm.naming_model = value.to_string(),
            ["llm", "api_key_env"] => self.llm.api_key_env = value.to_string(),
            ["llm", "timeout_seconds"] => {
                self.llm.timeout_seconds = parse_number(value)?;
            }
            ["llm", "web_search"] => self.llm.web_search = parse_bool(value)?,
            ["chat", "placeholder_name"] => self.chat.placeholder_name = value.to_string(),
            ["chat", "image_command"] => self.chat.image_command = value.to_string(),
            ["chat", "min_messages_for_naming"] => {
                self.chat.min_messages_for_naming = parse_number(value)?;
            }
            ["chat", "max_snippet_chars"] => {
                self.chat.max_snippet_chars = parse_number(value)?;
            }
            ["storage", "path"] => self.storage.path = value.to_string(),
            ["storage", "debounce_ms"] => self.storage.debounce_ms = parse_number(value)?,
            ["logging", "level"] => self.logging.level = value.parse()?,
            ["logging", "file"] => self.logging.file = Some(value.to_string()),
            ["logging", "json"] => self.logging.json = parse_bool(value)?,
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))
}

/// LLM 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub naming_model: String,
    /// 保存 API Key 的环境变量名
    pub api_key_env: String,
    pub timeout_seconds: u64,
    /// 是否启用 google_search 工具
    pub web_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-2.5-flash-preview-04-17".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            naming_model: "gemini-2.5-flash-preview-04-17".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_seconds: 60,
            web_search: true,
            system_instruction: Some(
                "You are Aura, a capable and concise AI assistant. Cite sources when you use web results."
                    .to_string(),
            ),
        }
    }
}

impl LlmConfig {
    /// 从环境变量读取 API Key
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// 会话行为配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    pub welcome_message: String,
    pub placeholder_name: String,
    pub image_command: String,
    pub min_messages_for_naming: usize,
    pub max_snippet_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: defaults::WELCOME_MESSAGE.to_string(),
            placeholder_name: defaults::PLACEHOLDER_NAME.to_string(),
            image_command: defaults::IMAGE_COMMAND.to_string(),
            min_messages_for_naming: defaults::MIN_MESSAGES_FOR_NAMING,
            max_snippet_chars: defaults::MAX_SNIPPET_CHARS,
        }
    }
}

/// Storage 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub path: String,
    /// 会话数据的键（文件名，不含扩展名）
    pub sessions_key: String,
    /// 主题的键
    pub theme_key: String,
    pub debounce_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.aura/data".to_string(),
            sessions_key: "aura_chat_sessions".to_string(),
            theme_key: "aura_theme".to_string(),
            debounce_ms: defaults::DEBOUNCE_MS,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.aura/logs/aura.log".to_string()),
            json: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
