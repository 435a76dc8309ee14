//! 把应用配置映射到各个库的配置，并组装编排器

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use aura_chat::{ChatOrchestrator, ChatSettings};
use aura_config::{Config, LlmConfig, StorageConfig};
use aura_llm::{GeminiConfig, ModelStack};
use aura_observability::{LogManager, LoggingConfig};
use aura_session::{FileSessionStore, FileStoreConfig};

pub fn gemini_config(llm: &LlmConfig) -> GeminiConfig {
    let config = GeminiConfig {
        base_url: llm.base_url.clone(),
        chat_model: llm.chat_model.clone(),
        image_model: llm.image_model.clone(),
        naming_model: llm.naming_model.clone(),
        api_key_env: llm.api_key_env.clone(),
        ..GeminiConfig::default()
    }
    .with_timeout(Duration::from_secs(llm.timeout_seconds))
    .with_web_search(llm.web_search);

    match &llm.system_instruction {
        Some(instruction) => config.with_system_instruction(instruction.clone()),
        None => config,
    }
}

pub fn chat_settings(config: &Config) -> ChatSettings {
    ChatSettings {
        placeholder_name: config.chat.placeholder_name.clone(),
        welcome_message: config.chat.welcome_message.clone(),
        image_command: config.chat.image_command.clone(),
        min_messages_for_naming: config.chat.min_messages_for_naming,
        max_snippet_chars: config.chat.max_snippet_chars,
        debounce: Duration::from_millis(config.storage.debounce_ms),
    }
}

pub fn store_config(storage: &StorageConfig) -> anyhow::Result<FileStoreConfig> {
    let base: PathBuf = aura_config::expand_tilde(&storage.path)
        .with_context(|| format!("Cannot resolve storage path {}", storage.path))?;
    Ok(FileStoreConfig::new(base)
        .with_sessions_key(storage.sessions_key.clone())
        .with_theme_key(storage.theme_key.clone()))
}

/// 打开本地存储、构建 Gemini 适配器并恢复会话
pub async fn open(config: &Config) -> anyhow::Result<ChatOrchestrator> {
    let store = FileSessionStore::new(store_config(&config.storage)?)
        .await
        .context("Failed to open session storage")?;
    let models = ModelStack::gemini_from_env(gemini_config(&config.llm))
        .context("Failed to build model client")?;

    Ok(ChatOrchestrator::bootstrap(Arc::new(store), models, chat_settings(config)).await)
}

/// 日志初始化失败不影响聊天，只在 stderr 提示一次
pub fn init_logging(config: &Config, debug: bool) -> Option<LogManager> {
    let logging = match LoggingConfig::from_app_config(&config.logging) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            return None;
        }
    };
    let logging = if debug {
        logging.with_level("debug")
    } else {
        logging
    };

    match LogManager::init(logging) {
        Ok(manager) => Some(manager),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    }
}
