use crate::config::{Config, ConfigError, ConfigResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// 配置管理器
#[derive(Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// 加载配置文件，不存在时写入默认配置
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = match tokio::fs::read_to_string(path).await {
            Ok(raw) => {
                info!("Loading config from {:?}", path);
                Self::parse(&raw)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {:?}, writing defaults", path);
                let config = Config::default();
                Self::write_file(path, &config).await?;
                config
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::new(config, path.to_path_buf()))
    }

    /// 解析配置文本：先展开环境变量，再反序列化并验证
    pub fn parse(raw: &str) -> ConfigResult<Config> {
        let expanded = Self::expand_env_vars(raw)?;
        let config: Config = serde_json::from_str(&expanded)?;
        Self::validate(&config)?;
        Ok(config)
    }

    async fn write_file(path: &Path, config: &Config) -> ConfigResult<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path, serde_json::to_string_pretty(config)?).await?;
        Ok(())
    }

    /// 从默认位置加载配置
    pub async fn load_default() -> ConfigResult<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path).await
    }

    /// 获取默认配置路径 (~/.aura/config.json)
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        crate::default_config_path()
            .ok_or_else(|| ConfigError::InvalidPath("Could not find home directory".to_string()))
    }

    /// 用现成的配置构建，不读取文件
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置的只读引用
    pub fn get(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// 当前配置的快照
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    /// 保存配置到文件
    pub async fn save(&self) -> ConfigResult<()> {
        let config = self.snapshot().await;
        Self::write_file(&self.path, &config).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    /// 更新配置并保存，更新后的配置必须通过验证
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config) -> ConfigResult<()>,
    {
        let mut config = self.config.write().await;
        let mut candidate = config.clone();
        f(&mut candidate)?;
        Self::validate(&candidate)?;
        *config = candidate;
        drop(config);
        self.save().await
    }

    /// 验证配置
    pub fn validate(config: &Config) -> ConfigResult<()> {
        let models = [
            ("llm.chat_model", &config.llm.chat_model),
            ("llm.image_model", &config.llm.image_model),
            ("llm.naming_model", &config.llm.naming_model),
        ];
        for (key, model) in models {
            if model.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
            }
        }

        if config.storage.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "storage.debounce_ms must be greater than 0".to_string(),
            ));
        }

        if config.chat.min_messages_for_naming == 0 {
            return Err(ConfigError::Validation(
                "chat.min_messages_for_naming must be greater than 0".to_string(),
            ));
        }

        if config.chat.max_snippet_chars == 0 {
            return Err(ConfigError::Validation(
                "chat.max_snippet_chars must be greater than 0".to_string(),
            ));
        }

        let command = &config.chat.image_command;
        if !command.starts_with('/') || command.len() < 2 || command.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::Validation(format!(
                "Invalid image command: '{}'",
                command
            )));
        }

        Ok(())
    }

    /// 展开环境变量 ${VAR} 或 ${VAR:-default}
    fn expand_env_vars(content: &str) -> ConfigResult<String> {
        let pattern = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}")
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let mut expanded = String::with_capacity(content.len());
        let mut cursor = 0;
        for caps in pattern.captures_iter(content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let name = &caps[1];
            let value = match (std::env::var(name), caps.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(fallback)) => fallback.as_str().to_string(),
                (Err(_), None) => return Err(ConfigError::EnvVarNotFound(name.to_string())),
            };
            expanded.push_str(&content[cursor..whole.start()]);
            expanded.push_str(&value);
            cursor = whole.end();
        }
        expanded.push_str(&content[cursor..]);

        Ok(expanded)
    }

    /// 获取配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let manager = ConfigManager::load(&config_path).await.unwrap();
        let config = manager.snapshot().await;

        assert!(config_path.exists());
        assert_eq!(config.chat.placeholder_name, "New Chat");
        assert!(config.llm.web_search);
    }

    #[tokio::test]
    async fn test_update_persists() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let manager = ConfigManager::load(&config_path).await.unwrap();
        manager
            .update(|config| config.set_value("chat.max_snippet_chars", "120"))
            .await
            .unwrap();

        let reloaded = ConfigManager::load(&config_path).await.unwrap();
        assert_eq!(reloaded.snapshot().await.chat.max_snippet_chars, 120);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let manager = ConfigManager::load(&config_path).await.unwrap();
        let result = manager
            .update(|config| config.set_value("storage.debounce_ms", "0"))
            .await;

        assert!(result.is_err());
        assert_eq!(manager.snapshot().await.storage.debounce_ms, 500);
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("AURA_TEST_VAR", "test_value");

        let content = r#"{"key": "${AURA_TEST_VAR}", "other": "${AURA_UNSET_VAR:-fallback}"}"#;
        let expanded = ConfigManager::expand_env_vars(content).unwrap();

        assert_eq!(expanded, r#"{"key": "test_value", "other": "fallback"}"#);
        assert!(ConfigManager::expand_env_vars("${AURA_SURELY_UNSET_VAR}").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let raw = r#"{"version": "0.1.0", "chat": {"welcome_message": "hi", "placeholder_name": "New Chat", "image_command": "/ image", "min_messages_for_naming": 3, "max_snippet_chars": 400}}"#;
        assert!(matches!(
            ConfigManager::parse(raw),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(ConfigManager::validate(&config).is_ok());

        config.chat.image_command = "image".to_string();
        assert!(ConfigManager::validate(&config).is_err());

        config.chat.image_command = "/img".to_string();
        config.llm.chat_model = " ".to_string();
        assert!(ConfigManager::validate(&config).is_err());
    }
}
