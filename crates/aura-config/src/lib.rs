pub mod config;
pub mod manager;

pub use config::{
    ChatConfig, Config, ConfigError, ConfigResult, LlmConfig, LogLevel, LoggingConfig,
    StorageConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Aura 配置目录路径
pub fn aura_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".aura"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    aura_dir().map(|dir| dir.join("config.json"))
}

/// 获取默认数据目录（会话与主题）
pub fn default_data_dir() -> Option<PathBuf> {
    aura_dir().map(|dir| dir.join("data"))
}

/// 获取默认日志文件路径
pub fn default_log_path() -> Option<PathBuf> {
    aura_dir().map(|dir| dir.join("logs").join("aura.log"))
}

/// 初始化 Aura 目录结构
pub async fn init_aura_dirs() -> ConfigResult<()> {
    if let Some(aura) = aura_dir() {
        tokio::fs::create_dir_all(&aura).await?;
        tokio::fs::create_dir_all(aura.join("data")).await?;
        tokio::fs::create_dir_all(aura.join("logs")).await?;
    }
    Ok(())
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}
