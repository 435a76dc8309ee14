//! 日志配置
//!
//! 可以直接构建，也可以从 `aura-config` 的 `logging` 段转换而来。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ObservabilityError, Result};

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（trace, debug, info, warn, error）或完整的 EnvFilter 指令
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 是否输出到 stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// 日志文件路径，设置后写入文件
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    /// 是否启用 ANSI 颜色（仅终端输出）
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// 是否包含目标（target）
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// 是否包含线程 ID
    #[serde(default)]
    pub include_thread_id: bool,

    /// 是否包含行号
    #[serde(default = "default_true")]
    pub include_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            stderr: true,
            file_path: None,
            module_levels: quiet_dependencies(),
            ansi_colors: true,
            include_target: true,
            include_thread_id: false,
            include_line_number: true,
        }
    }
}

impl LoggingConfig {
    /// 由应用配置构建
    ///
    /// 配置了日志文件时只写文件，终端留给交互界面。
    pub fn from_app_config(config: &aura_config::LoggingConfig) -> Result<Self> {
        let file_path = match &config.file {
            Some(path) => Some(aura_config::expand_tilde(path).ok_or_else(|| {
                ObservabilityError::config(format!("Cannot resolve log path: {}", path))
            })?),
            None => None,
        };

        Ok(Self {
            level: config.level.to_string(),
            json_format: config.json,
            stderr: file_path.is_none(),
            file_path,
            ..Self::default()
        })
    }

    /// 设置日志级别
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// 设置日志文件路径
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// 设置是否输出到 stderr
    pub fn with_stderr(mut self, enabled: bool) -> Self {
        self.stderr = enabled;
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(
        mut self,
        module: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        self.module_levels.insert(module.into(), level.into());
        self
    }
}

fn default_log_level() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

fn default_true() -> bool {
    true
}

/// HTTP 栈的日志太吵，默认只保留警告
fn quiet_dependencies() -> HashMap<String, String> {
    ["hyper", "reqwest", "rustls"]
        .into_iter()
        .map(|module| (module.to_string(), "warn".to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_config::LogLevel;

    #[test]
    fn test_builder() {
        let config = LoggingConfig::default()
            .with_level("debug")
            .with_json_format(true)
            .with_module_level("aura_chat", "trace");

        assert_eq!(config.level, "debug");
        assert!(config.json_format);
        assert_eq!(
            config.module_levels.get("aura_chat"),
            Some(&"trace".to_string())
        );
        assert_eq!(config.module_levels.get("hyper"), Some(&"warn".to_string()));
    }

    #[test]
    fn test_from_app_config_with_file() {
        let app = aura_config::LoggingConfig {
            level: LogLevel::Debug,
            file: Some("/tmp/aura-test/aura.log".to_string()),
            json: true,
        };

        let config = LoggingConfig::from_app_config(&app).unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.json_format);
        assert!(!config.stderr);
        assert_eq!(
            config.file_path,
            Some(PathBuf::from("/tmp/aura-test/aura.log"))
        );
    }

    #[test]
    fn test_from_app_config_without_file() {
        let app = aura_config::LoggingConfig {
            level: LogLevel::Warn,
            file: None,
            json: false,
        };

        let config = LoggingConfig::from_app_config(&app).unwrap();
        assert_eq!(config.level, "warn");
        assert!(config.stderr);
        assert!(config.file_path.is_none());
    }
}
