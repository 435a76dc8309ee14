//! # FileSessionStore
//!
//! 基于本地文件的会话存储实现。
//!
//! 存储结构:
//! ```text
//! <base_path>/
//! ├── <sessions_key>.json   # 全部会话（JSON 映射）
//! └── <theme_key>           # 主题（纯文本）
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use aura_core::{SessionMap, Theme};

use crate::error::{StorageError, StorageResult};
use crate::storage::SessionStore;

/// FileSessionStore 配置
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// 存储根目录
    pub base_path: PathBuf,
    /// 会话数据的键
    pub sessions_key: String,
    /// 主题的键
    pub theme_key: String,
}

impl FileStoreConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    pub fn with_sessions_key(mut self, key: impl Into<String>) -> Self {
        self.sessions_key = key.into();
        self
    }

    pub fn with_theme_key(mut self, key: impl Into<String>) -> Self {
        self.theme_key = key.into();
        self
    }
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            base_path: crate::default_storage_path(),
            sessions_key: "aura_chat_sessions".to_string(),
            theme_key: "aura_theme".to_string(),
        }
    }
}

pub struct FileSessionStore {
    sessions_path: PathBuf,
    theme_path: PathBuf,
}

impl FileSessionStore {
    /// 创建存储并确保目录存在
    pub async fn new(config: FileStoreConfig) -> StorageResult<Self> {
        let base_path_str = config.base_path.to_string_lossy().to_string();
        let base_path = PathBuf::from(shellexpand::tilde(&base_path_str).as_ref());

        fs::create_dir_all(&base_path).await?;

        let store = Self {
            sessions_path: base_path.join(format!("{}.json", config.sessions_key)),
            theme_path: base_path.join(&config.theme_key),
        };

        info!("FileSessionStore initialized at {:?}", base_path);
        Ok(store)
    }

    pub fn sessions_path(&self) -> &Path {
        &self.sessions_path
    }

    pub fn theme_path(&self) -> &Path {
        &self.theme_path
    }

    /// 读取文件；不存在时返回 None
    async fn read_optional(path: &Path) -> StorageResult<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// 先写临时文件再重命名
    async fn write_atomic(path: &Path, content: &str) -> StorageResult<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load_sessions(&self) -> StorageResult<SessionMap> {
        let Some(content) = Self::read_optional(&self.sessions_path).await? else {
            debug!("No persisted sessions at {:?}", self.sessions_path);
            return Ok(SessionMap::new());
        };

        match serde_json::from_str::<SessionMap>(&content) {
            Ok(sessions) => {
                debug!("Loaded {} sessions", sessions.len());
                Ok(sessions)
            }
            Err(e) => {
                warn!(
                    "Discarding unreadable session data at {:?}: {}",
                    self.sessions_path, e
                );
                Ok(SessionMap::new())
            }
        }
    }

    async fn save_sessions(&self, sessions: &SessionMap) -> StorageResult<()> {
        let content = serde_json::to_string(sessions)?;
        Self::write_atomic(&self.sessions_path, &content).await?;
        debug!("Saved {} sessions", sessions.len());
        Ok(())
    }

    async fn load_theme(&self) -> StorageResult<Option<Theme>> {
        let Some(content) = Self::read_optional(&self.theme_path).await? else {
            return Ok(None);
        };

        match content.parse::<Theme>() {
            Ok(theme) => Ok(Some(theme)),
            Err(e) => {
                warn!("Ignoring stored theme: {}", e);
                Ok(None)
            }
        }
    }

    async fn save_theme(&self, theme: Theme) -> StorageResult<()> {
        Self::write_atomic(&self.theme_path, theme.as_str()).await?;
        debug!("Saved theme {}", theme);
        Ok(())
    }
}
