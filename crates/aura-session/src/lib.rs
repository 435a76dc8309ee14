//! # Aura Session
//!
//! 会话仓库与本地持久化。
//!
//! ## 存储结构
//!
//! ```text
//! <base_path>/
//! ├── aura_chat_sessions.json   # 会话 id -> 会话
//! └── aura_theme                # light | dark | system
//! ```
//!
//! 会话写入经过 [`DebouncedStore`] 合并，主题直接写入。

pub mod debounce;
pub mod error;
pub mod file_storage;
pub mod repository;
pub mod storage;

// 重新导出主要类型
pub use debounce::DebouncedStore;
pub use error::{StorageError, StorageResult};
pub use file_storage::{FileSessionStore, FileStoreConfig};
pub use repository::{DeleteConfirmation, DeleteOutcome, RepositorySettings, SessionRepository};
pub use storage::SessionStore;

/// 版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 创建默认存储路径
pub fn default_storage_path() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".aura").join("data"))
        .unwrap_or_else(|| std::path::PathBuf::from("./aura_data"))
}
