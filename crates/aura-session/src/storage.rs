//! # Storage Traits
//!
//! 会话映射与主题的持久化接口。

use async_trait::async_trait;

use aura_core::{SessionMap, Theme};

use crate::error::StorageResult;

/// 会话存储 trait
///
/// 两个独立的键：完整的会话映射，以及主题偏好。
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 加载全部会话；数据缺失或损坏时返回空映射
    async fn load_sessions(&self) -> StorageResult<SessionMap>;

    /// 保存全部会话（完整替换）
    async fn save_sessions(&self, sessions: &SessionMap) -> StorageResult<()>;

    /// 加载主题；未保存过时返回 None
    async fn load_theme(&self) -> StorageResult<Option<Theme>>;

    /// 保存主题
    async fn save_theme(&self, theme: Theme) -> StorageResult<()>;
}
