//! # Session Repository
//!
//! 持有全部会话与当前活跃会话指针。所有修改都经过这里：
//! 创建、选择、删除、追加消息、重命名。对不存在的 id 的操作一律静默忽略。

use tracing::{debug, info};

use aura_core::defaults::{PLACEHOLDER_NAME, WELCOME_MESSAGE};
use aura_core::{ChatSession, Message, SessionId, SessionMap};

/// 仓库设置
#[derive(Debug, Clone)]
pub struct RepositorySettings {
    /// 新会话的占位名称
    pub placeholder_name: String,
    /// 新会话的欢迎语
    pub welcome_message: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            placeholder_name: PLACEHOLDER_NAME.to_string(),
            welcome_message: WELCOME_MESSAGE.to_string(),
        }
    }
}

/// 删除前的确认
pub trait DeleteConfirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> DeleteConfirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// 删除结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct SessionRepository {
    sessions: SessionMap,
    active: SessionId,
    settings: RepositorySettings,
}

impl SessionRepository {
    /// 空仓库：创建一个新会话并设为活跃
    pub fn new(settings: RepositorySettings) -> Self {
        Self::bootstrap(SessionMap::new(), settings)
    }

    /// 接管已加载的会话，选中最近更新的一个；为空时创建新会话
    pub fn bootstrap(loaded: SessionMap, settings: RepositorySettings) -> Self {
        let mut repo = Self {
            sessions: loaded,
            active: SessionId::new(),
            settings,
        };

        match repo.most_recent_id() {
            Some(id) => {
                info!("Restored {} sessions, active: {}", repo.sessions.len(), id);
                repo.active = id;
            }
            None => {
                repo.create_session();
            }
        }
        repo
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    /// 创建会话并设为活跃
    pub fn create_session(&mut self) -> SessionId {
        let session = ChatSession::new(
            self.settings.placeholder_name.clone(),
            self.settings.welcome_message.clone(),
        );
        let id = session.id.clone();

        self.sessions.insert(id.clone(), session);
        self.active = id.clone();
        info!("Created session {}", id);
        id
    }

    /// 切换活跃会话；id 不存在时返回 false 且不做任何改变
    pub fn select_session(&mut self, id: &str) -> bool {
        if !self.sessions.contains_key(id) {
            debug!("Ignoring selection of unknown session {}", id);
            return false;
        }
        self.active = id.to_string();
        true
    }

    /// 删除确认提示；会话不存在时返回 None
    pub fn confirm_prompt(&self, id: &str) -> Option<String> {
        self.sessions.get(id).map(|session| {
            format!(
                "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                session.name
            )
        })
    }

    /// 删除会话（调用方已确认）
    ///
    /// 若删除的是活跃会话，切换到最近更新的剩余会话；若已无会话则新建一个。
    pub fn remove_session(&mut self, id: &str) -> DeleteOutcome {
        if self.sessions.remove(id).is_none() {
            return DeleteOutcome::NotFound;
        }
        info!("Deleted session {}", id);

        if self.active == id {
            match self.most_recent_id() {
                Some(next) => self.active = next,
                None => {
                    self.create_session();
                }
            }
        }
        DeleteOutcome::Deleted
    }

    /// 询问确认后删除
    pub fn delete_session(
        &mut self,
        id: &str,
        confirmation: &dyn DeleteConfirmation,
    ) -> DeleteOutcome {
        let Some(prompt) = self.confirm_prompt(id) else {
            return DeleteOutcome::NotFound;
        };
        if !confirmation.confirm(&prompt) {
            return DeleteOutcome::Cancelled;
        }
        self.remove_session(id)
    }

    /// 追加消息；会话不存在时返回 false
    pub fn append_message(&mut self, session_id: &str, message: Message) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                debug!(session_id, message_id = %message.id, "Appending message");
                session.push(message);
                true
            }
            None => {
                debug!("Dropping message for missing session {}", session_id);
                false
            }
        }
    }

    /// 自动命名：仅当名称仍为占位名称时生效
    pub fn rename_session(&mut self, session_id: &str, name: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) if session.name == self.settings.placeholder_name => {
                info!("Renamed session {} to {:?}", session_id, name);
                session.name = name.to_string();
                true
            }
            _ => false,
        }
    }

    /// 用户手动改名，不受占位名称限制
    pub fn set_session_name(&mut self, session_id: &str, name: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                session.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn is_placeholder_name(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|s| s.name == self.settings.placeholder_name)
    }

    pub fn active_session_id(&self) -> &SessionId {
        &self.active
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.sessions.get(&self.active)
    }

    pub fn session(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 按最近更新时间降序排列
    pub fn sessions_by_recency(&self) -> Vec<&ChatSession> {
        let mut sessions: Vec<&ChatSession> = self.sessions.values().collect();
        sessions.sort_by(|a, b| {
            b.last_updated_at
                .cmp(&a.last_updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        sessions
    }

    /// 持久化用的完整快照
    pub fn snapshot(&self) -> SessionMap {
        self.sessions.clone()
    }

    fn most_recent_id(&self) -> Option<SessionId> {
        self.sessions_by_recency().first().map(|s| s.id.clone())
    }
}
