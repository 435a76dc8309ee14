//! Send-message state machine and session commands.
//!
//! Every turn targets one session id, fixed at submission. Sends to the same
//! session are rejected while one is in flight ([`SessionStatus`]). Text turns
//! share one conversation slot, so they run one at a time across all
//! sessions; only image turns for different sessions overlap. Remote failures
//! end up as error-flagged messages in the session, never as errors to the
//! caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use aura_core::defaults::{
    DEBOUNCE_MS, IMAGE_COMMAND, MAX_SNIPPET_CHARS, MIN_MESSAGES_FOR_NAMING, PLACEHOLDER_NAME,
    WELCOME_MESSAGE,
};
use aura_core::{ChatSession, Message, MessageId, Sender, SessionId, SessionStatus, Theme};
use aura_llm::{ChatModel, Conversation, ImageGenerator, ImageOutcome, LLMError, ModelStack, Turn};
use aura_observability::turn_span;
use aura_session::{
    DebouncedStore, DeleteConfirmation, DeleteOutcome, RepositorySettings, SessionRepository,
    SessionStore,
};

use crate::command::{self, Input};
use crate::error::TurnError;
use crate::naming::NamingAgent;

const IMAGE_FAILED_MESSAGE: &str = "Failed to generate image.";

/// Behaviour knobs, usually taken from the `chat` and `storage` config sections
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub placeholder_name: String,
    pub welcome_message: String,
    pub image_command: String,
    pub min_messages_for_naming: usize,
    pub max_snippet_chars: usize,
    pub debounce: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            placeholder_name: PLACEHOLDER_NAME.to_string(),
            welcome_message: WELCOME_MESSAGE.to_string(),
            image_command: IMAGE_COMMAND.to_string(),
            min_messages_for_naming: MIN_MESSAGES_FOR_NAMING,
            max_snippet_chars: MAX_SNIPPET_CHARS,
            debounce: Duration::from_millis(DEBOUNCE_MS),
        }
    }
}

/// How a submitted turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// The target session already has a send in flight
    Busy,
    /// The target session does not exist
    SessionNotFound,
    /// A model reply was appended
    Replied,
    /// An image message was appended
    ImageGenerated,
    /// An error was handled; see [`TurnError`]
    Failed(TurnError),
}

/// Result of [`ChatOrchestrator::send_message`]
#[derive(Debug)]
pub struct TurnReport {
    pub session_id: SessionId,
    pub outcome: TurnOutcome,
    /// Naming task started by this turn, if any
    pub naming: Option<JoinHandle<()>>,
}

impl TurnReport {
    fn new(session_id: &str, outcome: TurnOutcome) -> Self {
        Self {
            session_id: session_id.to_string(),
            outcome,
            naming: None,
        }
    }
}

/// Sidebar entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub name: String,
    pub last_updated_at: DateTime<Utc>,
    pub message_count: usize,
    pub is_active: bool,
    pub status: SessionStatus,
}

struct ActiveConversation {
    session_id: SessionId,
    handle: Box<dyn Conversation>,
}

/// Marks a session busy for the duration of a turn
struct StatusGuard<'a> {
    statuses: &'a DashMap<SessionId, SessionStatus>,
    session_id: SessionId,
}

impl<'a> StatusGuard<'a> {
    fn acquire(
        statuses: &'a DashMap<SessionId, SessionStatus>,
        session_id: &str,
        status: SessionStatus,
    ) -> Option<Self> {
        match statuses.entry(session_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_busy() {
                    return None;
                }
                entry.insert(status);
            }
            Entry::Vacant(entry) => {
                entry.insert(status);
            }
        }
        Some(Self {
            statuses,
            session_id: session_id.to_string(),
        })
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        self.statuses.remove(&self.session_id);
    }
}

/// Prior turns for the model: no errors, no welcome, not the pending message
pub fn conversation_turns(session: &ChatSession, pending: Option<&MessageId>) -> Vec<Turn> {
    session
        .messages
        .iter()
        .filter(|m| Some(&m.id) != pending && !m.is_error && !m.is_welcome())
        .map(|m| match m.sender {
            Sender::User => Turn::user(m.text.clone()),
            Sender::Ai => Turn::model(m.text.clone()),
        })
        .collect()
}

/// Reply text that reads like a failure is flagged even though the call succeeded
fn looks_like_error(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("error:") || lower.contains("sorry, i encountered an error")
}

pub struct ChatOrchestrator {
    repository: Arc<RwLock<SessionRepository>>,
    store: Arc<DebouncedStore>,
    chat_model: Arc<dyn ChatModel>,
    image_generator: Arc<dyn ImageGenerator>,
    naming: NamingAgent,
    conversation: Mutex<Option<ActiveConversation>>,
    statuses: DashMap<SessionId, SessionStatus>,
    config_error_reported: AtomicBool,
    theme: RwLock<Theme>,
    settings: ChatSettings,
}

impl ChatOrchestrator {
    /// Load persisted state and select the most recently updated session,
    /// creating one when nothing was stored.
    pub async fn bootstrap(
        store: Arc<dyn SessionStore>,
        models: ModelStack,
        settings: ChatSettings,
    ) -> Self {
        let sessions = store.load_sessions().await.unwrap_or_else(|e| {
            warn!("Failed to load sessions, starting empty: {}", e);
            Default::default()
        });
        let theme = match store.load_theme().await {
            Ok(theme) => theme.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load theme: {}", e);
                Theme::default()
            }
        };

        let repository = SessionRepository::bootstrap(
            sessions,
            RepositorySettings {
                placeholder_name: settings.placeholder_name.clone(),
                welcome_message: settings.welcome_message.clone(),
            },
        );
        info!(
            "Chat core ready: {} sessions, theme {}, model {}",
            repository.len(),
            theme,
            models.chat.model_id()
        );

        let orchestrator = Self {
            repository: Arc::new(RwLock::new(repository)),
            store: Arc::new(DebouncedStore::new(store, settings.debounce)),
            chat_model: models.chat,
            image_generator: models.image,
            naming: NamingAgent::new(
                models.naming,
                settings.min_messages_for_naming,
                settings.max_snippet_chars,
            ),
            conversation: Mutex::new(None),
            statuses: DashMap::new(),
            config_error_reported: AtomicBool::new(false),
            theme: RwLock::new(theme),
            settings,
        };
        orchestrator.persist();
        orchestrator
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    fn persist(&self) {
        let snapshot = self.repository.read().snapshot();
        self.store.schedule(snapshot);
    }

    fn append(&self, session_id: &str, message: Message) -> bool {
        let appended = self.repository.write().append_message(session_id, message);
        if appended {
            self.persist();
        }
        appended
    }

    /// Drop the cached conversation unless a send is using it
    fn discard_conversation_unless(&self, keep: Option<&str>) {
        if let Ok(mut slot) = self.conversation.try_lock() {
            let stale = slot
                .as_ref()
                .is_some_and(|c| Some(c.session_id.as_str()) != keep);
            if stale {
                debug!("Discarding cached conversation");
                *slot = None;
            }
        }
    }

    // ---- session commands ----

    pub fn create_session(&self) -> SessionId {
        let id = self.repository.write().create_session();
        self.discard_conversation_unless(Some(&id));
        self.persist();
        id
    }

    pub fn select_session(&self, id: &str) -> bool {
        let selected = self.repository.write().select_session(id);
        if selected {
            self.discard_conversation_unless(Some(id));
        }
        selected
    }

    /// Ask for confirmation, then delete. The prompt runs without holding
    /// the repository lock.
    pub fn delete_session(&self, id: &str, confirmation: &dyn DeleteConfirmation) -> DeleteOutcome {
        let Some(prompt) = self.repository.read().confirm_prompt(id) else {
            return DeleteOutcome::NotFound;
        };
        if !confirmation.confirm(&prompt) {
            debug!("Deletion of {} cancelled", id);
            return DeleteOutcome::Cancelled;
        }

        let outcome = self.repository.write().remove_session(id);
        if outcome == DeleteOutcome::Deleted {
            let active = self.active_session_id();
            self.discard_conversation_unless(Some(&active));
            self.naming.forget(id);
            self.persist();
        }
        outcome
    }

    /// Manual rename from the user
    pub fn rename_session(&self, id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let renamed = self.repository.write().set_session_name(id, name);
        if renamed {
            self.persist();
        }
        renamed
    }

    pub fn active_session_id(&self) -> SessionId {
        self.repository.read().active_session_id().clone()
    }

    pub fn active_session(&self) -> Option<ChatSession> {
        self.repository.read().active_session().cloned()
    }

    pub fn session(&self, id: &str) -> Option<ChatSession> {
        self.repository.read().session(id).cloned()
    }

    /// Sessions sorted by most recent update
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let repo = self.repository.read();
        let active = repo.active_session_id();
        repo.sessions_by_recency()
            .into_iter()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                name: s.name.clone(),
                last_updated_at: s.last_updated_at,
                message_count: s.messages.len(),
                is_active: &s.id == active,
                status: self.status(&s.id),
            })
            .collect()
    }

    pub fn status(&self, session_id: &str) -> SessionStatus {
        self.statuses
            .get(session_id)
            .map(|s| *s)
            .unwrap_or_default()
    }

    pub fn is_naming(&self) -> bool {
        self.naming.is_in_flight()
    }

    /// Whether auto-naming already ran for this session
    pub fn naming_attempted(&self, session_id: &str) -> bool {
        self.naming.was_attempted(session_id)
    }

    // ---- theme ----

    pub fn theme(&self) -> Theme {
        *self.theme.read()
    }

    /// Theme writes bypass the debounce
    pub async fn set_theme(&self, theme: Theme) {
        *self.theme.write() = theme;
        if let Err(e) = self.store.save_theme(theme).await {
            warn!("Failed to save theme: {}", e);
        }
    }

    // ---- turns ----

    /// Forget that the missing-credential notice was shown
    pub fn reset_error_state(&self) {
        self.config_error_reported.store(false, Ordering::SeqCst);
    }

    /// Submit input to the session active right now
    pub async fn send_message(&self, raw: &str) -> TurnReport {
        let session_id = self.active_session_id();
        self.send_message_to(&session_id, raw).await
    }

    /// Submit input to a specific session
    pub async fn send_message_to(&self, session_id: &str, raw: &str) -> TurnReport {
        let input = command::parse(raw, &self.settings.image_command);
        if input == Input::Blank {
            return TurnReport::new(session_id, TurnOutcome::Ignored);
        }
        if !self.repository.read().contains(session_id) {
            return TurnReport::new(session_id, TurnOutcome::SessionNotFound);
        }

        let status = match input {
            Input::Text(_) => SessionStatus::AwaitingReply,
            _ => SessionStatus::AwaitingImage,
        };
        let Some(_guard) = StatusGuard::acquire(&self.statuses, session_id, status) else {
            debug!("Session {} busy, rejecting input", session_id);
            return TurnReport::new(session_id, TurnOutcome::Busy);
        };

        let user_message = Message::user(raw.trim());
        let user_message_id = user_message.id.clone();
        self.append(session_id, user_message);

        let span = turn_span(session_id, &user_message_id);
        let outcome = match input {
            Input::ImageUsage => {
                let usage = format!(
                    "Please provide a prompt for the image after '{} '.",
                    self.settings.image_command
                );
                self.append(session_id, Message::ai_error(usage.clone()));
                TurnOutcome::Failed(TurnError::Validation(usage))
            }
            Input::Image(prompt) => self.run_image(session_id, &prompt).instrument(span).await,
            Input::Text(text) => {
                self.run_text(session_id, &user_message_id, &text)
                    .instrument(span)
                    .await
            }
            Input::Blank => TurnOutcome::Ignored,
        };

        let mut report = TurnReport::new(session_id, outcome);
        if report.outcome == TurnOutcome::Replied {
            report.naming = self
                .naming
                .maybe_spawn(&self.repository, &self.store, session_id);
        }
        report
    }

    async fn run_image(&self, session_id: &str, prompt: &str) -> TurnOutcome {
        self.append(
            session_id,
            Message::ai(format!("Generating image for: \"{}\"...", prompt)),
        );

        match self.image_generator.generate(prompt).await {
            ImageOutcome::Generated {
                image_url,
                alt_text,
            } => {
                let alt = alt_text
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| prompt.to_string());
                self.append(
                    session_id,
                    Message::ai_image(format!("Image generated for: \"{}\"", prompt), image_url, alt),
                );
                TurnOutcome::ImageGenerated
            }
            ImageOutcome::Failed { error } => {
                let text = if error.trim().is_empty() {
                    IMAGE_FAILED_MESSAGE.to_string()
                } else {
                    error
                };
                self.append(session_id, Message::ai_error(text.clone()));
                TurnOutcome::Failed(TurnError::Transport(text))
            }
        }
    }

    fn replay_history(&self, session_id: &str, pending: &MessageId) -> Vec<Turn> {
        let repo = self.repository.read();
        repo.session(session_id)
            .map(|session| conversation_turns(session, Some(pending)))
            .unwrap_or_default()
    }

    async fn run_text(&self, session_id: &str, pending: &MessageId, text: &str) -> TurnOutcome {
        let mut slot = self.conversation.lock().await;

        let reusable = slot.as_ref().is_some_and(|c| c.session_id == session_id);
        if !reusable {
            *slot = None;
            let history = self.replay_history(session_id, pending);
            debug!("Building conversation from {} turns", history.len());

            match self.chat_model.start_conversation(history).await {
                Ok(handle) => {
                    *slot = Some(ActiveConversation {
                        session_id: session_id.to_string(),
                        handle,
                    });
                }
                Err(e) => return self.report_init_failure(session_id, e),
            }
        }

        let Some(active) = slot.as_mut() else {
            return TurnOutcome::Failed(TurnError::Initialization(
                "conversation unavailable".to_string(),
            ));
        };

        match active.handle.send(text).await {
            Ok(reply) => {
                let flagged = looks_like_error(&reply.text);
                let message = Message::ai(reply.text)
                    .with_citations(reply.citations)
                    .flagged(flagged);
                if !self.append(session_id, message) {
                    debug!("Session {} gone, reply dropped", session_id);
                }
                TurnOutcome::Replied
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                let reason = e.to_string();
                self.append(
                    session_id,
                    Message::ai_error(format!("Sorry, I had trouble responding: {}", reason)),
                );
                TurnOutcome::Failed(TurnError::Transport(reason))
            }
        }
    }

    fn report_init_failure(&self, session_id: &str, error: LLMError) -> TurnOutcome {
        match error {
            LLMError::MissingCredential(var) => {
                if !self.config_error_reported.load(Ordering::SeqCst) {
                    warn!("{} is not set, cannot initialize chat", var);
                    let shown = self.append(
                        session_id,
                        Message::ai_error(format!(
                            "Configuration Error: API Key not found. Please ensure {} is set in your environment. The application cannot connect to the AI service.",
                            var
                        )),
                    );
                    // only a notice that landed in a session counts as reported
                    if shown {
                        self.config_error_reported.store(true, Ordering::SeqCst);
                    }
                } else {
                    debug!("Missing credential already reported");
                }
                TurnOutcome::Failed(TurnError::Configuration(format!(
                    "API key not found in {}",
                    var
                )))
            }
            other => {
                warn!("Failed to initialize chat: {}", other);
                let reason = other.to_string();
                self.append(
                    session_id,
                    Message::ai_error(format!("Error initializing chat: {}", reason)),
                );
                TurnOutcome::Failed(TurnError::Initialization(reason))
            }
        }
    }

    /// Write any pending snapshot now
    pub async fn shutdown(&self) {
        if let Err(e) = self.store.flush().await {
            warn!("Failed to flush sessions on shutdown: {}", e);
        }
        info!("Chat core stopped");
    }
}
