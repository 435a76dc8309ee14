//! Hand-written adapter and store mocks for orchestrator tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use aura_chat::{ChatOrchestrator, ChatSettings};
use aura_core::{Citation, SessionMap, Theme};
use aura_llm::{
    ChatModel, Conversation, ImageGenerator, ImageOutcome, LLMError, ModelReply, ModelStack,
    NameGenerator, Turn,
};
use aura_session::{SessionStore, StorageResult};

// ---- chat ----

#[derive(Clone)]
pub enum Scripted {
    Reply(ModelReply),
    Fail(String),
}

pub struct MockChatModel {
    missing_credential: bool,
    init_error: Option<String>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    gate: Option<Arc<Notify>>,
    start_gate: Option<Arc<Notify>>,
    pub starts: AtomicUsize,
    pub histories: Mutex<Vec<Vec<Turn>>>,
    pub sends: Arc<AtomicUsize>,
}

impl MockChatModel {
    /// Replies `Echo: <text>` unless a scripted reply is queued
    pub fn echo() -> Self {
        Self {
            missing_credential: false,
            init_error: None,
            script: Arc::new(Mutex::new(VecDeque::new())),
            gate: None,
            start_gate: None,
            starts: AtomicUsize::new(0),
            histories: Mutex::new(Vec::new()),
            sends: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn missing_credential() -> Self {
        Self {
            missing_credential: true,
            ..Self::echo()
        }
    }

    /// Credential check waits for one `notify_one` before failing
    pub fn missing_credential_gated(gate: Arc<Notify>) -> Self {
        Self {
            missing_credential: true,
            start_gate: Some(gate),
            ..Self::echo()
        }
    }

    pub fn failing_init(reason: &str) -> Self {
        Self {
            init_error: Some(reason.to_string()),
            ..Self::echo()
        }
    }

    /// Every send waits for one `notify_one` on the gate
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::echo()
        }
    }

    pub fn push(&self, scripted: Scripted) {
        self.script.lock().push_back(scripted);
    }

    pub fn reply_with(&self, text: &str, citations: Vec<Citation>) {
        self.push(Scripted::Reply(ModelReply {
            text: text.to_string(),
            citations,
        }));
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn last_history(&self) -> Vec<Turn> {
        self.histories.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model_id(&self) -> &str {
        "mock-chat"
    }

    async fn start_conversation(&self, history: Vec<Turn>) -> aura_llm::Result<Box<dyn Conversation>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.start_gate {
            gate.notified().await;
        }
        if self.missing_credential {
            return Err(LLMError::MissingCredential("API_KEY".to_string()));
        }
        if let Some(reason) = &self.init_error {
            return Err(LLMError::Config(reason.clone()));
        }
        self.histories.lock().push(history.clone());
        Ok(Box::new(MockConversation {
            history,
            script: Arc::clone(&self.script),
            gate: self.gate.clone(),
            sends: Arc::clone(&self.sends),
        }))
    }
}

pub struct MockConversation {
    history: Vec<Turn>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    gate: Option<Arc<Notify>>,
    sends: Arc<AtomicUsize>,
}

#[async_trait]
impl Conversation for MockConversation {
    async fn send(&mut self, text: &str) -> aura_llm::Result<ModelReply> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.script.lock().pop_front();
        let reply = match next {
            Some(Scripted::Reply(reply)) => reply,
            Some(Scripted::Fail(reason)) => return Err(LLMError::Network(reason)),
            None => ModelReply {
                text: format!("Echo: {}", text),
                citations: vec![],
            },
        };
        self.history.push(Turn::user(text));
        self.history.push(Turn::model(reply.text.clone()));
        Ok(reply)
    }

    fn history(&self) -> &[Turn] {
        &self.history
    }
}

// ---- image ----

pub struct MockImageGenerator {
    outcome: ImageOutcome,
    pub calls: AtomicUsize,
}

impl MockImageGenerator {
    pub fn succeeding() -> Self {
        Self::with_outcome(ImageOutcome::Generated {
            image_url: "data:image/jpeg;base64,Zm94".to_string(),
            alt_text: None,
        })
    }

    pub fn with_outcome(outcome: ImageOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, _prompt: &str) -> ImageOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

// ---- naming ----

pub struct MockNamer {
    result: Result<String, String>,
    gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
    pub snippets: Mutex<Vec<String>>,
}

impl MockNamer {
    pub fn returning(name: &str) -> Self {
        Self {
            result: Ok(name.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
            snippets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err("naming backend down".to_string()),
            ..Self::returning("")
        }
    }

    pub fn gated(name: &str, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::returning(name)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameGenerator for MockNamer {
    async fn propose_name(&self, snippet: &str) -> aura_llm::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snippets.lock().push(snippet.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.clone().map_err(LLMError::Network)
    }
}

// ---- storage ----

#[derive(Default)]
pub struct MemoryStore {
    pub sessions: Mutex<Option<SessionMap>>,
    pub theme: Mutex<Option<Theme>>,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_sessions(sessions: SessionMap) -> Self {
        Self {
            sessions: Mutex::new(Some(sessions)),
            ..Default::default()
        }
    }

    pub fn saved(&self) -> Option<SessionMap> {
        self.sessions.lock().clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_sessions(&self) -> StorageResult<SessionMap> {
        Ok(self.sessions.lock().clone().unwrap_or_default())
    }

    async fn save_sessions(&self, sessions: &SessionMap) -> StorageResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.sessions.lock() = Some(sessions.clone());
        Ok(())
    }

    async fn load_theme(&self) -> StorageResult<Option<Theme>> {
        Ok(*self.theme.lock())
    }

    async fn save_theme(&self, theme: Theme) -> StorageResult<()> {
        *self.theme.lock() = Some(theme);
        Ok(())
    }
}

// ---- harness ----

pub struct Harness {
    pub orchestrator: ChatOrchestrator,
    pub chat: Arc<MockChatModel>,
    pub image: Arc<MockImageGenerator>,
    pub namer: Arc<MockNamer>,
    pub store: Arc<MemoryStore>,
}

pub async fn harness_with(
    chat: MockChatModel,
    image: MockImageGenerator,
    namer: MockNamer,
    store: MemoryStore,
) -> Harness {
    let chat = Arc::new(chat);
    let image = Arc::new(image);
    let namer = Arc::new(namer);
    let store = Arc::new(store);

    let models = ModelStack {
        chat: chat.clone(),
        image: image.clone(),
        naming: namer.clone(),
    };
    let settings = ChatSettings {
        debounce: Duration::from_millis(20),
        ..Default::default()
    };
    let orchestrator = ChatOrchestrator::bootstrap(store.clone(), models, settings).await;

    Harness {
        orchestrator,
        chat,
        image,
        namer,
        store,
    }
}

pub async fn harness(chat: MockChatModel) -> Harness {
    harness_with(
        chat,
        MockImageGenerator::succeeding(),
        MockNamer::returning("Test Title"),
        MemoryStore::default(),
    )
    .await
}

/// Yield until `cond` holds
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
