//! Automatic chat titles.
//!
//! A session is named at most once per process: the first qualifying turn
//! records an attempt, and only one naming call runs at a time across all
//! sessions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use aura_core::defaults::{ASSISTANT_LABEL, FALLBACK_NAME};
use aura_core::{ChatSession, Sender, SessionId};
use aura_llm::NameGenerator;
use aura_observability::session_span;
use aura_session::{DebouncedStore, SessionRepository};

/// Render the first `min_messages + 1` non-image messages as
/// `"User: ..."` / `"Aura: ..."` lines, cut to `max_chars` characters.
pub fn build_snippet(session: &ChatSession, min_messages: usize, max_chars: usize) -> String {
    let joined = session
        .messages
        .iter()
        .filter(|m| !m.has_image())
        .take(min_messages + 1)
        .map(|m| {
            let label = match m.sender {
                Sender::User => "User",
                Sender::Ai => ASSISTANT_LABEL,
            };
            format!("{}: {}", label, m.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    joined.chars().take(max_chars).collect()
}

/// Normalize a proposed title: first line, trimmed, surrounding quotes removed
pub fn clean_name(raw: &str) -> String {
    const QUOTES: &[char] = &['"', '\'', '`', '“', '”', '‘', '’'];

    let first_line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let name = first_line.trim_matches(QUOTES).trim();
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name.to_string()
    }
}

pub struct NamingAgent {
    generator: Arc<dyn NameGenerator>,
    min_messages: usize,
    max_snippet_chars: usize,
    in_flight: Arc<AtomicBool>,
    attempted: Mutex<HashSet<SessionId>>,
}

/// Clears the in-flight flag when the naming task ends
struct InFlightPermit(Arc<AtomicBool>);

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl NamingAgent {
    pub fn new(
        generator: Arc<dyn NameGenerator>,
        min_messages: usize,
        max_snippet_chars: usize,
    ) -> Self {
        Self {
            generator,
            min_messages,
            max_snippet_chars,
            in_flight: Arc::new(AtomicBool::new(false)),
            attempted: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn was_attempted(&self, session_id: &str) -> bool {
        self.attempted.lock().contains(session_id)
    }

    /// Drop the attempt record of a deleted session
    pub fn forget(&self, session_id: &str) {
        self.attempted.lock().remove(session_id);
    }

    /// Session still carries the placeholder and has enough text messages
    pub fn qualifies(&self, repository: &SessionRepository, session_id: &str) -> bool {
        repository.is_placeholder_name(session_id)
            && repository
                .session(session_id)
                .is_some_and(|s| s.text_message_count() >= self.min_messages)
    }

    /// Start a naming call for `session_id` if the trigger policy allows it.
    ///
    /// Returns the spawned task, which renames the session on success and
    /// schedules a save.
    pub fn maybe_spawn(
        &self,
        repository: &Arc<RwLock<SessionRepository>>,
        store: &Arc<DebouncedStore>,
        session_id: &str,
    ) -> Option<JoinHandle<()>> {
        let snippet = {
            let repo = repository.read();
            if !self.qualifies(&repo, session_id) {
                return None;
            }
            let session = repo.session(session_id)?;
            build_snippet(session, self.min_messages, self.max_snippet_chars)
        };

        let permit = {
            let mut attempted = self.attempted.lock();
            if attempted.contains(session_id) {
                return None;
            }
            if self
                .in_flight
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                debug!("Naming already in flight, skipping {}", session_id);
                return None;
            }
            attempted.insert(session_id.to_string());
            InFlightPermit(Arc::clone(&self.in_flight))
        };

        let generator = Arc::clone(&self.generator);
        let repository = Arc::clone(repository);
        let store = Arc::clone(store);
        let session_id = session_id.to_string();

        debug!("Requesting a name for {}", session_id);
        let span = session_span(&session_id);
        let task = async move {
            let _permit = permit;
            match generator.propose_name(&snippet).await {
                Ok(raw) => {
                    let name = clean_name(&raw);
                    let renamed = repository.write().rename_session(&session_id, &name);
                    if renamed {
                        info!("Named session {} {:?}", session_id, name);
                        store.schedule(repository.read().snapshot());
                    } else {
                        debug!("Session {} was renamed or removed meanwhile", session_id);
                    }
                }
                Err(e) => warn!("Failed to generate chat name for {}: {}", session_id, e),
            }
        };
        Some(tokio::spawn(task.instrument(span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::Message;

    #[test]
    fn test_snippet_skips_images_and_labels_senders() {
        let mut session = ChatSession::new("New Chat", "Hello! How can I help?");
        session.push(Message::user("Draw me"));
        session.push(Message::ai_image("Image generated for: \"x\"", "data:image/png;base64,AA", "x"));
        session.push(Message::ai("Done"));
        session.push(Message::user("Thanks"));
        session.push(Message::ai("Anytime"));

        let snippet = build_snippet(&session, 3, 400);
        assert_eq!(
            snippet,
            "Aura: Hello! How can I help?\nUser: Draw me\nAura: Done\nUser: Thanks"
        );
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let mut session = ChatSession::new("New Chat", "héllo wörld");
        session.push(Message::user("ünïcode"));
        let snippet = build_snippet(&session, 3, 8);
        assert_eq!(snippet, "Aura: hé");
        assert_eq!(snippet.chars().count(), 8);
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  \"Rust Lifetimes\"  "), "Rust Lifetimes");
        assert_eq!(clean_name("“Trip Plans”\nextra"), "Trip Plans");
        assert_eq!(clean_name("   "), "Chat Summary");
        assert_eq!(clean_name("\"\""), "Chat Summary");
    }
}
