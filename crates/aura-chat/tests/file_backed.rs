mod support;

use std::sync::Arc;

use tempfile::TempDir;

use aura_chat::{ChatOrchestrator, ChatSettings};
use aura_core::Theme;
use aura_llm::ModelStack;
use aura_session::{FileSessionStore, FileStoreConfig};

use support::*;

fn models() -> ModelStack {
    ModelStack {
        chat: Arc::new(MockChatModel::echo()),
        image: Arc::new(MockImageGenerator::succeeding()),
        naming: Arc::new(MockNamer::returning("Persisted Title")),
    }
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(
        FileSessionStore::new(FileStoreConfig::new(temp_dir.path()))
            .await
            .unwrap(),
    );

    let orchestrator =
        ChatOrchestrator::bootstrap(store.clone(), models(), ChatSettings::default()).await;
    let id = orchestrator.active_session_id();
    let report = orchestrator.send_message("remember this").await;
    report.naming.unwrap().await.unwrap();
    orchestrator.set_theme(Theme::Light).await;
    orchestrator.shutdown().await;
    drop(orchestrator);

    assert!(store.sessions_path().exists());

    let restored = ChatOrchestrator::bootstrap(store, models(), ChatSettings::default()).await;
    assert_eq!(restored.active_session_id(), id);
    assert_eq!(restored.theme(), Theme::Light);

    let session = restored.active_session().unwrap();
    assert_eq!(session.name, "Persisted Title");
    assert_eq!(session.messages.len(), 3);
    assert_eq!(session.messages[2].text, "Echo: remember this");
}

#[tokio::test]
async fn test_corrupt_file_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(FileStoreConfig::new(temp_dir.path()))
        .await
        .unwrap();
    std::fs::write(store.sessions_path(), "{ not json").unwrap();

    let orchestrator =
        ChatOrchestrator::bootstrap(Arc::new(store), models(), ChatSettings::default()).await;
    let sessions = orchestrator.list_sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].message_count, 1);
}
