use std::sync::Arc;
use tempfile::TempDir;
use ziahr_core::session::{ChatSession, SessionStore};
use ziahr_core::storage::{KeyValueStore, CHATS_KEY};
use ziahr_infrastructure::{FileStore, LocalSessionStore, SettingsRepository, ZiahrPaths};

fn session(id: &str, title: &str, timestamp: &str, count: usize) -> ChatSession {
    ChatSession {
        id: id.to_string(),
        title: title.to_string(),
        timestamp: timestamp.to_string(),
        message_count: count,
    }
}

#[tokio::test]
async fn test_sessions_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let paths = ZiahrPaths::under(temp_dir.path());

    {
        let store = LocalSessionStore::new(Arc::new(FileStore::new(paths.storage_dir())));
        store
            .save_all(&[
                session("chat_1", "Leave policy", "2026-10-18T09:00:00Z", 2),
                session("chat_2", "Payroll dates", "2026-10-19T09:00:00Z", 4),
            ])
            .await
            .unwrap();
    }

    let reopened = LocalSessionStore::new(Arc::new(FileStore::new(paths.storage_dir())));
    let sessions = reopened.load().await.unwrap();

    let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["chat_2", "chat_1"]);
}

#[tokio::test]
async fn test_corrupt_file_reads_as_empty_and_is_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStore::new(temp_dir.path()));
    std::fs::write(temp_dir.path().join("ziahr_chats.json"), "{not json").unwrap();

    let store = LocalSessionStore::new(storage.clone());
    assert!(store.load().await.unwrap().is_empty());

    store
        .save_all(&[session("chat_9", "Benefits", "2026-10-19T10:00:00Z", 1)])
        .await
        .unwrap();

    let raw = storage.get(CHATS_KEY).unwrap().unwrap();
    assert!(raw.contains("\"messageCount\":1"));
}

#[tokio::test]
async fn test_empty_default_sessions_do_not_survive_load() {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalSessionStore::new(Arc::new(FileStore::new(temp_dir.path())));

    store
        .save_all(&[
            ChatSession::new("chat_100"),
            ChatSession::new("chat_200"),
            session("chat_300", "Holiday calendar", "2026-10-19T08:00:00Z", 2),
        ])
        .await
        .unwrap();

    let sessions = store.load().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, "chat_300");
}

#[test]
fn test_settings_share_the_storage_area() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStore::new(temp_dir.path()));
    let settings = SettingsRepository::new(storage);

    settings
        .update(|s| {
            s.archived_chats
                .push(session("chat_5", "Old question", "2026-09-01T00:00:00Z", 3))
        })
        .unwrap();

    assert!(temp_dir.path().join("hr_assistant_settings.json").exists());
    assert!(settings.load().unwrap().is_archived("chat_5"));
}
