//! Session store over the key-value storage area.

use async_trait::async_trait;
use std::sync::Arc;
use ziahr_core::error::{Result, ZiahrError};
use ziahr_core::session::{prune_sessions, sort_newest_first, ChatSession, SessionStore};
use ziahr_core::storage::{read_json, write_json, KeyValueStore, CHATS_KEY};

/// Keeps the chat list as one JSON array under `ziahr_chats`.
///
/// Reads never fail on corrupt data: a malformed array is treated as empty
/// (and overwritten by the next save).
#[derive(Clone)]
pub struct LocalSessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl LocalSessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Reads the raw array without pruning.
    pub fn load_raw(&self) -> Result<Vec<ChatSession>> {
        Ok(read_json::<Vec<ChatSession>>(self.storage.as_ref(), CHATS_KEY)?.unwrap_or_default())
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    async fn load(&self) -> Result<Vec<ChatSession>> {
        let storage = self.storage.clone();
        let raw = tokio::task::spawn_blocking(move || {
            read_json::<Vec<ChatSession>>(storage.as_ref(), CHATS_KEY)
        })
        .await
        .map_err(|e| ZiahrError::internal(format!("Failed to join task: {}", e)))??
        .unwrap_or_default();

        let before = raw.len();
        let mut sessions = prune_sessions(raw);
        if sessions.len() != before {
            tracing::debug!(
                "[LocalSessionStore] Pruned {} stale entries",
                before - sessions.len()
            );
        }
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    async fn save_all(&self, sessions: &[ChatSession]) -> Result<()> {
        let storage = self.storage.clone();
        let sessions = sessions.to_vec();
        tracing::debug!("[LocalSessionStore] Saving {} sessions", sessions.len());

        tokio::task::spawn_blocking(move || write_json(storage.as_ref(), CHATS_KEY, &sessions))
            .await
            .map_err(|e| ZiahrError::internal(format!("Failed to join task: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ziahr_core::session::DEFAULT_TITLE;
    use ziahr_core::storage::MemoryStore;

    fn session(id: &str, title: &str, timestamp: &str, count: usize) -> ChatSession {
        ChatSession {
            id: id.to_string(),
            title: title.to_string(),
            timestamp: timestamp.to_string(),
            message_count: count,
        }
    }

    #[tokio::test]
    async fn test_load_empty_storage() {
        let store = LocalSessionStore::new(Arc::new(MemoryStore::new()));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_storage_defaults_to_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(CHATS_KEY, "{{{").unwrap();
        let store = LocalSessionStore::new(storage);

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_prunes_and_sorts() {
        let store = LocalSessionStore::new(Arc::new(MemoryStore::new()));
        store
            .save_all(&[
                session("chat_1", "Old", "2026-01-01T00:00:00Z", 2),
                session("chat_2", DEFAULT_TITLE, "2026-01-03T00:00:00Z", 0),
                session("chat_3", "New", "2026-01-02T00:00:00Z", 2),
            ])
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        let ids: Vec<&str> = loaded.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["chat_3", "chat_1"]);

        // The raw array is untouched until the next write.
        assert_eq!(store.load_raw().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = LocalSessionStore::new(Arc::new(MemoryStore::new()));
        store
            .save_all(&[session("chat_7", "Benefits", "2026-01-01T00:00:00Z", 4)])
            .await
            .unwrap();

        assert!(store.find_by_id("chat_7").await.unwrap().is_some());
        assert!(store.find_by_id("chat_8").await.unwrap().is_none());
    }
}
