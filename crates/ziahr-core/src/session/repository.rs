//! Session store trait.
//!
//! Defines the interface for persisting the list of chat summaries.

use super::model::ChatSession;
use crate::error::Result;
use async_trait::async_trait;

/// Whole-list persistence of chat summaries.
///
/// There is deliberately no partial-update API: callers read the full list,
/// mutate it in memory and write the full list back. Two writers racing on
/// the same storage area lose one update (last writer wins).
///
/// # Implementation Notes
///
/// - `load` must never fail on corrupt data; it returns an empty list instead.
/// - `load` returns pruned sessions, newest first.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads every stored session.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ChatSession>)`: pruned sessions, newest first
    /// - `Err(_)`: the storage area itself could not be read
    async fn load(&self) -> Result<Vec<ChatSession>>;

    /// Overwrites the stored list atomically.
    async fn save_all(&self, sessions: &[ChatSession]) -> Result<()>;

    /// Finds a session by id.
    async fn find_by_id(&self, session_id: &str) -> Result<Option<ChatSession>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|s| s.id == session_id))
    }
}
