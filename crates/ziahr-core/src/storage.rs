//! Client-side key-value storage area.
//!
//! The web client keeps its state in `localStorage`. This trait is the same
//! contract: string values addressed by string keys, whole-value reads and
//! writes.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Ordered list of chat summaries.
pub const CHATS_KEY: &str = "ziahr_chats";
/// Device identifier, generated once.
pub const DEVICE_ID_KEY: &str = "ziahr_device_id";
/// User preferences and the archive list.
pub const SETTINGS_KEY: &str = "hr_assistant_settings";
/// Logged-in user profile.
pub const USER_DATA_KEY: &str = "user_data";
/// Bearer token of the logged-in user.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
/// Set when the user deleted the last remaining chat; cleared on next start.
pub const JUST_EMPTIED_KEY: &str = "ziahr_just_emptied";

pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads and parses a JSON value.
///
/// Malformed JSON is treated like a missing key: the caller gets `None` and
/// a warning is logged. Corrupt storage never becomes an error.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("[Storage] Ignoring malformed JSON under '{}': {}", key, e);
            Ok(None)
        }
    }
}

/// Serializes `value` as JSON and stores it under `key`.
pub fn write_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Storage area kept in memory. Used in tests and for ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| crate::error::ZiahrError::storage(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| crate::error::ZiahrError::storage(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| crate::error::ZiahrError::storage(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_json_reads_as_missing() {
        let store = MemoryStore::new();
        store.set(CHATS_KEY, "[{not json").unwrap();

        let value: Option<Vec<String>> = read_json(&store, CHATS_KEY).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let store = MemoryStore::new();
        write_json(&store, "numbers", &vec![1, 2, 3]).unwrap();

        let value: Option<Vec<u32>> = read_json(&store, "numbers").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));

        store.remove("numbers").unwrap();
        let value: Option<Vec<u32>> = read_json(&store, "numbers").unwrap();
        assert!(value.is_none());
    }
}
