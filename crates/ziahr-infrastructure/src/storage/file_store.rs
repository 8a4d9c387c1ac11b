//! File-backed storage area.
//!
//! Each key is one JSON document in the storage directory:
//!
//! ```text
//! ~/.local/share/ziahr/storage/
//! ├── ziahr_chats.json
//! ├── ziahr_device_id.json
//! ├── hr_assistant_settings.json
//! ├── user_data.json
//! └── auth_token.json
//! ```

use super::atomic_file::AtomicFile;
use std::path::{Path, PathBuf};
use ziahr_core::error::{Result, ZiahrError};
use ziahr_core::storage::KeyValueStore;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<AtomicFile> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ZiahrError::invalid_input(format!(
                "Invalid storage key: '{}'",
                key
            )));
        }
        Ok(AtomicFile::new(self.dir.join(format!("{}.json", key))))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.file_for(key)?.read()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        tracing::trace!("[FileStore] set '{}' ({} bytes)", key, value.len());
        self.file_for(key)?.write(value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.file_for(key)?.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_keys_map_to_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("storage"));

        store.set("ziahr_chats", "[]").unwrap();

        assert!(temp_dir.path().join("storage/ziahr_chats.json").exists());
        assert_eq!(store.get("ziahr_chats").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_remove_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("auth_token", "\"abc\"").unwrap();
        store.remove("auth_token").unwrap();
        assert!(store.get("auth_token").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert!(store.set("../escape", "1").is_err());
        assert!(store.get("").is_err());
    }
}
