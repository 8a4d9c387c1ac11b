//! Preferences of the settings modal.

use std::sync::Arc;
use ziahr_core::error::{Result, ZiahrError};
use ziahr_core::session::ChatSession;
use ziahr_core::settings::{Settings, Theme};
use ziahr_core::storage::KeyValueStore;
use ziahr_infrastructure::SettingsRepository;

pub struct SettingsService {
    repository: SettingsRepository,
}

impl SettingsService {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            repository: SettingsRepository::new(storage),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        self.repository.load()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<Settings> {
        tracing::debug!("[SettingsService] Theme -> {}", theme);
        self.repository.update(|s| s.theme = theme)
    }

    pub fn set_language(&self, language: &str) -> Result<Settings> {
        let language = language.trim();
        if language.is_empty() {
            return Err(ZiahrError::invalid_input("Language cannot be empty"));
        }
        self.repository
            .update(|s| s.language = language.to_lowercase())
    }

    pub fn set_voice_enabled(&self, enabled: bool) -> Result<Settings> {
        self.repository.update(|s| s.voice_enabled = enabled)
    }

    pub fn set_always_show_code(&self, enabled: bool) -> Result<Settings> {
        self.repository.update(|s| s.always_show_code = enabled)
    }

    pub fn set_show_suggestions(&self, enabled: bool) -> Result<Settings> {
        self.repository.update(|s| s.show_suggestions = enabled)
    }

    pub fn archived_chats(&self) -> Result<Vec<ChatSession>> {
        Ok(self.repository.load()?.archived_chats)
    }
}
