//! Settings persistence under `hr_assistant_settings`.

use std::sync::Arc;
use ziahr_core::error::Result;
use ziahr_core::settings::Settings;
use ziahr_core::storage::{read_json, write_json, KeyValueStore, SETTINGS_KEY};

#[derive(Clone)]
pub struct SettingsRepository {
    storage: Arc<dyn KeyValueStore>,
}

impl SettingsRepository {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Loads settings; missing or malformed values yield the defaults.
    pub fn load(&self) -> Result<Settings> {
        Ok(read_json(self.storage.as_ref(), SETTINGS_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        write_json(self.storage.as_ref(), SETTINGS_KEY, settings)
    }

    /// Loads, applies `f`, saves. Returns the saved settings.
    pub fn update<F>(&self, f: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load()?;
        f(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ziahr_core::settings::Theme;
    use ziahr_core::storage::MemoryStore;

    #[test]
    fn test_defaults_when_missing() {
        let repo = SettingsRepository::new(Arc::new(MemoryStore::new()));
        assert_eq!(repo.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_update_persists() {
        let repo = SettingsRepository::new(Arc::new(MemoryStore::new()));
        repo.update(|s| s.theme = Theme::Dark).unwrap();

        assert_eq!(repo.load().unwrap().theme, Theme::Dark);
    }
}
