//! Configuration service.
//!
//! Loads `ClientConfig` from `config.toml`, creating the file with defaults
//! when it does not exist, and caches the result.

use crate::storage::AtomicFile;
use std::sync::{Arc, RwLock};
use ziahr_core::config::ClientConfig;
use ziahr_core::error::Result;

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "ZIAHR_API_URL";

#[derive(Debug, Clone)]
pub struct ConfigService {
    file: AtomicFile,
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new(file: AtomicFile) -> Self {
        Self {
            file,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the configuration, loading it on first access.
    ///
    /// Environment overrides are applied on every load and never written back.
    pub fn get_config(&self) -> Result<ClientConfig> {
        if let Ok(guard) = self.config.read() {
            if let Some(cached) = guard.as_ref() {
                return Ok(cached.clone());
            }
        }

        let mut loaded = self.load_or_create()?;
        apply_env_overrides(&mut loaded, std::env::var(API_URL_ENV).ok());

        if let Ok(mut guard) = self.config.write() {
            *guard = Some(loaded.clone());
        }
        Ok(loaded)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut guard) = self.config.write() {
            *guard = None;
        }
    }

    fn load_or_create(&self) -> Result<ClientConfig> {
        match self.file.read()? {
            Some(content) => {
                let config: ClientConfig = toml::from_str(&content)?;
                tracing::debug!("[ConfigService] Loaded {}", self.file.path().display());
                Ok(config)
            }
            None => {
                let config = ClientConfig::default();
                self.file.write(&toml::to_string_pretty(&config)?)?;
                tracing::info!(
                    "[ConfigService] Created default config at {}",
                    self.file.path().display()
                );
                Ok(config)
            }
        }
    }
}

fn apply_env_overrides(config: &mut ClientConfig, api_url: Option<String>) {
    if let Some(url) = api_url {
        let url = url.trim();
        if !url.is_empty() {
            config.api_base_url = url.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::new(AtomicFile::new(path.clone()));

        let config = service.load_or_create().unwrap();

        assert_eq!(config, ClientConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "page_size = 50\n\n[retry]\nrate_limit_delay_ms = 100\n").unwrap();

        let config = ConfigService::new(AtomicFile::new(path)).load_or_create().unwrap();

        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_attachments, 7);
        assert_eq!(config.retry.rate_limit_delay_ms, 100);
        assert_eq!(config.retry.server_error_delay_ms, 2_000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "page_size = [").unwrap();

        let err = ConfigService::new(AtomicFile::new(path))
            .load_or_create()
            .unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_env_override() {
        let mut config = ClientConfig::default();
        apply_env_overrides(&mut config, Some("https://hr.example.com ".to_string()));
        assert_eq!(config.api_base_url, "https://hr.example.com");

        apply_env_overrides(&mut config, Some("  ".to_string()));
        assert_eq!(config.api_base_url, "https://hr.example.com");
    }
}
