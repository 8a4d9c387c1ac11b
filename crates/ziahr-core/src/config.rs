//! Client configuration model.
//!
//! The configuration is stored as TOML (`~/.config/ziahr/config.toml`) and
//! loaded by `ziahr_infrastructure::ConfigService`. Every field has a default
//! so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Root configuration of the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the ZiaHR API (without trailing `/api`).
    pub api_base_url: String,
    /// Timeout applied to every HTTP request.
    pub request_timeout_secs: u64,
    /// Number of messages fetched per backward page.
    pub page_size: usize,
    /// Maximum number of pending attachments per outgoing message.
    pub max_attachments: usize,
    /// Number of characters kept when deriving a title from a message.
    pub title_max_chars: usize,
    /// Delay before a failed upload removes itself from the pending set.
    pub failed_upload_dismiss_ms: u64,
    /// Auto-dismiss delay of transient notifications.
    pub notification_timeout_ms: u64,
    /// Automatic retry of the main query.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            page_size: 20,
            max_attachments: 7,
            title_max_chars: 30,
            failed_upload_dismiss_ms: 3_000,
            notification_timeout_ms: 3_000,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn failed_upload_dismiss(&self) -> Duration {
        Duration::from_millis(self.failed_upload_dismiss_ms)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }

    /// Returns the API root, e.g. `http://localhost:5000/api`.
    pub fn api_root(&self) -> String {
        format!("{}/api", self.api_base_url.trim_end_matches('/'))
    }
}

/// Delays of the single automatic retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before retrying a server-class failure.
    pub server_error_delay_ms: u64,
    /// Delay before retrying a rate-limited request.
    pub rate_limit_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            server_error_delay_ms: 2_000,
            rate_limit_delay_ms: 5_000,
        }
    }
}
