//! Path resolution for the ZiaHR client.
//!
//! ```text
//! ~/.config/ziahr/            # Config directory
//! └── config.toml             # ClientConfig
//!
//! ~/.local/share/ziahr/       # Data directory (ZIAHR_DATA_DIR overrides)
//! ├── storage/                # Key-value store, one JSON file per key
//! └── logs/                   # Daily rolling log files
//! ```

use std::path::{Path, PathBuf};
use ziahr_core::error::{Result, ZiahrError};

const APP_DIR: &str = "ziahr";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ZIAHR_DATA_DIR";

/// Resolved directories of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZiahrPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ZiahrPaths {
    /// Resolves the platform directories, honoring `ZIAHR_DATA_DIR`.
    pub fn resolve() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ZiahrError::config("Cannot find config directory"))?
            .join(APP_DIR);

        let data_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .ok_or_else(|| ZiahrError::config("Cannot find data directory"))?
                .join(APP_DIR),
        };

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Places everything under `base` (tests, portable installs).
    pub fn under(base: &Path) -> Self {
        Self {
            config_dir: base.join("config"),
            data_dir: base.join("data"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
