//! User preferences stored under `hr_assistant_settings`.

use crate::session::ChatSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Blue,
    Green,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Light, Theme::Dark, Theme::Blue, Theme::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Blue => "blue",
            Theme::Green => "green",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown theme '{}' (expected light, dark, blue or green)", s))
    }
}

/// Preferences of the settings modal plus the archive list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub language: String,
    pub voice_enabled: bool,
    pub always_show_code: bool,
    pub show_suggestions: bool,
    pub archived_chats: Vec<ChatSession>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: "en".to_string(),
            voice_enabled: false,
            always_show_code: false,
            show_suggestions: true,
            archived_chats: Vec::new(),
        }
    }
}

impl Settings {
    pub fn is_archived(&self, session_id: &str) -> bool {
        self.archived_chats.iter().any(|s| s.id == session_id)
    }
}
