//! Deep-link location of the active chat.
//!
//! Mirrors the `chat=<id>` query parameter of the web client. Updates replace
//! the current entry; they never navigate.

use std::sync::{Arc, RwLock};

/// Query parameter carrying the active chat id.
pub const CHAT_PARAM: &str = "chat";

pub trait ChatLocation: Send + Sync {
    /// Current value of the `chat` parameter.
    fn chat_param(&self) -> Option<String>;

    /// Replaces the `chat` parameter (`None` removes it).
    fn replace_chat_param(&self, session_id: Option<&str>);
}

/// Location kept in memory, used by the terminal client and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    chat: Arc<RwLock<Option<String>>>,
}

impl MemoryLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts at a deep link, e.g. `--chat chat_123` on the command line.
    pub fn with_chat(session_id: impl Into<String>) -> Self {
        Self {
            chat: Arc::new(RwLock::new(Some(session_id.into()))),
        }
    }

    /// Renders the location as a query string, e.g. `?chat=chat_1`.
    pub fn query_string(&self) -> String {
        match self.chat_param() {
            Some(id) => format!("?{}={}", CHAT_PARAM, id),
            None => String::new(),
        }
    }
}

impl ChatLocation for MemoryLocation {
    fn chat_param(&self) -> Option<String> {
        self.chat.read().ok().and_then(|chat| chat.clone())
    }

    fn replace_chat_param(&self, session_id: Option<&str>) {
        if let Ok(mut chat) = self.chat.write() {
            *chat = session_id.map(str::to_string);
        }
    }
}
