//! Chat session summary model.
//!
//! A `ChatSession` is what the sidebar knows about a conversation. The
//! messages themselves live on the server and in the synchronizer's thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to a session before its first message.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Summary of a single chat conversation, persisted under `ziahr_chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// `chat_<epoch-millis>`
    pub id: String,
    pub title: String,
    /// RFC 3339. Bumped only when a message is appended.
    pub timestamp: String,
    #[serde(default)]
    pub message_count: usize,
}

impl ChatSession {
    /// Creates a summary with the default title and no messages.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            message_count: 0,
        }
    }

    /// True for the placeholder sessions that are never persisted: default
    /// title and no messages.
    pub fn is_empty_default(&self) -> bool {
        self.title == DEFAULT_TITLE && self.message_count == 0
    }

    /// True if the user (or a first message) gave this session a title.
    pub fn has_custom_title(&self) -> bool {
        !self.title.is_empty() && self.title != DEFAULT_TITLE
    }

    /// Parses the timestamp; `None` for missing or malformed values.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Builds a session id from a point in time.
pub fn session_id_at(now: DateTime<Utc>) -> String {
    format!("chat_{}", now.timestamp_millis())
}

/// Derives a sidebar title from the first user message.
///
/// Messages longer than `max_chars` characters are cut to `max_chars`
/// characters followed by `"..."`; shorter ones are kept verbatim.
pub fn derive_title(first_message: &str, max_chars: usize) -> String {
    let trimmed = first_message.trim();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    if trimmed.chars().count() > max_chars {
        let head: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_message_is_verbatim() {
        assert_eq!(
            derive_title("What is the leave policy?", 30),
            "What is the leave policy?"
        );
    }

    #[test]
    fn test_derive_title_exactly_thirty_chars() {
        let message = "a".repeat(30);
        assert_eq!(derive_title(&message, 30), message);
    }

    #[test]
    fn test_derive_title_truncates_long_message() {
        let message = "How many vacation days do I get after five years?";
        let title = derive_title(message, 30);

        assert_eq!(title, "How many vacation days do I ge...");
        assert_eq!(title.chars().count(), 33);
    }

    #[test]
    fn test_derive_title_counts_characters_not_bytes() {
        let message = "é".repeat(31);
        let title = derive_title(&message, 30);
        assert_eq!(title, format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_empty_default_predicate() {
        let mut session = ChatSession::new("chat_1");
        assert!(session.is_empty_default());

        session.message_count = 1;
        assert!(!session.is_empty_default());

        session.message_count = 0;
        session.title = "Renamed".to_string();
        assert!(!session.is_empty_default());
    }

    #[test]
    fn test_session_id_format() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(session_id_at(now), "chat_1772366400000");
    }

    #[test]
    fn test_legacy_entry_without_count() {
        let json = r#"{"id":"chat_1","title":"Benefits","timestamp":"2026-01-01T00:00:00Z"}"#;
        let session: ChatSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.message_count, 0);
        assert!(session.has_custom_title());
    }
}
