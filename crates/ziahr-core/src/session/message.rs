//! Chat message types.

use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Typed by the user. Rendered as literal text.
    User,
    /// Answer from the HR assistant. Rendered as markdown.
    #[serde(alias = "assistant")]
    Bot,
    /// Client or server notice (escalation confirmations, errors).
    System,
}

impl MessageType {
    /// Returns true for message types whose content is markdown.
    pub fn is_markdown(&self) -> bool {
        !matches!(self, Self::User)
    }
}

/// A single message in a chat thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Client-side key. Generated when the server does not provide one.
    #[serde(default = "new_message_id")]
    pub id: String,
    /// The author of the message.
    #[serde(rename = "type", alias = "role")]
    pub message_type: MessageType,
    /// Plain text for user messages, markdown/HTML for bot and system messages.
    pub content: String,
    /// Timestamp when the message was created (RFC 3339).
    pub timestamp: String,
}

fn new_message_id() -> String {
    format!("msg-{}", uuid::Uuid::new_v4())
}

impl Message {
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            message_type,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageType::User, content)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(MessageType::Bot, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageType::System, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_without_id() {
        let json = r#"{"role": "assistant", "content": "Hi", "timestamp": "2026-01-01T10:00:00Z"}"#;
        let message: Message = serde_json::from_str(json).unwrap();

        assert_eq!(message.message_type, MessageType::Bot);
        assert!(message.id.starts_with("msg-"));
    }

    #[test]
    fn test_type_field_roundtrips_lowercase() {
        let message = Message::user("hello");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "user");
    }
}
