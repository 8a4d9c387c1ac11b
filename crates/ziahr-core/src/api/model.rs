//! Request and response bodies of the ZiaHR API.

use crate::session::Message;
use serde::{Deserialize, Serialize};

/// Metadata of an uploaded document, echoed back in `files_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileInfo {
    #[serde(alias = "filename")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub device_id: String,
    pub files_info: Vec<UploadedFileInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse {
    /// HTML produced from the assistant's markdown.
    pub response: String,
    #[serde(default)]
    pub escalated: bool,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscalationRequest {
    pub query: String,
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EscalationResponse {
    #[serde(default)]
    pub success: Option<bool>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile stored under `user_data` after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: serde_json::Value,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub employee_id: String,
}

/// Generic `{success, message?}` body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Preview of an uploaded document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilePreview {
    #[serde(default)]
    pub success: bool,
    /// `text`, `pdf` or `docx`.
    pub content_type: String,
    /// Inline content for text documents.
    #[serde(default)]
    pub content: Option<String>,
    /// Server path for binary documents, rendered by an external viewer.
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Error body returned by the server on failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message carried by the body.
    pub fn describe(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .or_else(|| self.details.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_maps_to_file_info() {
        let json = r#"{"success": true, "filename": "handbook.pdf", "file_path": "/srv/data/raw/handbook.pdf", "file_size": 2048}"#;
        let info: UploadedFileInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.name, "handbook.pdf");
        assert_eq!(info.file_size, Some(2048));

        let echoed = serde_json::to_value(&info).unwrap();
        assert_eq!(echoed["name"], "handbook.pdf");
    }

    #[test]
    fn test_query_response_defaults() {
        let response: QueryResponse = serde_json::from_str(r#"{"response": "<p>Hi</p>"}"#).unwrap();
        assert!(!response.escalated);
        assert!(response.audio_url.is_none());
    }

    #[test]
    fn test_error_body_prefers_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error": "An error occurred", "message": "Please try again later.", "error_type": "RateLimitError"}"#,
        )
        .unwrap();
        assert_eq!(body.describe().as_deref(), Some("Please try again later."));
    }
}
