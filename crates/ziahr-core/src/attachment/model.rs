//! Attachment domain model.

use crate::api::UploadedFileInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upload state of a pending attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    Uploading,
    Success,
    Error,
}

/// A file the user picked for the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// An attachment tracked by the attachment manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// `file-<epoch-millis>-<sanitized-name>`
    pub id: String,
    pub name: String,
    pub size: usize,
    pub content_type: String,
    pub status: AttachmentStatus,
    /// Set once the message carrying the attachment was sent.
    pub locked: bool,
    /// Metadata returned by the upload endpoint.
    pub server_info: Option<UploadedFileInfo>,
}

impl Attachment {
    /// Creates an attachment in the `uploading` state.
    pub fn uploading(file: &PendingFile, now: DateTime<Utc>) -> Self {
        Self {
            id: attachment_id(&file.name, now),
            name: file.name.clone(),
            size: file.bytes.len(),
            content_type: file.content_type(),
            status: AttachmentStatus::Uploading,
            locked: false,
            server_info: None,
        }
    }
}

/// Builds the client token of an attachment.
///
/// Characters outside `[A-Za-z0-9._-]` are replaced with `-`.
pub fn attachment_id(name: &str, now: DateTime<Utc>) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("file-{}-{}", now.timestamp_millis(), sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_id_sanitizes_name() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(
            attachment_id("Leave Policy (2026).pdf", now),
            "file-1700000000000-Leave-Policy--2026-.pdf"
        );
    }

    #[test]
    fn test_content_type_guess() {
        let file = PendingFile::new("handbook.pdf", vec![1, 2, 3]);
        assert_eq!(file.content_type(), "application/pdf");

        let unknown = PendingFile::new("blob.zzz", Vec::new());
        assert_eq!(unknown.content_type(), "application/octet-stream");
    }
}
