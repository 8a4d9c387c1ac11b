//! Pending attachment set of the input area.

use super::model::{Attachment, AttachmentStatus, PendingFile};
use crate::api::UploadedFileInfo;
use chrono::Utc;

/// Why a picked file was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A pending attachment (or an earlier file of the batch) has this name.
    Duplicate,
    /// The pending set is full.
    LimitReached,
    /// The current batch was already sent.
    Locked,
}

/// Result of `AttachmentManager::handle_upload`.
#[derive(Debug, Clone, Default)]
pub struct UploadAdmission {
    /// Attachments created in the `uploading` state, in pick order.
    pub accepted: Vec<Attachment>,
    /// Files that were dropped, with the reason.
    pub rejected: Vec<(String, RejectReason)>,
}

impl UploadAdmission {
    pub fn rejected_for(&self, reason: RejectReason) -> Vec<&str> {
        self.rejected
            .iter()
            .filter(|(_, r)| *r == reason)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Tracks the bounded set of attachments for the next message.
///
/// The manager is pure bookkeeping; network uploads are driven by the
/// application layer, which reports back through `mark_success` and
/// `mark_error`.
#[derive(Debug, Clone)]
pub struct AttachmentManager {
    max_attachments: usize,
    attachments: Vec<Attachment>,
    locked: bool,
}

impl AttachmentManager {
    pub fn new(max_attachments: usize) -> Self {
        Self {
            max_attachments,
            attachments: Vec::new(),
            locked: false,
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn get(&self, id: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == id)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Admits picked files into the pending set.
    ///
    /// Files are taken in order until the set is full. Names already pending
    /// (or repeated within `files`) are rejected. Nothing is admitted while
    /// the batch is locked.
    pub fn handle_upload(&mut self, files: &[PendingFile]) -> UploadAdmission {
        let mut admission = UploadAdmission::default();
        let now = Utc::now();

        for file in files {
            if self.locked {
                admission.rejected.push((file.name.clone(), RejectReason::Locked));
                continue;
            }

            if self.attachments.iter().any(|a| a.name == file.name) {
                admission
                    .rejected
                    .push((file.name.clone(), RejectReason::Duplicate));
                continue;
            }

            if self.attachments.len() >= self.max_attachments {
                admission
                    .rejected
                    .push((file.name.clone(), RejectReason::LimitReached));
                continue;
            }

            let mut attachment = Attachment::uploading(file, now);
            // Same-millisecond picks of names that sanitize identically.
            while self.get(&attachment.id).is_some() {
                attachment.id.push('_');
            }
            self.attachments.push(attachment.clone());
            admission.accepted.push(attachment);
        }

        admission
    }

    /// Records a finished upload. Returns false if the attachment is gone.
    pub fn mark_success(&mut self, id: &str, info: UploadedFileInfo) -> bool {
        match self.attachments.iter_mut().find(|a| a.id == id) {
            Some(attachment) => {
                attachment.status = AttachmentStatus::Success;
                attachment.server_info = Some(info);
                true
            }
            None => false,
        }
    }

    /// Records a failed upload. Returns false if the attachment is gone.
    pub fn mark_error(&mut self, id: &str) -> bool {
        match self.attachments.iter_mut().find(|a| a.id == id) {
            Some(attachment) => {
                attachment.status = AttachmentStatus::Error;
                true
            }
            None => false,
        }
    }

    /// Removes a pending attachment.
    ///
    /// A no-op returning false when the batch is locked or `id` is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.locked {
            return false;
        }
        let before = self.attachments.len();
        self.attachments.retain(|a| a.id != id);
        self.attachments.len() != before
    }

    /// Removes an attachment whose upload failed.
    ///
    /// Locked batches keep their entries; only `error` attachments go.
    pub fn dismiss_failed(&mut self, id: &str) -> bool {
        if self.locked {
            return false;
        }
        let before = self.attachments.len();
        self.attachments
            .retain(|a| !(a.id == id && a.status == AttachmentStatus::Error));
        self.attachments.len() != before
    }

    /// Locks the batch for sending and returns it.
    ///
    /// Every pending attachment becomes immutable. Only successful uploads
    /// contribute to `files_info`.
    pub fn lock(&mut self) -> Vec<Attachment> {
        for attachment in &mut self.attachments {
            attachment.locked = true;
        }
        self.locked = true;
        self.attachments.clone()
    }

    /// Clears the sent batch and unlocks the input area for new files.
    pub fn begin_batch(&mut self) {
        if self.locked {
            self.attachments.clear();
            self.locked = false;
        }
    }

    /// Forgets every attachment and unlocks (new chat).
    pub fn reset(&mut self) {
        self.attachments.clear();
        self.locked = false;
    }

    /// Server metadata of the locked batch, sent as `files_info`.
    pub fn files_info(&self) -> Vec<UploadedFileInfo> {
        self.attachments
            .iter()
            .filter(|a| a.status == AttachmentStatus::Success)
            .filter_map(|a| a.server_info.clone())
            .collect()
    }
}
