//! Uploads of the pending attachments.
//!
//! Admission is decided by `AttachmentManager`; this service reports
//! rejections, uploads the accepted files concurrently and schedules the
//! removal of failed uploads.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use ziahr_core::api::{HrApi, UploadedFileInfo};
use ziahr_core::attachment::{Attachment, AttachmentManager, PendingFile, RejectReason, UploadAdmission};
use ziahr_core::config::ClientConfig;
use ziahr_core::notification::{Notification, Notifier};

pub struct AttachmentService {
    manager: Arc<Mutex<AttachmentManager>>,
    api: Arc<dyn HrApi>,
    notifier: Arc<dyn Notifier>,
    max_attachments: usize,
    dismiss_after: Duration,
}

impl AttachmentService {
    pub fn new(api: Arc<dyn HrApi>, notifier: Arc<dyn Notifier>, config: &ClientConfig) -> Self {
        Self {
            manager: Arc::new(Mutex::new(AttachmentManager::new(config.max_attachments))),
            api,
            notifier,
            max_attachments: config.max_attachments,
            dismiss_after: config.failed_upload_dismiss(),
        }
    }

    pub async fn attachments(&self) -> Vec<Attachment> {
        self.manager.lock().await.attachments().to_vec()
    }

    /// Admits `files` and uploads the accepted ones.
    ///
    /// Returns once every upload has settled.
    pub async fn handle_upload(&self, files: Vec<PendingFile>) -> UploadAdmission {
        let admission = self.admit(&files).await;
        self.upload(&admission, &files).await;
        admission
    }

    /// Admission only: accepted files show as `uploading` right away.
    pub async fn admit(&self, files: &[PendingFile]) -> UploadAdmission {
        let admission = self.manager.lock().await.handle_upload(files);

        for name in admission.rejected_for(RejectReason::Duplicate) {
            self.notifier.notify(Notification::warning(format!(
                "File '{}' is already attached",
                name
            )));
        }
        if !admission.rejected_for(RejectReason::LimitReached).is_empty() {
            self.notifier.notify(Notification::warning(format!(
                "Maximum file limit reached ({} files)",
                self.max_attachments
            )));
        }
        if !admission.rejected_for(RejectReason::Locked).is_empty() {
            self.notifier.notify(Notification::warning(
                "Attachments are locked until the current message is answered",
            ));
        }

        tracing::debug!(
            "[AttachmentService] Admitted {} of {} files",
            admission.accepted.len(),
            files.len()
        );
        admission
    }

    /// Uploads the accepted files concurrently; each settles independently.
    pub async fn upload(&self, admission: &UploadAdmission, files: &[PendingFile]) {
        let uploads = admission.accepted.iter().filter_map(|attachment| {
            files
                .iter()
                .find(|f| f.name == attachment.name)
                .map(|file| self.upload_one(attachment.id.clone(), file))
        });
        join_all(uploads).await;
    }

    async fn upload_one(&self, attachment_id: String, file: &PendingFile) {
        match self.api.upload_document(file).await {
            Ok(info) => {
                tracing::debug!("[AttachmentService] Uploaded {}", file.name);
                self.manager.lock().await.mark_success(&attachment_id, info);
            }
            Err(e) => {
                tracing::error!("[AttachmentService] Upload of {} failed: {}", file.name, e);
                self.manager.lock().await.mark_error(&attachment_id);
                self.notifier.notify(Notification::error(format!(
                    "Failed to upload '{}'",
                    file.name
                )));
                self.schedule_dismiss(attachment_id);
            }
        }
    }

    fn schedule_dismiss(&self, attachment_id: String) {
        let manager = self.manager.clone();
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if manager.lock().await.dismiss_failed(&attachment_id) {
                tracing::debug!("[AttachmentService] Dismissed failed {}", attachment_id);
            }
        });
    }

    /// Removes a pending attachment. No-op once the batch is locked.
    pub async fn remove(&self, attachment_id: &str) -> bool {
        self.manager.lock().await.remove(attachment_id)
    }

    /// Locks the batch for sending and returns its `files_info`.
    pub async fn lock_batch(&self) -> Vec<UploadedFileInfo> {
        let mut manager = self.manager.lock().await;
        let locked = manager.lock();
        let files_info = manager.files_info();
        tracing::debug!(
            "[AttachmentService] Locked {} attachments ({} uploaded)",
            locked.len(),
            files_info.len()
        );
        files_info
    }

    /// Clears the sent batch and accepts new files again.
    pub async fn begin_batch(&self) {
        self.manager.lock().await.begin_batch();
    }

    pub async fn reset(&self) {
        self.manager.lock().await.reset();
    }
}
