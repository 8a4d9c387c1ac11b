//! File attachment domain module.

mod manager;
mod model;

pub use manager::{AttachmentManager, RejectReason, UploadAdmission};
pub use model::{attachment_id, Attachment, AttachmentStatus, PendingFile};
