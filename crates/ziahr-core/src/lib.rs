//! Domain layer of the ZiaHR client: chat sessions, messages, attachments,
//! settings, and the contracts of the storage area and the remote API.

pub mod api;
pub mod attachment;
pub mod config;
pub mod error;
pub mod notification;
pub mod session;
pub mod settings;
pub mod storage;

// Re-export common error type
pub use error::{ApiErrorKind, Result, ZiahrError};
