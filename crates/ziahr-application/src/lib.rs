//! Application layer of the ZiaHR client.
//!
//! Coordinates the domain types, the key-value store and the remote API into
//! the flows the user drives: sending messages, switching and paging through
//! sessions, attaching files, settings and login.

pub mod attachment_service;
pub mod auth_service;
pub mod chat_service;
pub mod renderer;
pub mod session;
pub mod settings_service;
pub mod speech;

#[cfg(test)]
pub(crate) mod test_support;

pub use attachment_service::AttachmentService;
pub use auth_service::{AuthService, Registration};
pub use chat_service::{ChatService, PendingEscalation, SendOutcome};
pub use renderer::{
    FeedbackState, InsertPosition, MessageRenderer, RenderedMessage, ThreadView,
};
pub use session::{BootstrapOutcome, LoadOutcome, PageFetch, SessionSynchronizer};
pub use settings_service::SettingsService;
pub use speech::{ReadAloud, SilentSpeech, SpeechChannel};
