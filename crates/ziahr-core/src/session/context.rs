//! The active-session pointer.
//!
//! `SessionContext` is the single writer of "which session is active". Every
//! activation hands out a fresh cancellation token; replacing or clearing the
//! active session cancels the previous one, so work started for an old
//! session can tell that its result must be dropped.

use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

/// What caused the synchronizer to resolve the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTrigger {
    /// The user submitted the input form.
    SendMessage,
    /// The user clicked a suggested question.
    ClickSuggestion,
    /// The user pressed "New Chat".
    ExplicitNewChat,
    /// A session was opened from the sidebar, search, or the URL.
    LoadById(String),
}

/// Handle describing one activation of a session.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    pub session_id: String,
    token: CancellationToken,
}

impl SessionTicket {
    /// True once the session this ticket belongs to is no longer active.
    pub fn is_stale(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the ticket goes stale.
    pub async fn stale(&self) {
        self.token.cancelled().await
    }
}

#[derive(Debug, Default)]
struct Active {
    session_id: Option<String>,
    token: CancellationToken,
}

/// Shared, cloneable view of the active session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Active>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the active session id, if any.
    pub fn active(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|active| active.session_id.clone())
    }

    /// Returns a ticket for the active session, if any.
    pub fn ticket(&self) -> Option<SessionTicket> {
        let active = self.inner.read().ok()?;
        active.session_id.as_ref().map(|id| SessionTicket {
            session_id: id.clone(),
            token: active.token.clone(),
        })
    }

    /// Makes `session_id` active and returns its ticket.
    ///
    /// Re-activating the already active session keeps the current ticket
    /// valid.
    pub fn set_active(&self, session_id: impl Into<String>) -> SessionTicket {
        let session_id = session_id.into();
        let mut active = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if active.session_id.as_deref() != Some(session_id.as_str()) {
            active.token.cancel();
            active.token = CancellationToken::new();
            active.session_id = Some(session_id.clone());
        }

        SessionTicket {
            session_id,
            token: active.token.clone(),
        }
    }

    /// Clears the pointer. The next user message creates a new session.
    pub fn clear(&self) {
        let mut active = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        active.token.cancel();
        active.token = CancellationToken::new();
        active.session_id = None;
    }

    /// True if `session_id` is the active session.
    pub fn is_active(&self, session_id: &str) -> bool {
        self.active().as_deref() == Some(session_id)
    }
}
