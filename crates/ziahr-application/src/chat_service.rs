//! The send path: user message, query, reply.

use crate::attachment_service::AttachmentService;
use crate::renderer::RenderedMessage;
use crate::session::SessionSynchronizer;
use crate::speech::ReadAloud;
use std::sync::Arc;
use std::time::Duration;
use ziahr_core::api::{EscalationRequest, FilePreview, HrApi, QueryRequest, QueryResponse};
use ziahr_core::config::{ClientConfig, RetryConfig};
use ziahr_core::error::{ApiErrorKind, Result, ZiahrError};
use ziahr_core::notification::{Notification, Notifier};
use ziahr_core::session::{Message, MessageType, SessionTrigger};

/// The assistant suggested handing the question to a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEscalation {
    /// Session the question was asked in.
    pub session_id: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Answered {
        session_id: String,
        reply: Message,
        escalation: Option<PendingEscalation>,
        audio_url: Option<String>,
    },
    /// The query failed for good; `reply` is the apology shown instead.
    Failed {
        session_id: String,
        kind: Option<ApiErrorKind>,
        reply: Message,
    },
    /// The session changed before the answer arrived; nothing was shown.
    Discarded { session_id: String },
}

impl SendOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Answered { session_id, .. }
            | Self::Failed { session_id, .. }
            | Self::Discarded { session_id } => session_id,
        }
    }
}

pub struct ChatService {
    sync: Arc<SessionSynchronizer>,
    attachments: Arc<AttachmentService>,
    api: Arc<dyn HrApi>,
    speech: Arc<ReadAloud>,
    notifier: Arc<dyn Notifier>,
    device_id: String,
    retry: RetryConfig,
}

impl ChatService {
    pub fn new(
        sync: Arc<SessionSynchronizer>,
        attachments: Arc<AttachmentService>,
        api: Arc<dyn HrApi>,
        speech: Arc<ReadAloud>,
        notifier: Arc<dyn Notifier>,
        device_id: String,
        config: &ClientConfig,
    ) -> Self {
        Self {
            sync,
            attachments,
            api,
            speech,
            notifier,
            device_id,
            retry: config.retry.clone(),
        }
    }

    pub fn synchronizer(&self) -> &Arc<SessionSynchronizer> {
        &self.sync
    }

    pub fn attachments(&self) -> &Arc<AttachmentService> {
        &self.attachments
    }

    /// Submits the input form.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome> {
        self.exchange(text, SessionTrigger::SendMessage).await
    }

    /// Sends a suggested question.
    pub async fn click_suggestion(&self, text: &str) -> Result<SendOutcome> {
        self.exchange(text, SessionTrigger::ClickSuggestion).await
    }

    async fn exchange(&self, text: &str, trigger: SessionTrigger) -> Result<SendOutcome> {
        let query = text.trim();
        if query.is_empty() {
            return Err(ZiahrError::invalid_input("Message cannot be empty"));
        }

        let ticket = self
            .sync
            .resolve_active_session(trigger)
            .await?
            .ok_or_else(|| ZiahrError::internal("No session resolved for an outgoing message"))?;
        let session_id = ticket.session_id.clone();

        self.sync.append_message(Message::user(query)).await?;
        self.sync.save_session(true).await?;
        self.speech.stop_all_speech();

        let request = QueryRequest {
            query: query.to_string(),
            device_id: self.device_id.clone(),
            files_info: self.attachments.lock_batch().await,
        };

        let result = tokio::select! {
            biased;
            _ = ticket.stale() => None,
            result = self.query_with_retry(&request) => Some(result),
        };
        self.attachments.begin_batch().await;

        let result = match result {
            Some(result) if !ticket.is_stale() => result,
            _ => {
                tracing::debug!("[ChatService] Dropping response for replaced session {}", session_id);
                return Ok(SendOutcome::Discarded { session_id });
            }
        };

        match result {
            Ok(response) => {
                let reply = Message::bot(response.response);
                self.sync.append_message(reply.clone()).await?;
                self.sync.save_session(true).await?;

                let escalation = response.escalated.then(|| PendingEscalation {
                    session_id: session_id.clone(),
                    query: query.to_string(),
                });
                Ok(SendOutcome::Answered {
                    session_id,
                    reply,
                    escalation,
                    audio_url: response.audio_url,
                })
            }
            Err(e) => {
                tracing::error!("[ChatService] Query for {} failed: {}", session_id, e);
                self.notifier.notify(Notification::error(failure_notice(&e)));

                let reply = Message::bot(apology(&e));
                self.sync.append_message(reply.clone()).await?;
                self.sync.save_session(true).await?;
                Ok(SendOutcome::Failed {
                    session_id,
                    kind: e.api_kind(),
                    reply,
                })
            }
        }
    }

    /// One automatic retry for server-class failures.
    async fn query_with_retry(&self, request: &QueryRequest) -> Result<QueryResponse> {
        match self.api.query(request).await {
            Err(e) if e.is_retryable() => {
                let delay = self.retry_delay(&e);
                tracing::warn!("[ChatService] Query failed ({}), retrying in {:?}", e, delay);
                tokio::time::sleep(delay).await;
                self.api.query(request).await
            }
            other => other,
        }
    }

    fn retry_delay(&self, error: &ZiahrError) -> Duration {
        match error.api_kind() {
            Some(ApiErrorKind::RateLimit) => Duration::from_millis(self.retry.rate_limit_delay_ms),
            _ => Duration::from_millis(self.retry.server_error_delay_ms),
        }
    }

    /// Hands an escalated question to HR and records the confirmation.
    ///
    /// The confirmation joins the thread only while the session the question
    /// came from is still the one shown.
    pub async fn confirm_escalation(&self, pending: &PendingEscalation) -> Result<Message> {
        let request = EscalationRequest {
            query: pending.query.clone(),
            device_id: self.device_id.clone(),
        };

        let response = match self.api.confirm_escalation(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("[ChatService] Escalation failed: {}", e);
                self.notifier
                    .notify(Notification::error("Could not escalate your question"));
                return Err(e);
            }
        };

        let notice = Message::system(response.message.clone());
        if self.sync.context().is_active(&pending.session_id) {
            self.sync.append_message(notice.clone()).await?;
            self.sync.save_session(true).await?;
        } else {
            tracing::debug!(
                "[ChatService] {} is no longer shown, escalation notice not recorded",
                pending.session_id
            );
        }

        if response.success == Some(false) {
            self.notifier.notify(Notification::warning(response.message));
        } else {
            self.notifier
                .notify(Notification::success("Your question was sent to HR"));
        }
        Ok(notice)
    }

    /// "New Chat": no session until the next message.
    pub async fn new_chat(&self) -> Result<()> {
        self.sync
            .resolve_active_session(SessionTrigger::ExplicitNewChat)
            .await?;
        self.attachments.reset().await;
        self.speech.stop_all_speech();
        Ok(())
    }

    /// Deletes the server-side history of this device and every local chat.
    pub async fn clear_history(&self) -> Result<()> {
        self.api.clear_history(&self.device_id).await?;
        self.sync.clear_all().await?;
        self.attachments.reset().await;
        self.notifier
            .notify(Notification::success("Chat history cleared"));
        Ok(())
    }

    /// Reads a bot message aloud. Returns the utterance id, or `None` when
    /// read-aloud is turned off in the settings.
    pub fn read_aloud(&self, message: &RenderedMessage) -> Result<Option<u64>> {
        if message.message_type != MessageType::Bot {
            return Err(ZiahrError::invalid_input("Only answers can be read aloud"));
        }
        if !self.sync.settings().load()?.voice_enabled {
            self.notifier
                .notify(Notification::info("Read aloud is turned off in settings"));
            return Ok(None);
        }

        let utterance = self.speech.read_aloud(&message.text_content);
        tracing::debug!("[ChatService] Reading {} aloud as utterance {}", message.key, utterance);
        Ok(Some(utterance))
    }

    pub async fn preview_file(&self, filename: &str) -> Result<FilePreview> {
        self.api.file_preview(filename).await
    }

    pub fn shutdown(&self) {
        self.speech.stop_all_speech();
    }
}

fn failure_notice(error: &ZiahrError) -> String {
    match error.api_kind() {
        Some(ApiErrorKind::Network) => "Cannot reach the server".to_string(),
        Some(ApiErrorKind::RateLimit) => "Too many requests, please slow down".to_string(),
        Some(ApiErrorKind::Authentication) => "Please log in again".to_string(),
        Some(kind) => format!("Request failed ({})", kind),
        None => "Request failed".to_string(),
    }
}

fn apology(error: &ZiahrError) -> String {
    match error.api_kind() {
        Some(ApiErrorKind::RateLimit) => {
            "I'm receiving a lot of questions right now. Please wait a moment and try again."
        }
        Some(ApiErrorKind::Network) => {
            "I couldn't reach the HR assistant. Please check your connection and try again."
        }
        Some(ApiErrorKind::Authentication) => "Your session has expired. Please log in again.",
        Some(ApiErrorKind::Validation) => {
            "I couldn't process that question. Please rephrase it and try again."
        }
        _ => "I'm sorry, something went wrong while answering your question. Please try again.",
    }
    .to_string()
}
