//! Hand-written doubles shared by the application tests.

use crate::session::SessionSynchronizer;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use ziahr_core::api::{
    EscalationRequest, EscalationResponse, FilePreview, HrApi, LoginRequest, LoginResponse,
    PageResponse, QueryRequest, QueryResponse, RegisterRequest, StatusResponse, UploadedFileInfo,
    UserProfile, UserResponse,
};
use ziahr_core::attachment::PendingFile;
use ziahr_core::config::ClientConfig;
use ziahr_core::error::{ApiErrorKind, Result, ZiahrError};
use ziahr_core::notification::NotificationLog;
use ziahr_core::session::{MemoryLocation, Message};
use ziahr_core::storage::MemoryStore;
use ziahr_infrastructure::LocalSessionStore;

pub(crate) fn answer(html: &str) -> QueryResponse {
    QueryResponse {
        response: html.to_string(),
        escalated: false,
        audio_url: None,
        sources: Vec::new(),
        language: None,
    }
}

pub(crate) fn api_error(kind: ApiErrorKind) -> ZiahrError {
    let status = match kind {
        ApiErrorKind::Network => None,
        ApiErrorKind::Server => Some(500),
        ApiErrorKind::RateLimit => Some(429),
        ApiErrorKind::Authentication => Some(401),
        ApiErrorKind::Validation => Some(400),
        ApiErrorKind::NotFound => Some(404),
    };
    ZiahrError::api(kind, status, format!("{} failure", kind))
}

pub(crate) fn profile() -> UserProfile {
    UserProfile {
        id: serde_json::json!(7),
        email: "asha@example.com".to_string(),
        full_name: "Asha Rao".to_string(),
        company_name: Some("Acme".to_string()),
        employee_id: Some("E-1001".to_string()),
    }
}

/// Scriptable in-memory server.
#[derive(Default)]
pub(crate) struct MockApi {
    /// Server-side history per session, oldest first.
    pub history: Mutex<HashMap<String, Vec<Message>>>,
    /// Scripted answers for `query`; an empty queue answers "<p>OK</p>".
    pub query_results: Mutex<VecDeque<Result<QueryResponse>>>,
    pub query_requests: Mutex<Vec<QueryRequest>>,
    pub page_requests: Mutex<Vec<(String, u32, usize)>>,
    pub fail_pages: AtomicBool,
    pub fail_count: AtomicBool,
    /// Serve rows without a stored id: every fetch hands out new ids.
    pub fresh_row_ids: AtomicBool,
    pub issued_row_ids: AtomicUsize,
    /// Held by a test to keep page responses in flight.
    pub page_gate: tokio::sync::Mutex<()>,
    /// File names whose upload fails.
    pub failing_uploads: Mutex<HashSet<String>>,
    pub uploads: AtomicUsize,
    pub login_response: Mutex<Option<LoginResponse>>,
    pub user_response: Mutex<Option<Result<UserResponse>>>,
    pub logout_fails: AtomicBool,
    pub logouts: AtomicUsize,
    pub cleared_devices: Mutex<Vec<String>>,
    pub token: Mutex<Option<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_history(&self, session_id: &str, count: usize) {
        let messages = (0..count)
            .map(|i| {
                let mut message = if i % 2 == 0 {
                    Message::user(format!("question {}", i))
                } else {
                    Message::bot(format!("answer {}", i))
                };
                message.id = format!("{}-m{}", session_id, i);
                message
            })
            .collect();
        if let Ok(mut history) = self.history.lock() {
            history.insert(session_id.to_string(), messages);
        }
    }

    /// Adds a message to the server-side history, as another turn would.
    pub fn push_history(&self, session_id: &str, message: Message) {
        self.history
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    pub fn push_query_result(&self, result: Result<QueryResponse>) {
        self.query_results.lock().unwrap().push_back(result);
    }

    pub fn query_count(&self) -> usize {
        self.query_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HrApi for MockApi {
    fn set_auth_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(str::to_string);
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.query_requests.lock().unwrap().push(request.clone());
        let scripted = self.query_results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(answer("<p>OK</p>")))
    }

    async fn confirm_escalation(&self, request: &EscalationRequest) -> Result<EscalationResponse> {
        Ok(EscalationResponse {
            success: Some(true),
            message: format!("Escalated: {}", request.query),
        })
    }

    async fn upload_document(&self, file: &PendingFile) -> Result<UploadedFileInfo> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.failing_uploads.lock().unwrap().contains(&file.name) {
            return Err(api_error(ApiErrorKind::Server));
        }
        Ok(UploadedFileInfo {
            name: file.name.clone(),
            file_path: Some(format!("data/raw/{}", file.name)),
            file_size: Some(file.bytes.len() as u64),
        })
    }

    async fn chat_count(&self, session_id: &str) -> Result<usize> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(api_error(ApiErrorKind::Network));
        }
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(session_id)
            .map_or(0, Vec::len))
    }

    async fn chat_page(&self, session_id: &str, page: u32, page_size: usize) -> Result<PageResponse> {
        self.page_requests
            .lock()
            .unwrap()
            .push((session_id.to_string(), page, page_size));
        let _gate = self.page_gate.lock().await;
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(api_error(ApiErrorKind::Server));
        }

        let all = self
            .history
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        let skip_newest = (page.saturating_sub(1) as usize) * page_size;
        let end = all.len().saturating_sub(skip_newest);
        let start = end.saturating_sub(page_size);

        let mut messages = all[start..end].to_vec();
        if self.fresh_row_ids.load(Ordering::SeqCst) {
            for message in &mut messages {
                let n = self.issued_row_ids.fetch_add(1, Ordering::SeqCst);
                message.id = format!("row-{}", n);
            }
        }

        Ok(PageResponse {
            success: true,
            messages,
            error: None,
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let scripted = self.login_response.lock().unwrap().clone();
        Ok(scripted.unwrap_or_else(|| LoginResponse {
            success: request.password == "correct-horse",
            token: Some("token-123".to_string()),
            user: Some(profile()),
            message: None,
        }))
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<StatusResponse> {
        Ok(StatusResponse {
            success: true,
            message: Some("Registration successful".to_string()),
        })
    }

    async fn logout(&self) -> Result<StatusResponse> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(api_error(ApiErrorKind::Network));
        }
        Ok(StatusResponse {
            success: true,
            message: None,
        })
    }

    async fn current_user(&self) -> Result<UserResponse> {
        let scripted = self.user_response.lock().unwrap().clone();
        scripted.unwrap_or_else(|| {
            Ok(UserResponse {
                success: true,
                user: Some(profile()),
                message: None,
            })
        })
    }

    async fn clear_history(&self, device_id: &str) -> Result<StatusResponse> {
        self.cleared_devices.lock().unwrap().push(device_id.to_string());
        Ok(StatusResponse {
            success: true,
            message: None,
        })
    }

    async fn file_preview(&self, filename: &str) -> Result<FilePreview> {
        Ok(FilePreview {
            success: true,
            content_type: "text".to_string(),
            content: Some(format!("contents of {}", filename)),
            file_path: None,
        })
    }
}

/// A synchronizer wired to in-memory collaborators.
pub(crate) struct Fixture {
    pub storage: Arc<MemoryStore>,
    pub store: Arc<LocalSessionStore>,
    pub api: Arc<MockApi>,
    pub location: Arc<MemoryLocation>,
    pub notifications: NotificationLog,
    pub config: ClientConfig,
    pub sync: Arc<SessionSynchronizer>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(Arc::new(MemoryStore::new()), MemoryLocation::new())
    }

    /// Reopens the same storage, as a page reload would.
    pub fn reload(&self, location: MemoryLocation) -> Self {
        Self::build(self.storage.clone(), location, self.api.clone())
    }

    pub fn with(storage: Arc<MemoryStore>, location: MemoryLocation) -> Self {
        Self::build(storage, location, Arc::new(MockApi::new()))
    }

    fn build(storage: Arc<MemoryStore>, location: MemoryLocation, api: Arc<MockApi>) -> Self {
        let config = ClientConfig::default();
        let store = Arc::new(LocalSessionStore::new(storage.clone()));
        let location = Arc::new(location);
        let notifications = NotificationLog::new();
        let sync = Arc::new(SessionSynchronizer::new(
            store.clone(),
            api.clone(),
            location.clone(),
            Arc::new(notifications.clone()),
            storage.clone(),
            &config,
        ));

        Self {
            storage,
            store,
            api,
            location,
            notifications,
            config,
            sync,
        }
    }
}
