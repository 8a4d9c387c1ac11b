//! Remote ZiaHR API contract.
//!
//! The client delegates all real work (retrieval, escalation, document
//! ingestion) to the server. `HrApi` is the seam; the reqwest implementation
//! lives in `ziahr-interaction`, tests provide their own.

mod model;

pub use model::{
    CountResponse, ErrorBody, EscalationRequest, EscalationResponse, FilePreview, LoginRequest,
    LoginResponse, PageResponse, QueryRequest, QueryResponse, RegisterRequest, StatusResponse,
    UploadedFileInfo, UserProfile, UserResponse,
};

use crate::attachment::PendingFile;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait HrApi: Send + Sync {
    /// Sets the bearer token sent with subsequent requests.
    fn set_auth_token(&self, _token: Option<&str>) {}

    /// `POST /api/query`
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse>;

    /// `POST /api/confirm-escalation`
    async fn confirm_escalation(&self, request: &EscalationRequest) -> Result<EscalationResponse>;

    /// `POST /api/upload-document` (multipart field `file`)
    async fn upload_document(&self, file: &PendingFile) -> Result<UploadedFileInfo>;

    /// `GET /api/chats/{id}/count`
    async fn chat_count(&self, session_id: &str) -> Result<usize>;

    /// `GET /api/chats/{id}?page=&page_size=`
    ///
    /// Page 1 holds the newest messages. Each page is chronological.
    async fn chat_page(&self, session_id: &str, page: u32, page_size: usize) -> Result<PageResponse>;

    /// `POST /api/login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// `POST /api/register`
    async fn register(&self, request: &RegisterRequest) -> Result<StatusResponse>;

    /// `POST /api/logout`
    async fn logout(&self) -> Result<StatusResponse>;

    /// `GET /api/user`
    async fn current_user(&self) -> Result<UserResponse>;

    /// `POST /api/clear-history`
    async fn clear_history(&self, device_id: &str) -> Result<StatusResponse>;

    /// `GET /api/file-preview?filename=`
    async fn file_preview(&self, filename: &str) -> Result<FilePreview>;
}
