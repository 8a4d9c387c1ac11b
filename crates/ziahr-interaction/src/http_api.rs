//! HTTP client for the ZiaHR server.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::RwLock;
use ziahr_core::api::{
    CountResponse, ErrorBody, EscalationRequest, EscalationResponse, FilePreview, HrApi,
    LoginRequest, LoginResponse, PageResponse, QueryRequest, QueryResponse, RegisterRequest,
    StatusResponse, UploadedFileInfo, UserResponse,
};
use ziahr_core::attachment::PendingFile;
use ziahr_core::config::ClientConfig;
use ziahr_core::error::{ApiErrorKind, Result, ZiahrError};

/// Body of `POST /api/upload-document`.
#[derive(Debug, Deserialize)]
struct UploadBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `HrApi` over reqwest.
///
/// Every request carries the configured timeout; a bearer token is attached
/// once `set_auth_token` was called with one.
pub struct HttpHrApi {
    client: Client,
    api_root: String,
    token: RwLock<Option<String>>,
}

impl HttpHrApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ZiahrError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_root: config.api_root(),
            token: RwLock::new(None),
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().ok().and_then(|guard| guard.clone());
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| transport_error(endpoint, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = map_http_error(status.as_u16(), &body);
            tracing::error!("[HttpHrApi] {} failed: {}", endpoint, error);
            return Err(error);
        }

        response.json::<T>().await.map_err(|err| ZiahrError::Serialization {
            format: "JSON".to_string(),
            message: format!("Failed to parse {} response: {}", endpoint, err),
        })
    }
}

fn transport_error(endpoint: &str, err: &reqwest::Error) -> ZiahrError {
    let reason = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    tracing::error!("[HttpHrApi] {} {}: {}", endpoint, reason, err);
    ZiahrError::api(
        ApiErrorKind::Network,
        None,
        format!("Request to {} {}: {}", endpoint, reason, err),
    )
}

/// Classifies a non-2xx response from its status and error body.
fn map_http_error(status: u16, body: &str) -> ZiahrError {
    let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
    let kind = ApiErrorKind::classify(status, parsed.error_type.as_deref());

    let message = parsed.describe().unwrap_or_else(|| {
        let text = body.trim();
        if text.is_empty() {
            format!("HTTP {}", status)
        } else {
            text.chars().take(200).collect()
        }
    });

    ZiahrError::api(kind, Some(status), message)
}

#[async_trait]
impl HrApi for HttpHrApi {
    fn set_auth_token(&self, token: Option<&str>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token.map(str::to_string);
        }
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        tracing::debug!(
            "[HttpHrApi] query ({} chars, {} files)",
            request.query.len(),
            request.files_info.len()
        );
        self.send(self.client.post(self.url("query")).json(request), "query")
            .await
    }

    async fn confirm_escalation(&self, request: &EscalationRequest) -> Result<EscalationResponse> {
        self.send(
            self.client.post(self.url("confirm-escalation")).json(request),
            "confirm-escalation",
        )
        .await
    }

    async fn upload_document(&self, file: &PendingFile) -> Result<UploadedFileInfo> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type())
            .map_err(|e| ZiahrError::invalid_input(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let body: UploadBody = self
            .send(
                self.client.post(self.url("upload-document")).multipart(form),
                "upload-document",
            )
            .await?;

        if !body.success {
            let message = body
                .message
                .or(body.error)
                .unwrap_or_else(|| format!("Upload of '{}' was rejected", file.name));
            return Err(ZiahrError::api(ApiErrorKind::Server, Some(200), message));
        }

        Ok(UploadedFileInfo {
            name: body.filename.unwrap_or_else(|| file.name.clone()),
            file_path: body.file_path,
            file_size: body.file_size.or(Some(file.bytes.len() as u64)),
        })
    }

    async fn chat_count(&self, session_id: &str) -> Result<usize> {
        let body: CountResponse = self
            .send(
                self.client.get(self.url(&format!("chats/{}/count", session_id))),
                "chat count",
            )
            .await?;

        if !body.success {
            return Err(ZiahrError::api(
                ApiErrorKind::Server,
                Some(200),
                format!("Count of '{}' unavailable", session_id),
            ));
        }
        Ok(body.count)
    }

    async fn chat_page(&self, session_id: &str, page: u32, page_size: usize) -> Result<PageResponse> {
        let request = self
            .client
            .get(self.url(&format!("chats/{}", session_id)))
            .query(&[("page", page.to_string()), ("page_size", page_size.to_string())]);
        let body: PageResponse = self.send(request, "chat page").await?;

        if !body.success {
            let message = body
                .error
                .clone()
                .unwrap_or_else(|| format!("Page {} of '{}' unavailable", page, session_id));
            return Err(ZiahrError::api(ApiErrorKind::Server, Some(200), message));
        }
        Ok(body)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.send(self.client.post(self.url("login")).json(request), "login")
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<StatusResponse> {
        self.send(self.client.post(self.url("register")).json(request), "register")
            .await
    }

    async fn logout(&self) -> Result<StatusResponse> {
        self.send(self.client.post(self.url("logout")), "logout").await
    }

    async fn current_user(&self) -> Result<UserResponse> {
        self.send(self.client.get(self.url("user")), "user").await
    }

    async fn clear_history(&self, device_id: &str) -> Result<StatusResponse> {
        let body = serde_json::json!({ "device_id": device_id });
        self.send(
            self.client.post(self.url("clear-history")).json(&body),
            "clear-history",
        )
        .await
    }

    async fn file_preview(&self, filename: &str) -> Result<FilePreview> {
        let request = self
            .client
            .get(self.url("file-preview"))
            .query(&[("filename", filename)]);
        self.send(request, "file-preview").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpHrApi {
        HttpHrApi::new(&ClientConfig {
            api_base_url: "http://127.0.0.1:1/".to_string(),
            request_timeout_secs: 2,
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let api = api();
        assert_eq!(api.api_root(), "http://127.0.0.1:1/api");
        assert_eq!(api.url("chats/chat_1/count"), "http://127.0.0.1:1/api/chats/chat_1/count");
    }

    #[test]
    fn test_error_type_wins_over_status() {
        let err = map_http_error(
            500,
            r#"{"error": "An error occurred", "message": "Too many requests", "error_type": "RateLimitError"}"#,
        );
        assert_eq!(err.api_kind(), Some(ApiErrorKind::RateLimit));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(map_http_error(401, "").api_kind(), Some(ApiErrorKind::Authentication));
        assert_eq!(map_http_error(422, "{}").api_kind(), Some(ApiErrorKind::Validation));
        assert_eq!(map_http_error(404, "not here").api_kind(), Some(ApiErrorKind::NotFound));
        assert_eq!(map_http_error(503, "<html>").api_kind(), Some(ApiErrorKind::Server));
    }

    #[test]
    fn test_plain_body_becomes_message() {
        let err = map_http_error(502, "Bad Gateway");
        assert!(err.to_string().contains("Bad Gateway"));

        let err = map_http_error(500, "");
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_auth_token_is_replaceable() {
        let api = api();
        api.set_auth_token(Some("abc"));
        assert_eq!(api.token.read().unwrap().as_deref(), Some("abc"));

        api.set_auth_token(None);
        assert!(api.token.read().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let err = api().chat_count("chat_1").await.unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::Network));
        assert!(!err.is_retryable());
    }
}
