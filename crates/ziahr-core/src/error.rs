//! Error types for the ZiaHR client.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed remote API call.
///
/// The classification decides whether a request is eligible for the
/// automatic retry: only `Server` and `RateLimit` failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorKind {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    Network,
    /// 5xx response without a more specific server classification.
    Server,
    /// The server reported rate limiting (429 or `RateLimitError`).
    RateLimit,
    /// Missing or rejected credentials (401/403 or `AuthenticationError`).
    Authentication,
    /// The request was rejected as invalid (400/422 or `ValidationError`).
    Validation,
    /// The addressed resource does not exist (404).
    NotFound,
}

impl ApiErrorKind {
    /// Classifies a response from its HTTP status and the optional
    /// `error_type` field of the server's error body.
    ///
    /// The server classification wins over the status code when present.
    pub fn classify(status: u16, error_type: Option<&str>) -> Self {
        if let Some(kind) = error_type.and_then(Self::from_error_type) {
            return kind;
        }

        match status {
            429 => Self::RateLimit,
            401 | 403 => Self::Authentication,
            400 | 422 => Self::Validation,
            404 => Self::NotFound,
            _ => Self::Server,
        }
    }

    fn from_error_type(error_type: &str) -> Option<Self> {
        let lower = error_type.to_lowercase();
        if lower.contains("ratelimit") || lower.contains("rate_limit") {
            Some(Self::RateLimit)
        } else if lower.contains("auth") {
            Some(Self::Authentication)
        } else if lower.contains("validation") || lower.contains("invalid") {
            Some(Self::Validation)
        } else {
            None
        }
    }

    /// Returns true if a request failing with this kind may be retried once.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server | Self::RateLimit)
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Server => "server",
            Self::RateLimit => "rate limit",
            Self::Authentication => "authentication",
            Self::Validation => "validation",
            Self::NotFound => "not found",
        };
        f.write_str(label)
    }
}

/// A shared error type for the whole ZiaHR client.
///
/// Typed variants with automatic conversion from the common error types of
/// the stack via `From`.
#[derive(Error, Debug, Clone)]
pub enum ZiahrError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Storage error (key-value area, session store)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote API failure
    #[error("API error ({kind}): {message}")]
    Api {
        kind: ApiErrorKind,
        status: Option<u16>,
        message: String,
    },

    /// Input rejected before reaching the network or the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication state error (not logged in, bad credentials)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Operation was cancelled because its session is no longer active
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ZiahrError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an API error
    pub fn api(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a Cancelled error
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
            || matches!(
                self,
                Self::Api {
                    kind: ApiErrorKind::NotFound,
                    ..
                }
            )
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns the API classification if this is an API error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns true if the failed operation is eligible for the single
    /// automatic retry.
    pub fn is_retryable(&self) -> bool {
        self.api_kind().is_some_and(|kind| kind.is_retryable())
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ZiahrError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ZiahrError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ZiahrError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ZiahrError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ZiahrError>`.
pub type Result<T> = std::result::Result<T, ZiahrError>;
