//! Shared ingress types and utilities

use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Request ID for tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new request ID
    pub fn generate() -> Self {
        Self(format!("req_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Get the string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ingress error types
#[derive(Debug, Error)]
pub enum IngressError {
    /// Codec rejected the input
    #[error(transparent)]
    Codec(#[from] sessionlink_core::Error),

    /// Body could not be read as the expected JSON shape
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl IngressError {
    /// Stable identifier reported in the `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            IngressError::Codec(err) => err.kind(),
            IngressError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<JsonRejection> for IngressError {
    fn from(rejection: JsonRejection) -> Self {
        IngressError::InvalidRequest(rejection.body_text())
    }
}

impl axum::response::IntoResponse for IngressError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            IngressError::Codec(sessionlink_core::Error::Config(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            IngressError::Codec(_) | IngressError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = ErrorResponse {
            success: false,
            error: self.kind().to_string(),
            message: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Ingress result type
pub type IngressResult<T> = Result<T, IngressError>;

/// Failure body shared by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Error kind, e.g. `missing_session`
    pub error: String,
    /// Human-readable description
    pub message: String,
}

/// Request metadata collected during ingress
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// Request ID
    pub request_id: RequestId,
    /// Client IP address
    pub client_ip: Option<String>,
    /// User agent
    pub user_agent: Option<String>,
}

impl RequestMetadata {
    /// Create new request metadata
    pub fn new() -> Self {
        Self {
            request_id: RequestId::generate(),
            client_ip: None,
            user_agent: None,
        }
    }

    /// Keep a caller-supplied request ID
    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = RequestId::from_string(id);
        self
    }

    /// Set client IP
    pub fn with_client_ip(mut self, ip: String) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, ua: String) -> Self {
        self.user_agent = Some(ua);
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new()
    }
}
