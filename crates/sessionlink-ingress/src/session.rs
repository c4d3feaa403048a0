//! Session URL endpoints
//!
//! JSON bodies are deserialized into loose DTOs with string enums, then
//! validated into core types so that bad filter or search types surface as
//! codec errors rather than generic JSON rejections.

use crate::middleware::{
    http_metrics_middleware, request_context_middleware, security_headers_middleware,
};
use crate::openapi::openapi_json;
use crate::types::{ErrorResponse, IngressError, IngressResult};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sessionlink_core::{FilterValue, SearchFilter, SearchRequest, SessionToken, SessionUrlCodec};
use sessionlink_observability::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Default request body cap
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared handler state
#[derive(Clone)]
pub struct SessionState {
    pub codec: Arc<SessionUrlCodec>,
    pub metrics: Option<Arc<Metrics>>,
    pub log_requests: bool,
    pub max_body_bytes: usize,
}

impl SessionState {
    pub fn new(codec: Arc<SessionUrlCodec>) -> Self {
        Self {
            codec,
            metrics: None,
            log_requests: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Run a codec operation, recording its outcome
    fn observe<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&SessionUrlCodec) -> sessionlink_core::Result<T>,
    ) -> IngressResult<T> {
        let started = Instant::now();
        let result = f(&self.codec);
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(_) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_codec_success(operation, elapsed);
                }
            }
            Err(err) => {
                warn!(operation, error_type = err.kind(), "Codec operation failed: {}", err);
                if let Some(metrics) = &self.metrics {
                    metrics.record_codec_failure(operation, err.kind(), elapsed);
                }
            }
        }

        result.map_err(IngressError::from)
    }
}

/// Body of `/extract-session` and `/parse-search-url`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UrlRequest {
    /// Full search URL
    #[schema(
        example = "https://www.linkedin.com/sales/search/people?query=(keywords:rust)&sessionId=oyT4SvXfQXWQEbOH54crEQ%3D%3D"
    )]
    pub url: String,
}

/// Body of `/decode-session`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecodeSessionRequest {
    /// Session token, encoded or decoded
    #[schema(example = "oyT4SvXfQXWQEbOH54crEQ%3D%3D")]
    pub session_id: String,
}

/// Both forms of a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    /// Form embedded in URLs
    #[schema(example = "oyT4SvXfQXWQEbOH54crEQ%3D%3D")]
    pub session_id: String,
    /// Human form
    #[schema(example = "oyT4SvXfQXWQEbOH54crEQ==")]
    pub decoded_session_id: String,
}

impl From<&SessionToken> for SessionResponse {
    fn from(token: &SessionToken) -> Self {
        Self {
            success: true,
            session_id: token.encoded().to_string(),
            decoded_session_id: token.decoded().to_string(),
        }
    }
}

/// One filter entry as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterValueBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "urn:li:organization:825160")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Hyundai Motor Company")]
    pub text: Option<String>,
    /// `INCLUDED` or `EXCLUDED`
    #[schema(example = "INCLUDED")]
    pub selection_type: String,
}

/// A filter as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchFilterBody {
    /// Filter type, e.g. `CURRENT_COMPANY`
    #[serde(rename = "type")]
    #[schema(example = "CURRENT_COMPANY")]
    pub filter_type: String,
    pub values: Vec<FilterValueBody>,
}

impl TryFrom<SearchFilterBody> for SearchFilter {
    type Error = sessionlink_core::Error;

    fn try_from(body: SearchFilterBody) -> Result<Self, Self::Error> {
        let filter_type = body.filter_type.parse()?;
        let values = body
            .values
            .into_iter()
            .map(|value| {
                Ok(FilterValue {
                    id: non_empty(value.id),
                    text: non_empty(value.text),
                    selection_type: value.selection_type.parse()?,
                })
            })
            .collect::<Result<Vec<_>, Self::Error>>()?;
        Ok(SearchFilter::new(filter_type, values))
    }
}

/// JSON clients send `""` for "no value"
fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

impl From<&SearchFilter> for SearchFilterBody {
    fn from(filter: &SearchFilter) -> Self {
        Self {
            filter_type: filter.filter_type.to_string(),
            values: filter
                .values
                .iter()
                .map(|value| FilterValueBody {
                    id: value.id.clone(),
                    text: value.text.clone(),
                    selection_type: value.selection_type.to_string(),
                })
                .collect(),
        }
    }
}

/// Body of `/generate-url-with-session`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUrlRequest {
    /// `people` or `company`
    #[schema(example = "people")]
    pub search_type: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub filters: Vec<SearchFilterBody>,
    /// Session token, encoded or decoded
    #[schema(example = "oyT4SvXfQXWQEbOH54crEQ==")]
    pub session_id: String,
}

impl GenerateUrlRequest {
    pub fn into_search_request(
        self,
        codec: &SessionUrlCodec,
    ) -> sessionlink_core::Result<SearchRequest> {
        let search_type = self.search_type.parse()?;
        if self.session_id.trim().is_empty() {
            return Err(sessionlink_core::Error::MissingSession(
                "sessionId is required".to_string(),
            ));
        }
        let session_token = codec.session_token(&self.session_id)?;

        let mut request =
            SearchRequest::new(search_type, session_token).with_keywords(self.keywords);
        for filter in self.filters {
            request = request.with_filter(filter.try_into()?);
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateUrlResponse {
    pub success: bool,
    pub url: String,
}

/// Structured view of a search URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUrlResponse {
    pub success: bool,
    #[schema(example = "people")]
    pub search_type: String,
    pub keywords: String,
    pub filters: Vec<SearchFilterBody>,
    pub session_id: String,
    pub decoded_session_id: String,
}

impl From<&SearchRequest> for ParsedUrlResponse {
    fn from(request: &SearchRequest) -> Self {
        Self {
            success: true,
            search_type: request.search_type.to_string(),
            keywords: request.keywords.clone(),
            filters: request.filters.iter().map(SearchFilterBody::from).collect(),
            session_id: request.session_token.encoded().to_string(),
            decoded_session_id: request.session_token.decoded().to_string(),
        }
    }
}

/// Extract the session token from a search URL
#[utoipa::path(
    post,
    path = "/extract-session",
    tag = "session",
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Token found", body = SessionResponse),
        (status = 400, description = "URL is malformed or carries no session", body = ErrorResponse)
    )
)]
pub async fn extract_session(
    State(state): State<SessionState>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> IngressResult<Json<SessionResponse>> {
    let Json(request) = payload?;
    if state.log_requests {
        debug!(url = %request.url, "extract-session request");
    }

    let token = state.observe("extract", |codec| codec.extract_session_token(&request.url))?;
    if state.log_requests {
        debug!(session_id = token.encoded(), "extract-session response");
    }
    Ok(Json(SessionResponse::from(&token)))
}

/// Normalize a session token given in either form
#[utoipa::path(
    post,
    path = "/decode-session",
    tag = "session",
    request_body = DecodeSessionRequest,
    responses(
        (status = 200, description = "Both token forms", body = SessionResponse),
        (status = 400, description = "Token cannot be decoded", body = ErrorResponse)
    )
)]
pub async fn decode_session(
    State(state): State<SessionState>,
    payload: Result<Json<DecodeSessionRequest>, JsonRejection>,
) -> IngressResult<Json<SessionResponse>> {
    let Json(request) = payload?;
    if state.log_requests {
        debug!(session_id = %request.session_id, "decode-session request");
    }

    let token = state.observe("decode", |codec| codec.session_token(&request.session_id))?;
    Ok(Json(SessionResponse::from(&token)))
}

/// Build a search URL carrying the given session
#[utoipa::path(
    post,
    path = "/generate-url-with-session",
    tag = "session",
    request_body = GenerateUrlRequest,
    responses(
        (status = 200, description = "Search URL", body = GenerateUrlResponse),
        (status = 400, description = "Invalid search type, filter or session", body = ErrorResponse)
    )
)]
pub async fn generate_url_with_session(
    State(state): State<SessionState>,
    payload: Result<Json<GenerateUrlRequest>, JsonRejection>,
) -> IngressResult<Json<GenerateUrlResponse>> {
    let Json(request) = payload?;
    if state.log_requests {
        debug!(
            search_type = %request.search_type,
            keywords = %request.keywords,
            filters = request.filters.len(),
            "generate-url-with-session request"
        );
    }

    let url = state.observe("build", |codec| {
        let request = request.into_search_request(codec)?;
        codec.build_search_url(&request)
    })?;
    if state.log_requests {
        debug!(url = %url, "generate-url-with-session response");
    }

    Ok(Json(GenerateUrlResponse { success: true, url }))
}

/// Parse a search URL into its structured parts
#[utoipa::path(
    post,
    path = "/parse-search-url",
    tag = "session",
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Structured search", body = ParsedUrlResponse),
        (status = 400, description = "URL cannot be parsed", body = ErrorResponse)
    )
)]
pub async fn parse_search_url(
    State(state): State<SessionState>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> IngressResult<Json<ParsedUrlResponse>> {
    let Json(request) = payload?;
    if state.log_requests {
        debug!(url = %request.url, "parse-search-url request");
    }

    let parsed = state.observe("parse", |codec| codec.parse_search_url(&request.url))?;
    Ok(Json(ParsedUrlResponse::from(&parsed)))
}

/// Create the session router
pub fn router(state: SessionState) -> Router {
    let max_body_bytes = state.max_body_bytes;
    let metrics = state.metrics.clone();

    let mut router = Router::new()
        .route("/extract-session", post(extract_session))
        .route("/decode-session", post(decode_session))
        .route("/generate-url-with-session", post(generate_url_with_session))
        .route("/parse-search-url", post(parse_search_url))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.layer(middleware::from_fn_with_state(metrics, http_metrics_middleware));
    }

    router
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_context_middleware))
}
