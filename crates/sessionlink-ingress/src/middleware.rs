//! Shared ingress middleware

use crate::types::RequestMetadata;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use sessionlink_observability::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Header carrying the request ID in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extension key for request metadata
#[derive(Clone)]
pub struct RequestMetadataExt(pub RequestMetadata);

/// Middleware to attach request metadata and echo the request ID
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let headers = req.headers();
    let mut metadata = RequestMetadata::new();

    // Keep the caller's request ID so logs line up across services
    if let Some(id) = headers.get(REQUEST_ID_HEADER)
        && let Ok(id) = id.to_str()
        && !id.is_empty()
    {
        metadata = metadata.with_request_id(id.to_string());
    }

    // Extract client IP from X-Forwarded-For or X-Real-IP
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(ip) = forwarded_for.to_str() {
            // Take the first IP in the list
            let client_ip = ip.split(',').next().unwrap_or(ip).trim().to_string();
            metadata = metadata.with_client_ip(client_ip);
        }
    } else if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(ip) = real_ip.to_str()
    {
        metadata = metadata.with_client_ip(ip.to_string());
    }

    if let Some(user_agent) = headers.get(header::USER_AGENT)
        && let Ok(ua) = user_agent.to_str()
    {
        metadata = metadata.with_user_agent(ua.to_string());
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    req.extensions_mut().insert(RequestMetadataExt(metadata.clone()));

    let mut response = next.run(req).await;

    debug!(
        request_id = %metadata.request_id,
        %method,
        path = %path,
        status = response.status().as_u16(),
        client_ip = metadata.client_ip.as_deref().unwrap_or("-"),
        user_agent = metadata.user_agent.as_deref().unwrap_or("-"),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(metadata.request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Middleware to add security headers
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );

    response
}

/// Middleware counting requests by matched route and status
pub async fn http_metrics_middleware(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    metrics.record_http_request(&route, response.status().as_u16());
    response
}
