//! Application assembly
//!
//! Builds the codec from configuration and wires the session endpoints,
//! health endpoints and optional HTTP layers into one router.

use crate::config::ServerConfig;
use anyhow::Context;
use axum::{Router, http::Method, middleware};
use sessionlink_core::SessionUrlCodec;
use sessionlink_ingress::middleware::request_context_middleware;
use sessionlink_ingress::{CodecReadinessChecker, SessionState};
use sessionlink_observability::{HealthState, Metrics, health_router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Everything the server needs once configuration is resolved
pub struct App {
    pub router: Router,
    pub codec: Arc<SessionUrlCodec>,
}

pub fn build_codec(config: &ServerConfig) -> anyhow::Result<Arc<SessionUrlCodec>> {
    let codec = SessionUrlCodec::new(&config.codec).context("Invalid codec configuration")?;
    Ok(Arc::new(codec))
}

pub fn build(config: &ServerConfig) -> anyhow::Result<App> {
    let codec = build_codec(config)?;
    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    let session_state = SessionState::new(codec.clone())
        .with_metrics(metrics.clone())
        .with_log_requests(config.logging.log_requests)
        .with_max_body_bytes(config.max_body_bytes);

    let health_state = HealthState::with_readiness_checker(
        metrics,
        Arc::new(CodecReadinessChecker::new(codec.clone())),
    );

    // The session router carries its own request context layer
    let health = health_router(health_state).layer(middleware::from_fn(request_context_middleware));
    let mut router = sessionlink_ingress::router(session_state).merge(health);

    if config.cors.enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        );
    }

    if config.logging.log_requests {
        router = router.layer(TraceLayer::new_for_http());
    }

    Ok(App { router, codec })
}
