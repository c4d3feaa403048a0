//! SessionLink Ingress
//!
//! This crate exposes the session URL codec over HTTP:
//! - `POST /extract-session`, `POST /decode-session`
//! - `POST /generate-url-with-session`, `POST /parse-search-url`
//! - `GET /api-docs/openapi.json`
//!
//! Request bodies are validated into core types before reaching the codec,
//! and every failure is answered with a `success: false` JSON body.

pub mod middleware;
pub mod openapi;
pub mod readiness;
pub mod session;
pub mod types;

pub use readiness::CodecReadinessChecker;
pub use session::{SessionState, router};
pub use types::{ErrorResponse, IngressError, IngressResult, RequestId, RequestMetadata};
