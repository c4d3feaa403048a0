//! OpenAPI document for the session endpoints

use axum::Json;
use utoipa::OpenApi;

use crate::session;
use crate::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SessionLink",
        description = "Extract, decode and re-embed session tokens in search URLs"
    ),
    paths(
        session::extract_session,
        session::decode_session,
        session::generate_url_with_session,
        session::parse_search_url
    ),
    components(
        schemas(
            session::UrlRequest,
            session::DecodeSessionRequest,
            session::SessionResponse,
            session::GenerateUrlRequest,
            session::GenerateUrlResponse,
            session::ParsedUrlResponse,
            session::SearchFilterBody,
            session::FilterValueBody,
            ErrorResponse
        )
    ),
    tags(
        (name = "session", description = "Session token and search URL endpoints")
    )
)]
pub struct ApiDoc;

/// Serve the generated document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
