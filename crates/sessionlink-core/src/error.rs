//! Error types for SessionLink Core

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("Missing session: {0}")]
    MissingSession(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid search type: {0}")]
    InvalidSearchType(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable identifier used in API responses and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedUrl(_) => "malformed_url",
            Error::MissingSession(_) => "missing_session",
            Error::Decode(_) => "decode_error",
            Error::InvalidFilter(_) => "invalid_filter",
            Error::InvalidSearchType(_) => "invalid_search_type",
            Error::Config(_) => "config_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
