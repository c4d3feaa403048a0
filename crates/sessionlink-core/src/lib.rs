//! SessionLink Core
//!
//! This crate provides the session-aware search URL codec:
//! - Search request and filter types
//! - Pluggable session token encodings
//! - The Rest.li-style query grammar used inside search URLs
//! - Core error types

pub mod codec;
pub mod encoding;
pub mod error;
pub mod query;
pub mod types;

pub use codec::{CodecConfig, SessionUrlCodec};
pub use encoding::{Base64SessionEncoding, EncodingKind, PercentEncoding, TokenEncoding};
pub use error::{Error, Result};
pub use types::{
    FilterType, FilterValue, SearchFilter, SearchRequest, SearchType, SelectionType, SessionToken,
};
