//! Session token encodings
//!
//! Session tokens travel percent-encoded inside search URLs. The exact scheme
//! behind the percent layer varies between deployments, so the encoding is a
//! strategy chosen from configuration:
//! - `percent` - plain percent-encoding (default)
//! - `base64` - percent-encoding over a standard base64 payload

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Everything except RFC 3986 unreserved characters
pub(crate) const UNRESERVED_ONLY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Strategy converting between the encoded (URL-embedded) and decoded
/// (human-inspectable) forms of a session token.
///
/// Implementations must be deterministic and satisfy
/// `decode(encode(d)) == d` for every `d` they accept.
pub trait TokenEncoding: Send + Sync + fmt::Debug {
    /// Name used in configuration and logs
    fn name(&self) -> &'static str;

    /// Reverse the transport encoding
    fn decode(&self, encoded: &str) -> Result<String>;

    /// Apply the transport encoding
    fn encode(&self, decoded: &str) -> Result<String>;
}

/// Plain percent-encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentEncoding;

impl TokenEncoding for PercentEncoding {
    fn name(&self) -> &'static str {
        "percent"
    }

    fn decode(&self, encoded: &str) -> Result<String> {
        if encoded.is_empty() {
            return Err(Error::Decode("session token is empty".to_string()));
        }
        strict_percent_decode(encoded)
    }

    fn encode(&self, decoded: &str) -> Result<String> {
        if decoded.is_empty() {
            return Err(Error::Decode("session token is empty".to_string()));
        }
        Ok(utf8_percent_encode(decoded, UNRESERVED_ONLY).to_string())
    }
}

/// Percent-encoding over a standard base64 payload
///
/// The decoded form stays the base64 text; the raw bytes are available
/// through [`Base64SessionEncoding::session_bytes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64SessionEncoding;

impl Base64SessionEncoding {
    /// Raw session bytes behind a decoded token
    pub fn session_bytes(&self, decoded: &str) -> Result<Vec<u8>> {
        STANDARD
            .decode(decoded)
            .map_err(|e| Error::Decode(format!("session token is not valid base64: {}", e)))
    }
}

impl TokenEncoding for Base64SessionEncoding {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn decode(&self, encoded: &str) -> Result<String> {
        let decoded = PercentEncoding.decode(encoded)?;
        self.session_bytes(&decoded)?;
        Ok(decoded)
    }

    fn encode(&self, decoded: &str) -> Result<String> {
        self.session_bytes(decoded)?;
        PercentEncoding.encode(decoded)
    }
}

/// Encoding selector used in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    #[default]
    Percent,
    Base64,
}

impl EncodingKind {
    /// Instantiate the strategy
    pub fn build(self) -> Arc<dyn TokenEncoding> {
        match self {
            EncodingKind::Percent => Arc::new(PercentEncoding),
            EncodingKind::Base64 => Arc::new(Base64SessionEncoding),
        }
    }
}

impl FromStr for EncodingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "percent" => Ok(EncodingKind::Percent),
            "base64" => Ok(EncodingKind::Base64),
            other => Err(Error::Config(format!(
                "Unknown token encoding '{}'. Use 'percent' or 'base64'",
                other
            ))),
        }
    }
}

/// Bytes that are never literal inside an encoded query value
const REQUIRES_ESCAPE: &[u8] = b"&#\"'<>";

/// Percent-decode text that must already be a valid URL query value.
///
/// Unlike `percent_decode_str`, stray `%` signs, whitespace, `&`, `#` and
/// non-ASCII input are rejected instead of passed through. So are the bytes
/// a URL serializer escapes inside a query (`"`, `'`, `<`, `>`): accepted
/// text is already in the form it takes once embedded in a URL.
pub(crate) fn strict_percent_decode(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let valid = bytes
                    .get(i + 1..i + 3)
                    .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
                if !valid {
                    return Err(Error::Decode(format!(
                        "invalid percent escape at offset {}",
                        i
                    )));
                }
                i += 3;
            }
            b if !b.is_ascii_graphic() || REQUIRES_ESCAPE.contains(&b) => {
                return Err(Error::Decode(format!(
                    "illegal character at offset {}",
                    i
                )));
            }
            _ => i += 1,
        }
    }

    percent_decode_str(input)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| Error::Decode(format!("decoded bytes are not valid UTF-8: {}", e)))
}
