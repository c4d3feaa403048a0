//! Session URL codec
//!
//! Extracts session tokens from search URLs, decodes them, and rebuilds
//! search URLs from structured requests. All operations are pure; one codec
//! can be shared across threads.

use crate::encoding::{EncodingKind, TokenEncoding, strict_percent_decode};
use crate::error::{Error, Result};
use crate::query::QueryValue;
use crate::types::{
    FilterType, FilterValue, SearchFilter, SearchRequest, SearchType, SelectionType, SessionToken,
};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.linkedin.com/sales/search";
pub const DEFAULT_SESSION_PARAM: &str = "sessionId";
pub const DEFAULT_QUERY_PARAM: &str = "query";

/// Escapes applied to the serialized query body when it is embedded as a
/// query parameter value. `(),:` stay literal.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`');

/// Codec settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Search URL prefix; the search type is appended as a path segment
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Query parameter carrying the session token
    #[serde(default = "default_session_param")]
    pub session_param: String,

    /// Query parameter carrying the structured search body
    #[serde(default = "default_query_param")]
    pub query_param: String,

    #[serde(default)]
    pub encoding: EncodingKind,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_param: default_session_param(),
            query_param: default_query_param(),
            encoding: EncodingKind::default(),
        }
    }
}

/// Session-aware search URL codec
#[derive(Debug, Clone)]
pub struct SessionUrlCodec {
    base_url: Url,
    session_param: String,
    query_param: String,
    encoding: Arc<dyn TokenEncoding>,
}

impl SessionUrlCodec {
    /// Create a codec, validating the configuration
    pub fn new(config: &CodecConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::Config(format!("invalid base_url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        validate_param_name("session_param", &config.session_param)?;
        validate_param_name("query_param", &config.query_param)?;
        if config.session_param == config.query_param {
            return Err(Error::Config(
                "session_param and query_param must differ".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            session_param: config.session_param.clone(),
            query_param: config.query_param.clone(),
            encoding: config.encoding.build(),
        })
    }

    /// Replace the token encoding strategy
    pub fn with_encoding(mut self, encoding: Arc<dyn TokenEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> &dyn TokenEncoding {
        self.encoding.as_ref()
    }

    pub fn session_param(&self) -> &str {
        &self.session_param
    }

    /// Locate and decode the session token of a search URL
    pub fn extract_session_token(&self, url: &str) -> Result<SessionToken> {
        let url = parse_url(url)?;
        let token = self.token_from(&url)?;
        debug!(
            encoded = token.encoded(),
            encoding = self.encoding.name(),
            "Extracted session token"
        );
        Ok(token)
    }

    /// Reverse the transport encoding of a token
    pub fn decode(&self, encoded: &str) -> Result<String> {
        self.encoding.decode(encoded)
    }

    /// Apply the transport encoding to a token
    pub fn encode(&self, decoded: &str) -> Result<String> {
        self.encoding.encode(decoded)
    }

    /// Interpret caller input as a session token, encoded or not
    pub fn session_token(&self, input: &str) -> Result<SessionToken> {
        SessionToken::from_input(input.trim(), self.encoding.as_ref())
    }

    /// Serialize a search request into a complete search URL
    pub fn build_search_url(&self, request: &SearchRequest) -> Result<String> {
        request.validate()?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("base_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(request.search_type.as_str());

        let body = query_body(request).to_string();
        let query = format!(
            "{}={}&{}={}",
            self.query_param,
            utf8_percent_encode(&body, QUERY_VALUE),
            self.session_param,
            request.session_token.encoded()
        );
        url.set_query(Some(&query));

        debug!(
            search_type = %request.search_type,
            filters = request.filters.len(),
            "Built search URL"
        );
        Ok(url.to_string())
    }

    /// Parse a search URL back into a structured request
    pub fn parse_search_url(&self, url: &str) -> Result<SearchRequest> {
        let url = parse_url(url)?;
        let session_token = self.token_from(&url)?;

        let search_type: SearchType = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .ok_or_else(|| Error::MalformedUrl("URL has no search type in its path".to_string()))?
            .parse()?;

        let raw_body = raw_query(&url)
            .and_then(|query| {
                raw_param(query, &self.query_param).ok_or_else(|| {
                    Error::MalformedUrl(format!("URL has no '{}' parameter", self.query_param))
                })
            })?;
        let body = strict_percent_decode(raw_body)
            .map_err(|e| Error::MalformedUrl(format!("'{}' parameter: {}", self.query_param, e)))?;
        let body = QueryValue::parse(&body)?;

        let keywords = match body.get("keywords") {
            Some(value) => value
                .as_atom()
                .ok_or_else(|| Error::MalformedUrl("keywords must be a plain value".to_string()))?
                .to_string(),
            None => String::new(),
        };

        let filters = match body.get("filters") {
            Some(value) => value
                .as_list()
                .ok_or_else(|| Error::InvalidFilter("filters must be a List".to_string()))?
                .iter()
                .map(parse_filter)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let request = SearchRequest {
            search_type,
            keywords,
            filters,
            session_token,
        };
        request.validate()?;
        Ok(request)
    }

    fn token_from(&self, url: &Url) -> Result<SessionToken> {
        let query = raw_query(url)?;
        let encoded = raw_param(query, &self.session_param)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                Error::MissingSession(format!("URL has no '{}' parameter", self.session_param))
            })?;
        SessionToken::from_encoded(encoded, self.encoding.as_ref())
    }
}

impl Default for SessionUrlCodec {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            session_param: default_session_param(),
            query_param: default_query_param(),
            encoding: EncodingKind::default().build(),
        }
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url.trim()).map_err(|e| Error::MalformedUrl(format!("'{}': {}", url, e)))
}

fn raw_query(url: &Url) -> Result<&str> {
    url.query()
        .filter(|query| !query.is_empty())
        .ok_or_else(|| Error::MalformedUrl("URL has no query component".to_string()))
}

/// Raw (still percent-encoded) value of the first matching query parameter
fn raw_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then_some(value)
    })
}

fn validate_param_name(field: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} '{}' must be a non-empty alphanumeric parameter name",
            field, name
        )))
    }
}

fn query_body(request: &SearchRequest) -> QueryValue {
    let mut fields = Vec::new();
    if !request.filters.is_empty() {
        fields.push((
            "filters".to_string(),
            QueryValue::List(request.filters.iter().map(filter_value).collect()),
        ));
    }
    if !request.keywords.is_empty() {
        fields.push(("keywords".to_string(), QueryValue::atom(&request.keywords)));
    }
    QueryValue::Record(fields)
}

fn filter_value(filter: &SearchFilter) -> QueryValue {
    let values = filter
        .values
        .iter()
        .map(|value| {
            let mut fields = Vec::with_capacity(3);
            if let Some(id) = value.id.as_deref() {
                fields.push(("id".to_string(), QueryValue::atom(id)));
            }
            if let Some(text) = value.text.as_deref() {
                fields.push(("text".to_string(), QueryValue::atom(text)));
            }
            fields.push((
                "selectionType".to_string(),
                QueryValue::atom(value.selection_type.as_str()),
            ));
            QueryValue::Record(fields)
        })
        .collect();

    QueryValue::Record(vec![
        (
            "type".to_string(),
            QueryValue::atom(filter.filter_type.as_str()),
        ),
        ("values".to_string(), QueryValue::List(values)),
    ])
}

fn parse_filter(value: &QueryValue) -> Result<SearchFilter> {
    let filter_type: FilterType = value
        .get("type")
        .and_then(QueryValue::as_atom)
        .ok_or_else(|| Error::InvalidFilter("filter has no type".to_string()))?
        .parse()?;

    let values = value
        .get("values")
        .and_then(QueryValue::as_list)
        .ok_or_else(|| Error::InvalidFilter(format!("{} filter has no values list", filter_type)))?
        .iter()
        .map(|entry| parse_filter_value(filter_type, entry))
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchFilter::new(filter_type, values))
}

fn parse_filter_value(filter_type: FilterType, entry: &QueryValue) -> Result<FilterValue> {
    let optional_atom = |key: &str| -> Result<Option<String>> {
        match entry.get(key) {
            Some(value) => value.as_atom().map(|s| Some(s.to_string())).ok_or_else(|| {
                Error::InvalidFilter(format!("{} value {} must be a plain value", filter_type, key))
            }),
            None => Ok(None),
        }
    };

    let selection_type: SelectionType = entry
        .get("selectionType")
        .and_then(QueryValue::as_atom)
        .ok_or_else(|| {
            Error::InvalidFilter(format!("{} value has no selectionType", filter_type))
        })?
        .parse()?;

    Ok(FilterValue {
        id: optional_atom("id")?,
        text: optional_atom("text")?,
        selection_type,
    })
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_session_param() -> String {
    DEFAULT_SESSION_PARAM.to_string()
}

fn default_query_param() -> String {
    DEFAULT_QUERY_PARAM.to_string()
}

#[cfg(test)]
mod tests;
