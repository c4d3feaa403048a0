//! Rest.li-style query grammar
//!
//! Search URLs carry their structured state in a single query parameter:
//!
//! ```text
//! value  := record | list | atom
//! record := '(' [key ':' value (',' key ':' value)*] ')'
//! list   := 'List(' [value (',' value)*] ')'
//! atom   := one or more characters other than '(' ')' ',' ':'
//! ```
//!
//! Atoms are percent-encoded on output so reserved characters never leak
//! into the structure, and percent-decoded on input.

use crate::encoding::{UNRESERVED_ONLY, strict_percent_decode};
use crate::error::{Error, Result};
use percent_encoding::utf8_percent_encode;
use std::fmt;

/// Maximum nesting accepted by the parser
const MAX_DEPTH: usize = 32;

const LIST_OPEN: &str = "List(";

/// Parsed query value; atoms hold decoded text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Atom(String),
    Record(Vec<(String, QueryValue)>),
    List(Vec<QueryValue>),
}

impl QueryValue {
    pub fn atom(text: impl Into<String>) -> Self {
        QueryValue::Atom(text.into())
    }

    /// Look up a field of a record
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        match self {
            QueryValue::Record(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            QueryValue::Atom(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[QueryValue]> {
        match self {
            QueryValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Parse a query body, e.g. `(keywords:rust,filters:List(...))`
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser { input, pos: 0 };
        let value = parser.parse_value(0)?;
        if parser.pos != input.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(value)
    }

    fn write_to(&self, out: &mut String) {
        match self {
            QueryValue::Atom(text) => {
                out.extend(utf8_percent_encode(text, UNRESERVED_ONLY));
            }
            QueryValue::Record(fields) => {
                out.push('(');
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.extend(utf8_percent_encode(key, UNRESERVED_ONLY));
                    out.push(':');
                    value.write_to(out);
                }
                out.push(')');
            }
            QueryValue::List(items) => {
                out.push_str(LIST_OPEN);
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_to(out);
                }
                out.push(')');
            }
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn error(&self, message: &str) -> Error {
        Error::MalformedUrl(format!("query {} at offset {}", message, self.pos))
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<QueryValue> {
        if depth > MAX_DEPTH {
            return Err(self.error("nests too deeply"));
        }

        if self.peek() == Some(b'(') {
            self.parse_record(depth)
        } else if self.rest().starts_with(LIST_OPEN) {
            self.parse_list(depth)
        } else {
            self.parse_atom().map(QueryValue::Atom)
        }
    }

    fn parse_record(&mut self, depth: usize) -> Result<QueryValue> {
        self.expect(b'(')?;
        let mut fields = Vec::new();

        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(QueryValue::Record(fields));
        }

        loop {
            let key = self.parse_atom()?;
            self.expect(b':')?;
            let value = self.parse_value(depth + 1)?;
            fields.push((key, value));

            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(QueryValue::Record(fields));
                }
                _ => return Err(self.error("expected ',' or ')' in record")),
            }
        }
    }

    fn parse_list(&mut self, depth: usize) -> Result<QueryValue> {
        self.pos += LIST_OPEN.len();
        let mut items = Vec::new();

        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(QueryValue::List(items));
        }

        loop {
            items.push(self.parse_value(depth + 1)?);

            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(QueryValue::List(items));
                }
                _ => return Err(self.error("expected ',' or ')' in list")),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<String> {
        let start = self.pos;
        let len = self
            .rest()
            .find(['(', ')', ',', ':'])
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a value"));
        }
        self.pos += len;

        strict_percent_decode(&self.input[start..self.pos]).map_err(|e| {
            Error::MalformedUrl(format!("query value at offset {}: {}", start, e))
        })
    }
}
