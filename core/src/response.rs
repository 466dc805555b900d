//! Immutable response wrapper.
//!
//! # Design
//! A `Response` never looks at the server's `Content-Type`. The `Accept` type
//! that was sent decides how the body is parsed, because that is what the
//! caller negotiated for. Plain bodies are handed back untouched; XML goes
//! through a structural conversion and then the same decoder as JSON.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RestError, Result};
use crate::http::{BodyFormat, Headers, HttpResponse};
use crate::xml;

/// Outcome of parsing a body: either the raw bytes (plain accept types) or
/// the decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<'a, T = Value> {
    Raw(&'a [u8]),
    Decoded(T),
}

impl<'a, T> Parsed<'a, T> {
    pub fn raw(&self) -> Option<&'a [u8]> {
        match self {
            Parsed::Raw(body) => Some(*body),
            Parsed::Decoded(_) => None,
        }
    }

    pub fn decoded(self) -> Option<T> {
        match self {
            Parsed::Raw(_) => None,
            Parsed::Decoded(value) => Some(value),
        }
    }
}

/// Snapshot of a service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
    accept: String,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: impl Into<Vec<u8>>, accept: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            accept: accept.into(),
        }
    }

    pub(crate) fn from_http(raw: HttpResponse, accept: &str) -> Self {
        Self::new(raw.status, raw.headers, raw.body, accept)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The payload exactly as received.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The payload as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The `Accept` type the request was sent with.
    pub fn accept(&self) -> &str {
        &self.accept
    }

    pub fn format(&self) -> BodyFormat {
        BodyFormat::from_accept(&self.accept)
    }

    /// Parse the body into a generic JSON value.
    pub fn as_array(&self) -> Result<Parsed<'_, Value>> {
        match self.format() {
            BodyFormat::Plain => Ok(Parsed::Raw(&self.body)),
            BodyFormat::Xml => xml::to_json(self.utf8()?).map(Parsed::Decoded),
            BodyFormat::Json => serde_json::from_slice(&self.body)
                .map(Parsed::Decoded)
                .map_err(|e| RestError::Parse(e.to_string())),
        }
    }

    /// Parse the body into the caller's type.
    pub fn as_object<T: DeserializeOwned>(&self) -> Result<Parsed<'_, T>> {
        let decoded = match self.format() {
            BodyFormat::Plain => return Ok(Parsed::Raw(&self.body)),
            BodyFormat::Xml => serde_json::from_value(xml::to_json(self.utf8()?)?),
            BodyFormat::Json => serde_json::from_slice(&self.body),
        };
        decoded
            .map(Parsed::Decoded)
            .map_err(|e| RestError::Parse(e.to_string()))
    }

    fn utf8(&self) -> Result<&str> {
        std::str::from_utf8(&self.body).map_err(|e| RestError::Parse(e.to_string()))
    }
}
