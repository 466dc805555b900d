//! HTTP transport types and header plumbing.
//!
//! # Design
//! Requests and responses are plain data. The client builds an `HttpRequest`
//! and hands it to a [`Transport`](crate::Transport); the transport performs
//! the I/O and returns an `HttpResponse`. Keeping these as owned values keeps
//! the client deterministic and lets tests substitute a recording transport.

use std::fmt;

use crate::error::{RestError, Result};

/// `X-HTTP-Method-Override`, asks servers that only accept POST to treat the
/// request as another verb.
pub const METHOD_OVERRIDE: &str = "X-HTTP-Method-Override";

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
/// Plain/HTML accept type; bodies negotiated with it are never decoded.
pub const TEXT_HTML: &str = "text/html";

/// Status codes callers commonly branch on.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const ACCEPTED: u16 = 202;
    /// 204 No Content, what services answer after a successful update.
    pub const UPDATED: u16 = 204;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive names.
///
/// Inserting a name that already exists (in any casing) replaces the value in
/// place, so merge order decides which value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.0.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(idx).1)
    }

    /// Merge `other` into `self`; values from `other` win.
    pub fn extend<I, K, V>(&mut self, other: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in other {
            self.insert(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.extend(iter);
        headers
    }
}

/// How a response body is interpreted, derived from the `Accept` type that
/// was sent. The server's own `Content-Type` is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Xml,
    Plain,
}

impl BodyFormat {
    pub fn from_accept(accept: &str) -> Self {
        let media = accept.split(';').next().unwrap_or("").trim();
        if media.eq_ignore_ascii_case(APPLICATION_XML) || media.eq_ignore_ascii_case("text/xml") {
            BodyFormat::Xml
        } else if media.eq_ignore_ascii_case(TEXT_HTML) || media.eq_ignore_ascii_case("text/plain") {
            BodyFormat::Plain
        } else {
            BodyFormat::Json
        }
    }
}

/// The `Accept` / `Content-Type` pair sent with every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    accept: String,
    content_type: String,
}

impl Negotiation {
    pub fn new(accept: &str, content_type: &str) -> Result<Self> {
        if accept.trim().is_empty() {
            return Err(RestError::config("accept type header can not be empty"));
        }
        Ok(Self {
            accept: accept.to_string(),
            content_type: content_type.to_string(),
        })
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

impl Default for Negotiation {
    fn default() -> Self {
        Self {
            accept: APPLICATION_JSON.to_string(),
            content_type: APPLICATION_JSON.to_string(),
        }
    }
}

/// Per-call options: extra headers plus the negotiation pair.
///
/// A fresh value starts every call chain, so headers set for one call never
/// reach the next one on the same client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Headers,
    pub negotiation: Negotiation,
}

/// Request body handed to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    /// Already-serialized payload, sent as-is.
    Raw(Vec<u8>),
    /// Plain form fields. Only valid for uploads, where they ride along with
    /// the file parts.
    Fields(Vec<(String, String)>),
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Raw(value.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Raw(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Raw(value)
    }
}

impl From<Option<String>> for Body {
    fn from(value: Option<String>) -> Self {
        value.map(Body::from).unwrap_or_default()
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// An HTTP response described as plain data, as returned by a transport.
/// The body is kept as received; it need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}
