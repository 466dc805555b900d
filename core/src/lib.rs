//! Blocking REST client core.
//!
//! # Overview
//! Issues GET/POST/PUT/DELETE calls and multipart uploads against named
//! service groups, attaches HTTP Basic authorization, negotiates JSON/XML/plain
//! bodies and memoizes GET responses per resolved URL.
//!
//! # Design
//! - `ClientRegistry` maps group names to `Client`s and is owned by the
//!   caller, not stored in a global.
//! - Per-call state (headers, `Accept`/`Content-Type`) lives in
//!   `RequestOptions`, built fresh by every `Call`.
//! - All I/O goes through the `Transport` trait; `BlockingTransport` is the
//!   bundled `reqwest` implementation, tests plug in recording transports.
//! - Non-2xx statuses are ordinary `Response`s. Only setup problems, bad input,
//!   unparseable bodies and transport failures are errors.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod inspect;
pub mod registry;
pub mod response;
pub mod transport;
pub mod upload;
mod xml;

pub use auth::{AuthMethod, Authorization};
pub use client::{Call, Client};
pub use config::{AuthConfig, GroupConfig, RestConfig};
pub use error::{RestError, Result, TransportError};
pub use http::{
    status, Body, BodyFormat, Headers, HttpMethod, HttpRequest, HttpResponse, Negotiation, RequestOptions,
    APPLICATION_JSON, APPLICATION_XML, METHOD_OVERRIDE, TEXT_HTML,
};
pub use inspect::{Exchange, ExchangeLog, Inspector, RecordedExchange};
pub use registry::ClientRegistry;
pub use response::{Parsed, Response};
pub use transport::Transport;
#[cfg(feature = "reqwest")]
pub use transport::BlockingTransport;
pub use upload::{FileRef, FormField, FormValue, UploadError, UploadPayload, UploadedFile};
