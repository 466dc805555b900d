//! Request/response inspection hook.
//!
//! An [`Inspector`] sees every exchange that actually reached the transport,
//! with timing. Cached GET hits are not exchanges and are not reported.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::http::Headers;
use crate::response::Response;

/// One completed round-trip.
#[derive(Debug)]
pub struct Exchange<'a> {
    /// `GET`, `POST`, ... or `files` for uploads.
    pub label: &'a str,
    pub url: &'a str,
    pub request_headers: &'a Headers,
    pub response: &'a Response,
    pub elapsed: Duration,
}

pub trait Inspector: Send + Sync {
    fn record(&self, exchange: &Exchange<'_>);
}

/// Owned copy of an [`Exchange`], as kept by [`ExchangeLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExchange {
    pub label: String,
    pub url: String,
    pub request_headers: Headers,
    pub status: u16,
    pub elapsed: Duration,
}

/// In-memory inspector. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct ExchangeLog {
    entries: Arc<Mutex<Vec<RecordedExchange>>>,
}

impl ExchangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedExchange> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inspector for ExchangeLog {
    fn record(&self, exchange: &Exchange<'_>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(RecordedExchange {
                label: exchange.label.to_string(),
                url: exchange.url.to_string(),
                request_headers: exchange.request_headers.clone(),
                status: exchange.response.status(),
                elapsed: exchange.elapsed,
            });
        }
    }
}
