//! Per-group REST client and its fluent call builder.
//!
//! # Design
//! A `Client` owns what lives as long as its configuration group: the group
//! config, the transport and the GET cache. Everything that belongs to a
//! single call (extra headers, the `Accept`/`Content-Type` pair) travels in a
//! `RequestOptions` value that `Call` builds up and hands to `execute`, so a
//! header set for one call can never leak into the next.
//!
//! GET responses are cached per resolved URL for the lifetime of the client
//! and returned as the same `Arc<Response>`. A cache hit skips both the
//! transport and authorization. There is no invalidation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::Authorization;
use crate::config::GroupConfig;
use crate::error::{RestError, Result};
use crate::http::{Body, Headers, HttpMethod, HttpRequest, Negotiation, RequestOptions, METHOD_OVERRIDE};
use crate::inspect::{Exchange, Inspector};
use crate::response::Response;
use crate::transport::Transport;
use crate::upload::{FormField, UploadPayload};

pub struct Client<T> {
    group: String,
    config: GroupConfig,
    transport: T,
    inspector: Option<Arc<dyn Inspector>>,
    cache: HashMap<String, Arc<Response>>,
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("group", &self.group)
            .field("service", &self.config.service)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl<T: Transport> Client<T> {
    pub fn new(group: impl Into<String>, config: GroupConfig, transport: T) -> Self {
        Self {
            group: group.into(),
            config,
            transport,
            inspector: None,
            cache: HashMap::new(),
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn Inspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    /// Start a call chain with cleared headers and JSON/JSON negotiation.
    pub fn call(&mut self) -> Call<'_, T> {
        Call {
            client: self,
            options: RequestOptions::default(),
        }
    }

    /// Join the group's base URL and `uri`. A trailing slash on the base is
    /// dropped; an empty base leaves `uri` untouched.
    pub fn resolve(&self, uri: &str) -> String {
        let base = self.config.service.trim_end_matches('/');
        if base.is_empty() {
            uri.to_string()
        } else {
            format!("{base}/{uri}")
        }
    }

    pub fn cached(&self, uri: &str) -> Option<Arc<Response>> {
        self.cache.get(&self.resolve(uri)).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn execute(
        &mut self,
        method: HttpMethod,
        uri: &str,
        body: Body,
        options: &RequestOptions,
    ) -> Result<Arc<Response>> {
        let url = self.resolve(uri);
        let span = tracing::debug_span!("rest", group = %self.group, %method, %url);
        let _enter = span.enter();

        if method == HttpMethod::Get {
            if let Some(hit) = self.cache.get(&url) {
                tracing::debug!("serving GET from cache");
                return Ok(Arc::clone(hit));
            }
        }

        let mut headers = options.headers.clone();
        self.authorize(&mut headers)?;

        let body = match (method, body) {
            (HttpMethod::Get, _) => None,
            (_, Body::Empty) => Some(Vec::new()),
            (_, Body::Raw(bytes)) => Some(bytes),
            (_, Body::Fields(_)) => {
                return Err(RestError::InvalidBody(
                    "request data must be passed as a string or bytes",
                ));
            }
        };
        if let Some(bytes) = &body {
            headers.insert("Content-Length", bytes.len().to_string());
        }
        negotiate(&mut headers, &options.negotiation);

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let started = Instant::now();
        let raw = self.transport.execute(&request)?;
        let response = Arc::new(Response::from_http(raw, options.negotiation.accept()));
        tracing::debug!(status = response.status(), elapsed = ?started.elapsed(), "request completed");
        self.inspect(method.as_str(), &request.url, &request.headers, &response, started);

        if method == HttpMethod::Get {
            self.cache.insert(request.url, Arc::clone(&response));
        }
        Ok(response)
    }

    pub fn get(&mut self, uri: &str, options: &RequestOptions) -> Result<Arc<Response>> {
        self.execute(HttpMethod::Get, uri, Body::Empty, options)
    }

    pub fn post(&mut self, uri: &str, body: impl Into<Body>, options: &RequestOptions) -> Result<Arc<Response>> {
        self.execute(HttpMethod::Post, uri, body.into(), options)
    }

    pub fn put(&mut self, uri: &str, body: impl Into<Body>, options: &RequestOptions) -> Result<Arc<Response>> {
        self.execute(HttpMethod::Put, uri, body.into(), options)
    }

    pub fn delete(&mut self, uri: &str, body: impl Into<Body>, options: &RequestOptions) -> Result<Arc<Response>> {
        self.execute(HttpMethod::Delete, uri, body.into(), options)
    }

    /// Upload the files in `uploads` (or only the `lookup` field) as a
    /// multipart POST. `data` may carry extra text fields. Uploads are never
    /// cached.
    pub fn files(
        &mut self,
        uri: &str,
        data: Body,
        uploads: &UploadPayload,
        lookup: Option<&str>,
        options: &RequestOptions,
    ) -> Result<Arc<Response>> {
        let mut fields = uploads.to_form(lookup)?;
        match data {
            Body::Empty => {}
            Body::Fields(extra) => {
                fields.extend(extra.into_iter().map(|(name, value)| FormField::text(name, value)));
            }
            Body::Raw(_) => {
                return Err(RestError::InvalidBody("upload data must be passed as form fields"));
            }
        }

        // The transport sets the multipart content type; only Accept is negotiated.
        let mut headers = options.headers.clone();
        self.authorize(&mut headers)?;
        headers.remove("Content-Type");
        headers.insert("Accept", options.negotiation.accept());

        let url = self.resolve(uri);
        let span = tracing::debug_span!("rest", group = %self.group, method = "POST", %url);
        let _enter = span.enter();

        let started = Instant::now();
        let raw = self.transport.upload_multipart(&url, &headers, &fields)?;
        let response = Response::from_http(raw, options.negotiation.accept());
        tracing::debug!(
            status = response.status(),
            files = fields.len(),
            elapsed = ?started.elapsed(),
            "upload completed"
        );
        self.inspect("files", &url, &headers, &response, started);

        Ok(Arc::new(response))
    }

    fn authorize(&self, headers: &mut Headers) -> Result<()> {
        if let Some(config) = &self.config.authorization {
            let auth = Authorization::from_config(config)?;
            let (name, value) = auth.header();
            headers.insert(name, value);
        }
        Ok(())
    }

    fn inspect(&self, label: &str, url: &str, headers: &Headers, response: &Response, started: Instant) {
        if let Some(inspector) = &self.inspector {
            inspector.record(&Exchange {
                label,
                url,
                request_headers: headers,
                response,
                elapsed: started.elapsed(),
            });
        }
    }
}

fn negotiate(headers: &mut Headers, negotiation: &Negotiation) {
    headers.insert("Accept", negotiation.accept());
    headers.insert("Content-Type", negotiation.content_type());
}

/// One call chain against a [`Client`].
///
/// ```ignore
/// let response = registry
///     .instance("storage")?
///     .override_method(HttpMethod::Put)
///     .files("images", Body::Empty, &uploads, Some("images"))?;
/// ```
pub struct Call<'a, T> {
    client: &'a mut Client<T>,
    options: RequestOptions,
}

impl<T> fmt::Debug for Call<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("group", &self.client.group)
            .field("options", &self.options)
            .finish()
    }
}

impl<'a, T: Transport> Call<'a, T> {
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name, value);
        self
    }

    /// Merge several headers at once.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.headers.extend(headers);
        self
    }

    /// Ask the server to treat the request as `method`. The verb actually
    /// sent does not change.
    pub fn override_method(self, method: HttpMethod) -> Self {
        self.header(METHOD_OVERRIDE, method.as_str())
    }

    pub fn negotiate(mut self, accept: &str, content_type: &str) -> Result<Self> {
        self.options.negotiation = Negotiation::new(accept, content_type)?;
        Ok(self)
    }

    /// Change only the expected response type; the request stays JSON.
    pub fn negotiate_accept(self, accept: &str) -> Result<Self> {
        self.negotiate(accept, crate::http::APPLICATION_JSON)
    }

    pub fn get(self, uri: &str) -> Result<Arc<Response>> {
        self.client.get(uri, &self.options)
    }

    pub fn post(self, uri: &str, body: impl Into<Body>) -> Result<Arc<Response>> {
        self.client.post(uri, body, &self.options)
    }

    pub fn put(self, uri: &str, body: impl Into<Body>) -> Result<Arc<Response>> {
        self.client.put(uri, body, &self.options)
    }

    pub fn delete(self, uri: &str, body: impl Into<Body>) -> Result<Arc<Response>> {
        self.client.delete(uri, body, &self.options)
    }

    pub fn files(
        self,
        uri: &str,
        data: Body,
        uploads: &UploadPayload,
        lookup: Option<&str>,
    ) -> Result<Arc<Response>> {
        self.client.files(uri, data, uploads, lookup, &self.options)
    }
}
