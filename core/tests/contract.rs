//! Client behaviour checked against a recording transport.
//!
//! # Design
//! `Spy` records every request it receives and answers with a canned
//! response, so each test can assert both what went over the wire and how
//! many times the transport was reached.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rest_core::{
    Authorization, AuthMethod, Body, ClientRegistry, ExchangeLog, FormField, FormValue, GroupConfig, Headers,
    HttpMethod, HttpRequest, HttpResponse, Parsed, RestConfig, RestError, TransportError, UploadError,
    UploadPayload, UploadedFile, APPLICATION_JSON, APPLICATION_XML, METHOD_OVERRIDE, TEXT_HTML,
};
use rest_core::transport::Transport;
use serde::Deserialize;

#[derive(Debug, Clone)]
struct Upload {
    url: String,
    headers: Headers,
    fields: Vec<FormField>,
}

/// Shared, cloneable recording transport.
#[derive(Clone)]
struct Spy {
    requests: Rc<RefCell<Vec<HttpRequest>>>,
    uploads: Rc<RefCell<Vec<Upload>>>,
    reply: Rc<RefCell<HttpResponse>>,
}

impl Spy {
    fn new() -> Self {
        Self {
            requests: Rc::default(),
            uploads: Rc::default(),
            reply: Rc::new(RefCell::new(HttpResponse {
                status: 200,
                headers: [("Content-Type", "application/json")].into_iter().collect(),
                body: br#"{"a":1}"#.to_vec(),
            })),
        }
    }

    fn reply_with(&self, status: u16, body: &str) {
        let mut reply = self.reply.borrow_mut();
        reply.status = status;
        reply.body = body.as_bytes().to_vec();
    }

    fn calls(&self) -> usize {
        self.requests.borrow().len() + self.uploads.borrow().len()
    }

    fn last(&self) -> HttpRequest {
        self.requests.borrow().last().cloned().unwrap()
    }
}

impl Transport for Spy {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        Ok(self.reply.borrow().clone())
    }

    fn upload_multipart(
        &self,
        url: &str,
        headers: &Headers,
        fields: &[FormField],
    ) -> Result<HttpResponse, TransportError> {
        self.uploads.borrow_mut().push(Upload {
            url: url.to_string(),
            headers: headers.clone(),
            fields: fields.to_vec(),
        });
        Ok(self.reply.borrow().clone())
    }
}

fn config() -> RestConfig {
    let mut config = RestConfig::default();
    config
        .insert("open", GroupConfig::new("http://x/"))
        .insert(
            "secure",
            GroupConfig::new("http://secure.test/api").with_authorization("basic", "alice", "s3cret"),
        )
        .insert(
            "digest",
            GroupConfig::new("http://digest.test").with_authorization("digest", "alice", "s3cret"),
        )
        .insert(
            "no-password",
            GroupConfig::new("http://x").with_authorization("basic", "alice", ""),
        );
    config
}

fn registry() -> (ClientRegistry<Spy>, Spy) {
    let spy = Spy::new();
    (ClientRegistry::new(config(), spy.clone()), spy)
}

#[derive(Debug, Deserialize, PartialEq)]
struct Record {
    a: i64,
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[test]
fn basic_header_is_base64_of_credentials() {
    for (user, pass) in [("alice", "s3cret"), ("a", "b"), ("user name", "p:a:s:s"), ("žluť", "ключ")] {
        let auth = Authorization::new(user, pass, AuthMethod::Basic).unwrap();
        let expected = format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")));
        assert_eq!(auth.header(), ("Authorization", expected.as_str()));
    }
}

#[test]
fn configured_credentials_are_sent() {
    let (mut registry, spy) = registry();
    registry.instance("secure").unwrap().get("users").unwrap();

    let sent = spy.last();
    assert_eq!(sent.url, "http://secure.test/api/users");
    let expected = format!("Basic {}", STANDARD.encode("alice:s3cret"));
    assert_eq!(sent.headers.get("authorization"), Some(expected.as_str()));
}

#[test]
fn bad_auth_config_fails_before_transport() {
    let (mut registry, spy) = registry();
    let err = registry.instance("digest").unwrap().get("x").unwrap_err();
    assert!(matches!(err, RestError::Configuration(_)));
    let err = registry.instance("no-password").unwrap().post("x", "{}").unwrap_err();
    assert!(matches!(err, RestError::Configuration(_)));
    assert_eq!(spy.calls(), 0);
}

// ---------------------------------------------------------------------------
// GET cache
// ---------------------------------------------------------------------------

#[test]
fn repeated_get_is_served_from_cache() {
    let (mut registry, spy) = registry();
    let first = registry.instance("open").unwrap().get("items").unwrap();
    let second = registry.instance("open").unwrap().get("items").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(spy.calls(), 1);
}

#[test]
fn cache_is_keyed_by_resolved_url() {
    let (mut registry, spy) = registry();
    registry.instance("open").unwrap().get("items").unwrap();
    registry.instance("open").unwrap().get("items/1").unwrap();
    registry.instance("secure").unwrap().get("items").unwrap();
    assert_eq!(spy.calls(), 3);
    assert_eq!(registry.client("open").unwrap().cache_len(), 2);
}

#[test]
fn cache_ignores_negotiation_and_headers() {
    let (mut registry, spy) = registry();
    let first = registry.instance("open").unwrap().get("items").unwrap();
    let second = registry
        .instance("open")
        .unwrap()
        .header("X-Custom", "1")
        .negotiate_accept(APPLICATION_XML)
        .unwrap()
        .get("items")
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.accept(), APPLICATION_JSON);
    assert_eq!(spy.calls(), 1);
}

#[test]
fn non_get_calls_are_never_cached() {
    let (mut registry, spy) = registry();
    for _ in 0..2 {
        registry.instance("open").unwrap().post("items", "{}").unwrap();
        registry.instance("open").unwrap().put("items/1", "{}").unwrap();
        registry.instance("open").unwrap().delete("items/1", Body::Empty).unwrap();
    }
    assert_eq!(spy.calls(), 6);
    assert_eq!(registry.client("open").unwrap().cache_len(), 0);
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[test]
fn structured_body_fails_before_transport() {
    let (mut registry, spy) = registry();
    let fields = Body::Fields(vec![("a".to_string(), "1".to_string())]);
    for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete] {
        let options = Default::default();
        let err = registry
            .client("open")
            .unwrap()
            .execute(method, "items", fields.clone(), &options)
            .unwrap_err();
        assert!(matches!(err, RestError::InvalidBody(_)), "{method}");
    }
    assert_eq!(spy.calls(), 0);
}

#[test]
fn get_ignores_body() {
    let (mut registry, spy) = registry();
    let options = Default::default();
    registry
        .client("open")
        .unwrap()
        .execute(HttpMethod::Get, "items", Body::from("ignored"), &options)
        .unwrap();
    assert!(spy.last().body.is_none());
}

#[test]
fn content_length_matches_body() {
    let (mut registry, spy) = registry();
    registry.instance("open").unwrap().put("items/1", "héllo").unwrap();
    let sent = spy.last();
    assert_eq!(sent.method, HttpMethod::Put);
    assert_eq!(sent.headers.get("content-length"), Some("6"));
    assert_eq!(sent.body.as_deref(), Some("héllo".as_bytes()));
}

// ---------------------------------------------------------------------------
// Negotiation and parsing
// ---------------------------------------------------------------------------

#[test]
fn default_negotiation_decodes_json() {
    let (mut registry, _spy) = registry();
    let resp = registry.instance("open").unwrap().get("items").unwrap();

    assert_eq!(resp.as_array().unwrap(), Parsed::Decoded(serde_json::json!({"a": 1})));
    let record: Record = resp.as_object().unwrap().decoded().unwrap();
    assert_eq!(record, Record { a: 1 });
}

#[test]
fn plain_negotiation_returns_raw_body() {
    let (mut registry, spy) = registry();
    let resp = registry
        .instance("open")
        .unwrap()
        .negotiate(TEXT_HTML, APPLICATION_JSON)
        .unwrap()
        .post("render", "{}")
        .unwrap();

    assert_eq!(spy.last().headers.get("accept"), Some(TEXT_HTML));
    let body: &[u8] = br#"{"a":1}"#;
    assert_eq!(resp.as_array().unwrap(), Parsed::Raw(body));
    assert_eq!(resp.as_object::<Record>().unwrap(), Parsed::Raw(body));
}

#[test]
fn xml_negotiation_converts_body() {
    let (mut registry, spy) = registry();
    spy.reply_with(200, "<r><a>1</a></r>");
    let resp = registry
        .instance("open")
        .unwrap()
        .negotiate(APPLICATION_XML, APPLICATION_XML)
        .unwrap()
        .get("doc")
        .unwrap();
    let sent = spy.last();
    assert_eq!(sent.headers.get("Accept"), Some(APPLICATION_XML));
    assert_eq!(sent.headers.get("Content-Type"), Some(APPLICATION_XML));
    assert_eq!(resp.as_array().unwrap(), Parsed::Decoded(serde_json::json!({"a": "1"})));
}

#[test]
fn empty_accept_is_configuration_error() {
    let (mut registry, _spy) = registry();
    let err = registry.instance("open").unwrap().negotiate("", APPLICATION_JSON).unwrap_err();
    assert!(matches!(err, RestError::Configuration(_)));
}

#[test]
fn error_statuses_are_responses() {
    let (mut registry, spy) = registry();
    spy.reply_with(500, r#"{"error":"boom"}"#);
    let resp = registry.instance("open").unwrap().delete("items/1", Body::Empty).unwrap();
    assert_eq!(resp.status(), 500);
    assert!(!resp.is_success());
    assert_eq!(resp.header("content-type"), Some("application/json"));
}

// ---------------------------------------------------------------------------
// URL resolution and per-call state
// ---------------------------------------------------------------------------

#[test]
fn base_url_joins_without_double_slash() {
    let mut config = RestConfig::default();
    config
        .insert("slash", GroupConfig::new("http://x/"))
        .insert("bare", GroupConfig::new("http://x"));
    let spy = Spy::new();
    let mut registry = ClientRegistry::new(config, spy.clone());

    registry.instance("slash").unwrap().post("y", "").unwrap();
    assert_eq!(spy.last().url, "http://x/y");
    registry.instance("bare").unwrap().post("y", "").unwrap();
    assert_eq!(spy.last().url, "http://x/y");
}

#[test]
fn second_instance_starts_clean() {
    let (mut registry, spy) = registry();
    registry
        .instance("open")
        .unwrap()
        .header("X-Custom", "leak?")
        .override_method(HttpMethod::Put)
        .negotiate(APPLICATION_XML, TEXT_HTML)
        .unwrap()
        .post("first", "{}")
        .unwrap();
    let first = spy.last();
    assert_eq!(first.headers.get("x-custom"), Some("leak?"));
    assert_eq!(first.headers.get(METHOD_OVERRIDE), Some("PUT"));

    let call = registry.instance("open").unwrap();
    assert!(call.options().headers.is_empty());
    assert_eq!(call.options().negotiation.accept(), APPLICATION_JSON);
    call.post("second", "{}").unwrap();

    let second = spy.last();
    assert!(second.headers.get("x-custom").is_none());
    assert!(second.headers.get(METHOD_OVERRIDE).is_none());
    assert_eq!(second.headers.get("accept"), Some(APPLICATION_JSON));
    assert_eq!(second.headers.get("content-type"), Some(APPLICATION_JSON));
}

#[test]
fn method_override_does_not_change_verb() {
    let (mut registry, spy) = registry();
    registry
        .instance("open")
        .unwrap()
        .override_method(HttpMethod::Delete)
        .post("items/1", "")
        .unwrap();
    let sent = spy.last();
    assert_eq!(sent.method, HttpMethod::Post);
    assert_eq!(sent.headers.get("X-HTTP-Method-Override"), Some("DELETE"));
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

fn payload() -> UploadPayload {
    let mut payload = UploadPayload::new();
    payload
        .add("images", UploadedFile::new("a.png", "/tmp/upload-a", "image/png", 12))
        .add("images", UploadedFile::new("b.jpg", "/tmp/upload-b", "image/jpeg", 34));
    payload
}

#[test]
fn upload_rewrites_files_into_references() {
    let (mut registry, spy) = registry();
    let data = Body::Fields(vec![("album".to_string(), "summer".to_string())]);
    let resp = registry
        .instance("secure")
        .unwrap()
        .override_method(HttpMethod::Put)
        .files("storage", data, &payload(), Some("images"))
        .unwrap();
    assert_eq!(resp.status(), 200);

    let uploads = spy.uploads.borrow();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.url, "http://secure.test/api/storage");
    assert_eq!(upload.headers.get(METHOD_OVERRIDE), Some("PUT"));
    assert!(upload.headers.get("authorization").unwrap().starts_with("Basic "));

    let rendered: Vec<(String, String)> = upload
        .fields
        .iter()
        .map(|f| {
            let value = match &f.value {
                FormValue::File(file) => file.to_string(),
                FormValue::Text(text) => text.clone(),
            };
            (f.name.clone(), value)
        })
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("files[0]".to_string(), "@/tmp/upload-a;filename=a.png;type=image/png".to_string()),
            ("files[1]".to_string(), "@/tmp/upload-b;filename=b.jpg;type=image/jpeg".to_string()),
            ("album".to_string(), "summer".to_string()),
        ]
    );
}

#[test]
fn upload_negotiates_accept_only() {
    let (mut registry, spy) = registry();
    registry
        .instance("open")
        .unwrap()
        .header("Content-Type", "text/csv")
        .negotiate(APPLICATION_XML, APPLICATION_XML)
        .unwrap()
        .files("storage", Body::Empty, &payload(), None)
        .unwrap();

    let uploads = spy.uploads.borrow();
    let headers = &uploads[0].headers;
    assert_eq!(headers.get("accept"), Some(APPLICATION_XML));
    assert!(headers.get("content-type").is_none());
}

#[test]
fn empty_lookup_uploads_every_field() {
    let (mut registry, spy) = registry();
    let mut uploads = payload();
    uploads.add("docs", UploadedFile::new("c.txt", "/tmp/upload-c", "text/plain", 1));
    registry
        .instance("open")
        .unwrap()
        .files("storage", Body::Empty, &uploads, Some(""))
        .unwrap();
    assert_eq!(spy.uploads.borrow()[0].fields.len(), 3);
}

#[test]
fn upload_without_files_fails_before_transport() {
    let (mut registry, spy) = registry();
    let err = registry
        .instance("open")
        .unwrap()
        .files("storage", Body::Empty, &UploadPayload::new(), None)
        .unwrap_err();
    assert!(matches!(err, RestError::NoFiles));

    let err = registry
        .instance("open")
        .unwrap()
        .files("storage", Body::Empty, &payload(), Some("documents"))
        .unwrap_err();
    assert!(matches!(err, RestError::NoFiles));
    assert_eq!(spy.calls(), 0);
}

#[test]
fn invalid_upload_is_validation_error() {
    let (mut registry, spy) = registry();
    let mut broken = payload();
    broken.add(
        "images",
        UploadedFile::new("c.gif", "/tmp/upload-c", "image/gif", 0).with_error(UploadError::Partial),
    );
    let err = registry
        .instance("open")
        .unwrap()
        .files("storage", Body::Empty, &broken, Some("images"))
        .unwrap_err();
    assert!(matches!(err, RestError::Validation(_)));
    assert_eq!(spy.calls(), 0);
}

#[test]
fn upload_rejects_raw_data() {
    let (mut registry, spy) = registry();
    let err = registry
        .instance("open")
        .unwrap()
        .files("storage", Body::from("raw"), &payload(), None)
        .unwrap_err();
    assert!(matches!(err, RestError::InvalidBody(_)));
    assert_eq!(spy.calls(), 0);
}

#[test]
fn uploads_are_not_cached() {
    let (mut registry, spy) = registry();
    for _ in 0..2 {
        registry
            .instance("open")
            .unwrap()
            .files("storage", Body::Empty, &payload(), None)
            .unwrap();
    }
    assert_eq!(spy.calls(), 2);
}

// ---------------------------------------------------------------------------
// Inspector
// ---------------------------------------------------------------------------

#[test]
fn inspector_sees_real_exchanges_only() {
    let spy = Spy::new();
    let log = ExchangeLog::new();
    let mut registry = ClientRegistry::new(config(), spy.clone()).with_inspector(log.clone());

    registry.instance("open").unwrap().get("items").unwrap();
    registry.instance("open").unwrap().get("items").unwrap();
    registry.instance("open").unwrap().post("items", "{}").unwrap();
    registry
        .instance("open")
        .unwrap()
        .files("storage", Body::Empty, &payload(), None)
        .unwrap();

    let entries = log.entries();
    let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["GET", "POST", "files"]);
    assert_eq!(entries[0].url, "http://x/items");
    assert_eq!(entries[1].request_headers.get("content-length"), Some("2"));
}
