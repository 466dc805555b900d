use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Headers the echo endpoints report back.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SeenHeaders {
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub authorization: Option<String>,
    pub method_override: Option<String>,
    pub custom: Option<String>,
}

impl SeenHeaders {
    fn from_map(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            accept: get("accept"),
            content_type: get("content-type"),
            content_length: get("content-length"),
            authorization: get("authorization"),
            method_override: get("x-http-method-override"),
            custom: get("x-custom"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub headers: SeenHeaders,
    pub body: String,
    /// How many echo requests the server had seen, this one included.
    pub hit: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadedPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    /// Contents of non-file parts.
    pub text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadReport {
    pub headers: SeenHeaders,
    pub parts: Vec<UploadedPart>,
}

pub const XML_DOCUMENT: &str =
    r#"<?xml version="1.0"?><catalog version="2"><item>first</item><item>second</item><owner><name>Ann</name></owner></catalog>"#;

pub const PLAIN_DOCUMENT: &str = "<p>{\"not\": \"decoded\"}</p>";

/// PNG signature followed by bytes that are not valid UTF-8.
pub const BINARY_DOCUMENT: &[u8] = &[0x89, b'P', b'N', b'G', 0xff, 0xfe, 0x00, 0x01];

pub type Hits = Arc<AtomicU64>;

pub fn app() -> Router {
    let hits: Hits = Arc::new(AtomicU64::new(0));
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/hits", get(hit_count))
        .route("/xml", get(xml))
        .route("/plain", get(plain))
        .route("/binary", get(binary))
        .route("/status/{code}", any(status))
        .route("/upload", post(upload))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    State(hits): State<Hits>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let hit = hits.fetch_add(1, Ordering::SeqCst) + 1;
    tracing::debug!(%method, path = uri.path(), hit, "echo");
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: SeenHeaders::from_map(&headers),
        body,
        hit,
    })
}

async fn hit_count(State(hits): State<Hits>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "hits": hits.load(Ordering::SeqCst) }))
}

async fn xml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], XML_DOCUMENT)
}

async fn plain() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], PLAIN_DOCUMENT)
}

async fn binary() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], BINARY_DOCUMENT)
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(serde_json::json!({ "status": code }))))
}

async fn upload(headers: HeaderMap, mut multipart: Multipart) -> Result<Json<UploadReport>, MultipartError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        let text = match filename {
            Some(_) => None,
            None => Some(String::from_utf8_lossy(&bytes).into_owned()),
        };
        parts.push(UploadedPart {
            name,
            filename,
            content_type,
            size: bytes.len(),
            text,
        });
    }
    tracing::debug!(parts = parts.len(), "upload received");
    Ok(Json(UploadReport {
        headers: SeenHeaders::from_map(&headers),
        parts,
    }))
}
