//! The I/O boundary.
//!
//! # Design
//! The client never opens sockets itself. It hands a finished `HttpRequest`
//! (or a multipart form) to a `Transport` and wraps whatever comes back.
//! Non-2xx statuses must be returned as `Ok(HttpResponse)`; only failures to
//! obtain a response at all are `Err`.

use crate::error::TransportError;
use crate::http::{Headers, HttpRequest, HttpResponse};
use crate::upload::FormField;

pub trait Transport {
    /// Perform a plain request.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// POST `fields` as `multipart/form-data` to `url`.
    fn upload_multipart(
        &self,
        url: &str,
        headers: &Headers,
        fields: &[FormField],
    ) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }

    fn upload_multipart(
        &self,
        url: &str,
        headers: &Headers,
        fields: &[FormField],
    ) -> Result<HttpResponse, TransportError> {
        (**self).upload_multipart(url, headers, fields)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }

    fn upload_multipart(
        &self,
        url: &str,
        headers: &Headers,
        fields: &[FormField],
    ) -> Result<HttpResponse, TransportError> {
        (**self).upload_multipart(url, headers, fields)
    }
}

#[cfg(feature = "reqwest")]
pub use self::blocking::BlockingTransport;

#[cfg(feature = "reqwest")]
mod blocking {
    use std::time::Duration;

    use reqwest::blocking::multipart::{Form, Part};
    use reqwest::blocking::{Client, RequestBuilder};
    use reqwest::Method;

    use super::Transport;
    use crate::config::RestConfig;
    use crate::error::TransportError;
    use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};
    use crate::upload::{has_control, FormField, FormValue};

    /// Blocking transport backed by a shared `reqwest` client.
    ///
    /// Statuses are never turned into errors, so 4xx/5xx responses reach the
    /// caller as data. Multipart bodies are built with `reqwest`'s form
    /// encoder, which quotes part names and filenames.
    #[derive(Debug, Clone)]
    pub struct BlockingTransport {
        client: Client,
    }

    impl BlockingTransport {
        pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
            let client = Client::builder().timeout(timeout).build().map_err(backend)?;
            Ok(Self { client })
        }

        pub fn from_config(config: &RestConfig) -> Result<Self, TransportError> {
            Self::new(config.timeout_secs.map(Duration::from_secs))
        }

        fn collect(response: reqwest::blocking::Response) -> Result<HttpResponse, TransportError> {
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().map_err(backend)?.to_vec();
            Ok(HttpResponse { status, headers, body })
        }
    }

    impl Transport for BlockingTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let method = match request.method {
                HttpMethod::Get => Method::GET,
                HttpMethod::Post => Method::POST,
                HttpMethod::Put => Method::PUT,
                HttpMethod::Delete => Method::DELETE,
            };
            let mut builder = with_headers(self.client.request(method, &request.url), &request.headers);
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().map_err(backend)?;
            Self::collect(response)
        }

        fn upload_multipart(
            &self,
            url: &str,
            headers: &Headers,
            fields: &[FormField],
        ) -> Result<HttpResponse, TransportError> {
            let form = form(fields)?;
            let mut headers = headers.clone();
            headers.remove("Content-Type");

            let response = with_headers(self.client.post(url), &headers)
                .multipart(form)
                .send()
                .map_err(backend)?;
            Self::collect(response)
        }
    }

    /// Build the form, opening every file part. Filenames with control
    /// characters and invalid mime types are rejected before anything is sent.
    fn form(fields: &[FormField]) -> Result<Form, TransportError> {
        fields.iter().try_fold(Form::new(), |form, field| -> Result<Form, TransportError> {
            Ok(match &field.value {
                FormValue::Text(text) => form.text(field.name.clone(), text.clone()),
                FormValue::File(file) => {
                    if has_control(&file.filename) {
                        return Err(TransportError::Backend(format!(
                            "control character in upload filename {:?}",
                            file.filename
                        )));
                    }
                    let part = Part::file(&file.path)?
                        .file_name(file.filename.clone())
                        .mime_str(&file.mime_type)
                        .map_err(backend)?;
                    form.part(field.name.clone(), part)
                }
            })
        })
    }

    /// Copy headers onto a request. `Content-Length` is left to `reqwest`,
    /// which derives it from the body it actually sends.
    fn with_headers(mut builder: RequestBuilder, headers: &Headers) -> RequestBuilder {
        for (name, value) in headers.iter() {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name, value);
        }
        builder
    }

    fn backend(e: reqwest::Error) -> TransportError {
        TransportError::Backend(e.to_string())
    }

}
