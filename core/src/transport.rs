//! Executing `HttpRequest`s.
//!
//! The client core never performs I/O itself; a `Transport` does. The store
//! is written against the trait so tests can script responses, and
//! `ReqwestTransport` is the implementation used against a real backend.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::trace;

use crate::error::ApiError;
use crate::http::{Body, FormData, FormValue, HttpMethod, HttpRequest, HttpResponse};

/// Executes one request and reports the response for every status code.
///
/// Only failures that produce no response at all are `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        trace!(method = request.method.as_str(), url = %request.url, "sending request");

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        // Content-Type for multipart (with boundary) is set by reqwest.
        if let Body::Multipart(form) = request.body {
            builder = builder.multipart(to_multipart(form)?);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.text().await?;

        trace!(status, "received response");
        Ok(HttpResponse { status, headers, body })
    }
}

fn to_multipart(form: FormData) -> Result<Form, ApiError> {
    let mut out = Form::new();
    for (name, value) in form.fields {
        out = match value {
            FormValue::Text(text) => out.text(name, text),
            FormValue::File(file) => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)?;
                out.part(name, part)
            }
        };
    }
    Ok(out)
}
