//! Backend API Client
//!
//! One call per Backend API endpoint. Calls return the raw [`ApiReply`]
//! so handlers decide how to treat non-2xx answers; only transport
//! failures are errors.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::dto::{BoxplotQuery, ErrorBody};
use super::error::{failure_message, BackendError};

/// A reply from the backend, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    /// Canonical reason phrase, empty when unknown
    pub status_text: String,
    pub body: Vec<u8>,
}

impl ApiReply {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Decode `{error}` leniently; anything unparseable is `None`
    pub fn error_body(&self) -> Option<ErrorBody> {
        self.json().ok()
    }

    /// User-facing description of a failed reply
    pub fn failure_message(&self, generic: &str) -> String {
        failure_message(self.error_body().as_ref(), &self.status_text, generic)
    }
}

/// The Backend API as seen by the dashboard
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// GET meta
    async fn meta(&self) -> Result<ApiReply, BackendError>;

    /// GET preview
    async fn preview(&self) -> Result<ApiReply, BackendError>;

    /// POST upload, multipart field `file`
    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<ApiReply, BackendError>;

    /// POST reset
    async fn reset(&self) -> Result<ApiReply, BackendError>;

    /// GET boxplot
    async fn boxplot(&self, query: &BoxplotQuery) -> Result<ApiReply, BackendError>;

    /// GET correlation
    async fn correlation(&self) -> Result<ApiReply, BackendError>;
}

/// HTTP implementation against an API base such as
/// `http://localhost:8888/.netlify/functions/api` or `http://backend:5000/api`
pub struct HttpBackend {
    client: Client,
    api_base: String,
}

impl HttpBackend {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            // Normalize: remove trailing slash
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.api_base, name)
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiReply, BackendError> {
        let response = request.send().await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Backend replied");

        Ok(ApiReply {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn meta(&self) -> Result<ApiReply, BackendError> {
        tracing::debug!("GET meta");
        self.send(self.client.get(self.endpoint("meta"))).await
    }

    async fn preview(&self) -> Result<ApiReply, BackendError> {
        tracing::debug!("GET preview");
        self.send(self.client.get(self.endpoint("preview"))).await
    }

    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<ApiReply, BackendError> {
        tracing::debug!(file = %file_name, bytes = contents.len(), "POST upload");

        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        self.send(self.client.post(self.endpoint("upload")).multipart(form))
            .await
    }

    async fn reset(&self) -> Result<ApiReply, BackendError> {
        tracing::debug!("POST reset");
        self.send(self.client.post(self.endpoint("reset"))).await
    }

    async fn boxplot(&self, query: &BoxplotQuery) -> Result<ApiReply, BackendError> {
        let url = format!("{}?{}", self.endpoint("boxplot"), query.to_query_string());
        tracing::debug!(%url, "GET boxplot");
        self.send(self.client.get(url)).await
    }

    async fn correlation(&self) -> Result<ApiReply, BackendError> {
        tracing::debug!("GET correlation");
        self.send(self.client.get(self.endpoint("correlation"))).await
    }
}
