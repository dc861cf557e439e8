//! HTTP Forwarder
//!
//! The transport seam of the relay. The handler builds a [`ForwardRequest`]
//! and an [`HttpForwarder`] performs it; [`ReqwestForwarder`] is the
//! production implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect, Client, Method};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Which inbound headers are dropped before forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Drop `host` only
    StripHost,
    /// Drop `host` and `content-length`
    #[default]
    StripHostAndContentLength,
}

impl HeaderPolicy {
    /// Lowercase names removed under this policy
    pub fn stripped(&self) -> &'static [&'static str] {
        match self {
            HeaderPolicy::StripHost => &["host"],
            HeaderPolicy::StripHostAndContentLength => &["host", "content-length"],
        }
    }

    /// Whether a header name survives, compared case-insensitively
    pub fn allows(&self, name: &str) -> bool {
        !self
            .stripped()
            .iter()
            .any(|stripped| name.eq_ignore_ascii_case(stripped))
    }

    /// Copy the allowed headers, keeping the received name case
    pub fn filter(&self, headers: &BTreeMap<String, String>) -> Vec<(String, String)> {
        headers
            .iter()
            .filter(|(name, _)| self.allows(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// A fully resolved request to send upstream
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// What came back from upstream
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Errors raised while forwarding
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Performs one upstream request
#[async_trait]
pub trait HttpForwarder: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse, ForwardError>;
}

/// Forwarder backed by a shared `reqwest` client
pub struct ReqwestForwarder {
    client: Client,
}

impl ReqwestForwarder {
    /// Create a forwarder with a request timeout.
    ///
    /// Redirects are not followed; the upstream's 3xx is relayed as-is.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpForwarder for ReqwestForwarder {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse, ForwardError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ForwardError::InvalidMethod(request.method.clone()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping header that cannot be forwarded"),
            }
        }

        let mut builder = self.client.request(method, &request.url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?.to_vec();

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> BTreeMap<String, String> {
        [
            ("Host", "relay.example"),
            ("Content-Length", "42"),
            ("X-Request-Source", "dashboard"),
            ("accept", "application/json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_strip_host_keeps_content_length() {
        let kept = HeaderPolicy::StripHost.filter(&headers());
        let names: Vec<&str> = kept.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["Content-Length", "X-Request-Source", "accept"]);
    }

    #[test]
    fn test_strict_policy_drops_both() {
        let kept = HeaderPolicy::StripHostAndContentLength.filter(&headers());
        let names: Vec<&str> = kept.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["X-Request-Source", "accept"]);
    }

    #[test]
    fn test_allows_is_case_insensitive() {
        assert!(!HeaderPolicy::StripHost.allows("HOST"));
        assert!(HeaderPolicy::StripHost.allows("content-length"));
        assert!(!HeaderPolicy::default().allows("CONTENT-LENGTH"));
    }

    #[tokio::test]
    async fn test_invalid_method_rejected() {
        let forwarder = ReqwestForwarder::new(Duration::from_secs(1)).unwrap();
        let err = forwarder
            .forward(ForwardRequest {
                method: "GE T".to_string(),
                url: "http://127.0.0.1:9/api/meta".to_string(),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::InvalidMethod(_)));
    }
}
