//! Relay Event Types
//!
//! Inbound event and outbound response in the serverless function shape.
//! Field names follow the function runtime's JSON (`httpMethod`,
//! `queryStringParameters`, `isBase64Encoded`, `statusCode`).

use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::forwarder::UpstreamResponse;

/// Content type reported when the upstream omits one
pub const FALLBACK_CONTENT_TYPE: &str = "application/json";

/// An inbound request as delivered to the relay function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEvent {
    /// Public request path, including the function prefix
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// HTTP method; `GET` when absent
    #[serde(default)]
    pub http_method: Option<String>,
    /// Inbound headers, names as received
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,
    /// Decoded query parameters
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: BTreeMap<String, String>,
    /// Raw body, base64 when `is_base64_encoded`
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl RelayEvent {
    /// Create a bodiless event for a method and path
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            http_method: Some(method.into()),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters.insert(key.into(), value.into());
        self
    }

    /// Attach a body, base64-encoding it when it is not valid UTF-8
    pub fn with_body(mut self, bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            self.body = None;
            self.is_base64_encoded = false;
            return self;
        }
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.body = Some(text);
                self.is_base64_encoded = false;
            }
            Err(e) => {
                self.body = Some(base64::engine::general_purpose::STANDARD.encode(e.as_bytes()));
                self.is_base64_encoded = true;
            }
        }
        self
    }

    /// Method to forward with
    pub fn method(&self) -> &str {
        match self.http_method.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => "GET",
        }
    }

    /// Body bytes to forward, decoding base64 when flagged
    pub fn body_bytes(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        match &self.body {
            None => Ok(None),
            Some(body) if body.is_empty() => Ok(None),
            Some(body) if self.is_base64_encoded => base64::engine::general_purpose::STANDARD
                .decode(body.as_bytes())
                .map(Some),
            Some(body) => Ok(Some(body.as_bytes().to_vec())),
        }
    }
}

/// The relay's answer, in the function response shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_base64_encoded: bool,
}

impl RelayResponse {
    /// Plain-text response without headers
    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: body.into(),
            is_base64_encoded: false,
        }
    }

    /// Relay an upstream response unchanged
    pub fn from_upstream(upstream: UpstreamResponse) -> Self {
        let content_type = upstream
            .content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type);

        let (body, is_base64_encoded) = match String::from_utf8(upstream.body) {
            Ok(text) => (text, false),
            Err(e) => (
                base64::engine::general_purpose::STANDARD.encode(e.as_bytes()),
                true,
            ),
        };

        Self {
            status_code: upstream.status,
            headers,
            body,
            is_base64_encoded,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// Raw body bytes, decoding base64 when flagged
    pub fn body_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD.decode(self.body.as_bytes())
        } else {
            Ok(self.body.as_bytes().to_vec())
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
