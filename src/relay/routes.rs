//! Relay Routes
//!
//! Adapts axum requests to [`RelayEvent`]s and [`RelayResponse`]s back to
//! axum responses, so the HTTP host and the one-shot function path share
//! the same handler.
//!
//! - ANY /.netlify/functions/api/* - Forward to `<BACKEND_URL>/api/*`
//! - GET /health/live - Liveness probe

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::event::{RelayEvent, RelayResponse};
use super::handler::handle_event;
use super::state::RelayState;

/// ANY /.netlify/functions/api/*rest
pub async fn relay_request(
    State(state): State<Arc<RelayState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> RelayResponse {
    let event = event_from_parts(&method, &uri, &headers, body);
    handle_event(&state, event).await
}

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Build a relay event from the pieces of an HTTP request
pub fn event_from_parts(method: &Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> RelayEvent {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            tracing::warn!(header = %name, "Skipping header that is not valid text");
            continue;
        };
        let value = value.to_string();
        merged
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    RelayEvent {
        path: uri.path().to_string(),
        http_method: Some(method.as_str().to_string()),
        headers: merged,
        query_string_parameters: parse_query(uri.query().unwrap_or("")),
        ..Default::default()
    }
    .with_body(body.to_vec())
}

/// Decode a raw query string; later duplicates win
pub fn parse_query(raw: &str) -> BTreeMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_GATEWAY);

        let body = match self.body_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                return (StatusCode::BAD_GATEWAY, format!("proxy error: {}", e)).into_response();
            }
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;

        for (name, value) in &self.headers {
            match (
                header::HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping unrepresentable response header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let params = parse_query("metric=sales%20total&group_by=role&max_groups=12&flag");
        assert_eq!(params.get("metric").unwrap(), "sales total");
        assert_eq!(params.get("group_by").unwrap(), "role");
        assert_eq!(params.get("max_groups").unwrap(), "12");
        assert_eq!(params.get("flag").unwrap(), "");
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_parse_query_plus_is_space() {
        let params = parse_query("metric=customer+satisfaction");
        assert_eq!(params.get("metric").unwrap(), "customer satisfaction");
    }

    #[test]
    fn test_event_from_parts() {
        let uri: Uri = "/.netlify/functions/api/boxplot?metric=sales".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("relay.example"));
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let event = event_from_parts(&Method::GET, &uri, &headers, Bytes::new());

        assert_eq!(event.path, "/.netlify/functions/api/boxplot");
        assert_eq!(event.method(), "GET");
        assert_eq!(event.headers.get("accept").unwrap(), "text/html, application/json");
        assert_eq!(event.query_string_parameters.get("metric").unwrap(), "sales");
        assert!(event.body.is_none());
    }

    #[test]
    fn test_event_skips_binary_header_values() {
        let uri: Uri = "/.netlify/functions/api/meta".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_bytes(&[0x61, 0xff, 0x62]).unwrap());
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let event = event_from_parts(&Method::GET, &uri, &headers, Bytes::new());

        assert!(event.headers.get("x-token").is_none());
        assert_eq!(event.headers.get("accept").unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_into_response_keeps_status_and_body() {
        let mut relayed = RelayResponse::text(404, r#"{"error":"x"}"#);
        relayed
            .headers
            .insert("content-type".to_string(), "application/json".to_string());

        let response = relayed.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"error":"x"}"#);
    }

    #[tokio::test]
    async fn test_liveness() {
        assert_eq!(liveness().await, StatusCode::OK);
    }
}
