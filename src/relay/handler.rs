//! Relay Handler
//!
//! Turns one [`RelayEvent`] into one [`RelayResponse`]:
//!
//! 1. check the upstream is configured
//! 2. rewrite the public prefix to `/api` and re-attach the query
//! 3. resolve against the upstream base URL
//! 4. copy headers through the [`HeaderPolicy`](super::HeaderPolicy)
//! 5. forward and relay status, content type and body unchanged

use reqwest::Url;
use std::collections::BTreeMap;

use super::error::{RelayError, RelayResult};
use super::event::{RelayEvent, RelayResponse};
use super::forwarder::ForwardRequest;
use super::state::RelayState;

/// Upstream API namespace the public prefix maps to
pub const UPSTREAM_PREFIX: &str = "/api";

/// Handle one inbound event. Never fails: errors become 500/502 responses.
pub async fn handle_event(state: &RelayState, event: RelayEvent) -> RelayResponse {
    let request_id = uuid::Uuid::new_v4().to_string();

    match relay(state, event, &request_id).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                status = response.status_code,
                "Relayed upstream response"
            );
            response
        }
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                status = err.status_code(),
                error = %err,
                "Relay failed"
            );
            err.into()
        }
    }
}

async fn relay(state: &RelayState, event: RelayEvent, request_id: &str) -> RelayResult<RelayResponse> {
    let backend = state
        .backend_url
        .as_deref()
        .ok_or(RelayError::MissingBackendUrl)?;

    let path = rewrite_path(&event.path, &state.public_prefix);
    let target = resolve_target(backend, &path, &event.query_string_parameters)?;
    let body = event.body_bytes()?;

    let request = ForwardRequest {
        method: event.method().to_string(),
        url: target.to_string(),
        headers: state.header_policy.filter(&event.headers),
        body,
    };

    tracing::debug!(
        request_id = %request_id,
        method = %request.method,
        target = %request.url,
        "Forwarding request"
    );

    let upstream = state.forwarder.forward(request).await?;
    Ok(RelayResponse::from_upstream(upstream))
}

/// Replace the public prefix with `/api`; other paths pass through unchanged
pub fn rewrite_path(path: &str, public_prefix: &str) -> String {
    match path.strip_prefix(public_prefix) {
        Some(rest) => format!("{}{}", UPSTREAM_PREFIX, rest),
        None => path.to_string(),
    }
}

/// Form-encode query parameters, ordered by key
pub fn serialize_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Resolve a rewritten path plus query against the upstream base URL
pub fn resolve_target(
    backend: &str,
    path: &str,
    params: &BTreeMap<String, String>,
) -> RelayResult<Url> {
    let invalid = |reason: String| RelayError::InvalidBackendUrl {
        url: backend.to_string(),
        reason,
    };

    let base = Url::parse(backend).map_err(|e| invalid(e.to_string()))?;

    let query = serialize_query(params);
    let reference = if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    };

    base.join(&reference).map_err(|e| invalid(e.to_string()))
}
