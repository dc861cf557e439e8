//! Relay State
//!
//! Immutable settings and the forwarder, shared by all requests.
//! Wrapped in Arc for sharing across async tasks.

use std::sync::Arc;
use std::time::Duration;

use super::forwarder::{HeaderPolicy, HttpForwarder, ReqwestForwarder};
use super::PUBLIC_PREFIX;
use crate::config::RelaySection;

/// Shared relay state for all handlers
#[derive(Clone)]
pub struct RelayState {
    /// Upstream origin; checked on every request
    pub backend_url: Option<String>,
    /// Public prefix rewritten to `/api`
    pub public_prefix: String,
    /// Which inbound headers are dropped
    pub header_policy: HeaderPolicy,
    /// Transport used to reach the upstream
    pub forwarder: Arc<dyn HttpForwarder>,
}

impl RelayState {
    /// Create state with the default prefix and header policy
    pub fn new(forwarder: Arc<dyn HttpForwarder>, backend_url: Option<String>) -> Self {
        Self {
            backend_url: backend_url.filter(|url| !url.trim().is_empty()),
            public_prefix: PUBLIC_PREFIX.to_string(),
            header_policy: HeaderPolicy::default(),
            forwarder,
        }
    }

    /// Build state from the `[relay]` config section with a reqwest forwarder
    pub fn from_config(config: &RelaySection) -> Result<Self, reqwest::Error> {
        let forwarder = ReqwestForwarder::new(Duration::from_secs(config.request_timeout_secs))?;

        Ok(Self::new(Arc::new(forwarder), config.backend_url.clone())
            .with_prefix(&config.public_prefix)
            .with_header_policy(config.header_policy()))
    }

    /// Use a different public prefix (normalized to a leading slash, no trailing slash)
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_end_matches('/');
        self.public_prefix = if trimmed.is_empty() {
            PUBLIC_PREFIX.to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        self
    }

    pub fn with_header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = policy;
        self
    }
}
