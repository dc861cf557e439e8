//! Proxy Relay
//!
//! Stateless forwarder from the public function prefix to the backend's
//! `/api` namespace. The browser talks to the relay's origin, the relay
//! talks to `BACKEND_URL`.
//!
//! # Routes
//!
//! - `ANY /.netlify/functions/api/*` - rewritten to `<BACKEND_URL>/api/*`
//! - `GET /health/live` - Liveness probe
//!
//! The same [`handle_event`] runs behind the axum host ([`serve`]) and the
//! one-shot `csvboard relay invoke` command.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvboard::config::Config;
//! use csvboard::relay::{serve, RelayState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let state = RelayState::from_config(&config.relay)?;
//!     serve(state, &format!("{}:{}", config.relay.host, config.relay.port)).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod event;
pub mod forwarder;
pub mod handler;
pub mod routes;
pub mod state;

pub use error::{RelayError, RelayResult};
pub use event::{RelayEvent, RelayResponse};
pub use forwarder::{
    ForwardError, ForwardRequest, HeaderPolicy, HttpForwarder, ReqwestForwarder, UpstreamResponse,
};
pub use handler::{handle_event, rewrite_path};
pub use state::RelayState;

use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Public path prefix the relay is mounted under
pub const PUBLIC_PREFIX: &str = "/.netlify/functions/api";

/// Build the relay router with all routes and middleware
pub fn build_router(state: RelayState) -> Router {
    let prefix = state.public_prefix.clone();
    let shared_state = Arc::new(state);

    Router::new()
        .route(&prefix, any(routes::relay_request))
        .route(&format!("{}/", prefix), any(routes::relay_request))
        .route(&format!("{}/*rest", prefix), any(routes::relay_request))
        .route("/health/live", get(routes::liveness))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the relay server
pub async fn serve(state: RelayState, addr: &str) -> std::io::Result<()> {
    if state.backend_url.is_none() {
        tracing::warn!("BACKEND_URL not set; every relayed request will answer 500");
    }

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("csvboard relay listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("csvboard relay shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
