//! # csvboard
//!
//! CSV analytics dashboard and its proxy relay.
//!
//! ## Modules
//!
//! - [`dashboard`]: Upload/inspect/visualize workflow against the Backend API
//! - [`relay`]: Stateless forwarder from the public function prefix to the backend
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csvboard::dashboard::{Dashboard, HtmlPlotter, HttpBackend, UiState, Viewport};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = HttpBackend::new(
//!         "http://localhost:8888/.netlify/functions/api",
//!         Duration::from_secs(30),
//!     )?;
//!     let dashboard = Dashboard::new(api, HtmlPlotter::new("./plots"));
//!     let mut ui = UiState::new(12, Viewport::new(1200, 700));
//!
//!     dashboard.init(&mut ui).await;
//!     ui.selected_file = Some("people.csv".into());
//!     dashboard.upload(&mut ui).await;
//!     dashboard.render_correlation(&mut ui).await;
//!
//!     println!("{}", ui.status);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dashboard;
pub mod relay;

pub use config::{Config, ConfigError, DashboardSection, LoggingConfig, RelaySection};

pub use dashboard::{
    ApiReply, BackendApi, BackendError, Dashboard, HtmlPlotter, HttpBackend, PlotError, Plotter,
    UiState,
};

pub use relay::{
    build_router, handle_event, serve, HeaderPolicy, HttpForwarder, RelayError, RelayEvent,
    RelayResponse, RelayState, ReqwestForwarder,
};
