//! Dashboard Client
//!
//! Upload a CSV, inspect it, visualize it. The handlers in [`controller`]
//! talk to the Backend API through [`BackendApi`] and draw through
//! [`Plotter`]; all view state lives in one [`UiState`].
//!
//! # Backend API
//!
//! Relative to the API base:
//!
//! - `GET meta` - numeric/group columns and row count
//! - `GET preview` - first rows
//! - `POST upload` - multipart CSV under field `file`
//! - `POST reset` - clear everything
//! - `GET boxplot?metric=&group_by=&max_groups=` - grouped values
//! - `GET correlation` - correlation matrix

pub mod client;
pub mod controller;
pub mod dto;
pub mod error;
pub mod plot;
pub mod shell;
pub mod state;
pub mod stats;

#[cfg(test)]
mod testing;

pub use client::{ApiReply, BackendApi, HttpBackend};
pub use controller::Dashboard;
pub use error::{failure_message, BackendError};
pub use plot::{ChartContainer, Figure, HtmlPlotter, PlotError, Plotter, Viewport};
pub use shell::run_session;
pub use state::UiState;
pub use stats::{clamp_group_cap, SummaryStats, DEFAULT_GROUP_CAP};
