//! Dashboard Handlers
//!
//! The upload → inspect → visualize workflow. Each handler takes the
//! session's [`UiState`] by reference and reports every outcome through
//! it; nothing here returns an error to the caller.

use super::client::{ApiReply, BackendApi};
use super::dto::{BoxplotData, BoxplotQuery, CorrelationData, Metadata, Preview, RecordCount};
use super::error::BackendError;
use super::plot::{ChartContainer, Figure, Plotter, Viewport};
use super::state::{PreviewTable, UiState};
use super::stats::{flatten_numeric, SummaryStats};

pub const SELECT_FILE: &str = "Select a CSV file";
pub const NO_DATA: &str = "No data. Upload a CSV first.";
pub const BACKEND_NOT_CONNECTED: &str =
    "Backend not connected. Start the backend or check the API base URL.";

/// Drives the Backend API and the plotter on behalf of a [`UiState`]
pub struct Dashboard<B, P> {
    api: B,
    plotter: P,
}

impl<B: BackendApi, P: Plotter> Dashboard<B, P> {
    pub fn new(api: B, plotter: P) -> Self {
        Self { api, plotter }
    }

    pub fn api(&self) -> &B {
        &self.api
    }

    pub fn plotter(&self) -> &P {
        &self.plotter
    }

    /// Runs once at load
    pub async fn init(&self, ui: &mut UiState) {
        self.refresh_metadata(ui).await;
    }

    /// Reload option lists and the summary line.
    ///
    /// Fails open: on any failure the lists are emptied and the chart
    /// actions disabled, but the session keeps going.
    pub async fn refresh_metadata(&self, ui: &mut UiState) {
        let reply = match self.api.meta().await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Metadata request failed: {}", e);
                ui.clear_options();
                ui.status = BACKEND_NOT_CONNECTED.to_string();
                return;
            }
        };

        if !reply.is_success() {
            ui.clear_options();
            ui.status = format!("Error: {}", reply.failure_message("metadata request failed"));
            return;
        }

        match reply.json::<Metadata>() {
            Ok(meta) => {
                tracing::debug!(
                    numeric = meta.numeric_columns.len(),
                    group = meta.group_columns.len(),
                    "Metadata refreshed"
                );
                ui.apply_metadata(&meta);
            }
            Err(e) => {
                ui.clear_options();
                ui.status = format!("Error: invalid metadata response: {}", e);
            }
        }
    }

    /// Reload the preview table. Failures leave the current table alone.
    pub async fn refresh_preview(&self, ui: &mut UiState) {
        let reply = match self.api.preview().await {
            Ok(reply) if reply.is_success() => reply,
            Ok(reply) => {
                tracing::warn!(status = reply.status, "Preview request rejected");
                return;
            }
            Err(e) => {
                tracing::warn!("Preview request failed: {}", e);
                return;
            }
        };

        match reply.json::<Preview>() {
            Ok(preview) => ui.preview = PreviewTable::from_preview(&preview),
            Err(e) => tracing::warn!("Invalid preview response: {}", e),
        }
    }

    /// Send the selected CSV to the backend
    pub async fn upload(&self, ui: &mut UiState) {
        let Some(path) = ui.selected_file.clone() else {
            ui.status = SELECT_FILE.to_string();
            return;
        };

        let Some(_guard) = ui.upload_control.hold() else {
            tracing::debug!("Upload already in progress");
            return;
        };

        ui.status = "Uploading...".to_string();

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                ui.status = format!("Error: cannot read {}: {}", path.display(), e);
                return;
            }
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());

        match self.api.upload(&file_name, contents).await {
            Ok(reply) if reply.is_success() => {
                ui.status = format!("Uploaded. Total records: {}", total_records(&reply));
                tracing::info!(file = %file_name, "Upload accepted");
                self.refresh_metadata(ui).await;
                self.refresh_preview(ui).await;
            }
            Ok(reply) => {
                ui.status = format!("Error: {}", reply.failure_message("upload failed"));
            }
            Err(e) => ui.status = network_error(&e),
        }
    }

    /// Clear all backend data
    pub async fn reset(&self, ui: &mut UiState) {
        let Some(_guard) = ui.reset_control.hold() else {
            tracing::debug!("Reset already in progress");
            return;
        };

        ui.status = "Clearing data...".to_string();

        match self.api.reset().await {
            Ok(reply) if reply.is_success() => {
                ui.status = format!("Cleared. Total records: {}", total_records(&reply));
                ui.preview = None;
                ui.box_stats = None;
                self.refresh_metadata(ui).await;
            }
            Ok(reply) => {
                ui.status = format!("Error: {}", reply.failure_message("reset failed"));
            }
            Err(e) => ui.status = network_error(&e),
        }
    }

    /// Fetch and plot the boxplot for the current selection
    pub async fn render_boxplot(&self, ui: &mut UiState) {
        if !ui.actions_enabled {
            tracing::debug!("Boxplot requested while actions are disabled");
            return;
        }
        let (Some(metric), Some(group_by)) = (ui.selected_metric.clone(), ui.selected_group.clone())
        else {
            return;
        };

        let query = BoxplotQuery {
            metric,
            group_by,
            max_groups: ui.group_cap(),
        };

        let data: BoxplotData = match self.fetch(ui, self.api.boxplot(&query).await, "boxplot failed") {
            Some(data) => data,
            None => return,
        };

        ui.box_stats = SummaryStats::from_values(&flatten_numeric(&data.values)).map(|s| s.describe());

        let figure =
            Figure::boxplot(&query.metric, &query.group_by, &data).with_viewport(ui.viewport);
        if let Err(e) = self.plotter.new_plot(ChartContainer::Boxplot, &figure) {
            ui.status = format!("Error: {}", e);
        }
    }

    /// Fetch and plot the correlation heatmap
    pub async fn render_correlation(&self, ui: &mut UiState) {
        if !ui.actions_enabled {
            tracing::debug!("Correlation requested while actions are disabled");
            return;
        }

        let data: CorrelationData =
            match self.fetch(ui, self.api.correlation().await, "correlation failed") {
                Some(data) => data,
                None => return,
            };

        if data.labels.is_empty() {
            ui.status = NO_DATA.to_string();
            return;
        }

        let figure = Figure::correlation(&data).with_viewport(ui.viewport);
        if let Err(e) = self.plotter.new_plot(ChartContainer::Correlation, &figure) {
            ui.status = format!("Error: {}", e);
        }
    }

    /// Re-layout both charts for a new viewport. Best effort.
    pub fn handle_resize(&self, ui: &mut UiState, viewport: Viewport) {
        ui.viewport = viewport;

        for container in ChartContainer::ALL {
            if let Err(e) = self.plotter.resize(container, viewport) {
                tracing::debug!(chart = container.id(), "Resize skipped: {}", e);
            }
        }
    }

    /// Decode a visualization reply, reporting failures on the status line
    fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        ui: &mut UiState,
        result: Result<ApiReply, BackendError>,
        generic: &str,
    ) -> Option<T> {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                ui.status = network_error(&e);
                return None;
            }
        };

        if !reply.is_success() {
            ui.status = format!("Error: {}", reply.failure_message(generic));
            return None;
        }

        match reply.json::<T>() {
            Ok(data) => Some(data),
            Err(e) => {
                ui.status = format!("Error: invalid response: {}", e);
                None
            }
        }
    }
}

fn total_records(reply: &ApiReply) -> String {
    reply
        .json::<RecordCount>()
        .ok()
        .and_then(|count| count.total_records)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn network_error(err: &BackendError) -> String {
    format!("Network error: {}", err)
}
