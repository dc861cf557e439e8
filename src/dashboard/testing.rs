//! Test doubles for the backend and plotting seams.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::client::{ApiReply, BackendApi};
use super::dto::BoxplotQuery;
use super::error::BackendError;
use super::plot::{ChartContainer, Figure, PlotError, Plotter, Viewport};

/// Canned replies per endpoint, with a call log
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<HashMap<&'static str, Result<ApiReply, String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `endpoint` with a status and JSON body
    pub fn reply(self, endpoint: &'static str, status: u16, body: serde_json::Value) -> Self {
        let status_text = match status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "",
        };
        self.set(
            endpoint,
            Ok(ApiReply::new(status, status_text, body.to_string())),
        )
    }

    /// Answer `endpoint` with a raw reply
    pub fn raw(self, endpoint: &'static str, reply: ApiReply) -> Self {
        self.set(endpoint, Ok(reply))
    }

    /// Fail `endpoint` at the transport level
    pub fn unreachable(self, endpoint: &'static str, message: &str) -> Self {
        self.set(endpoint, Err(message.to_string()))
    }

    fn set(self, endpoint: &'static str, reply: Result<ApiReply, String>) -> Self {
        self.replies.lock().unwrap().insert(endpoint, reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, endpoint: &'static str, call: String) -> Result<ApiReply, BackendError> {
        self.calls.lock().unwrap().push(call);
        match self.replies.lock().unwrap().get(endpoint) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(message)) => Err(BackendError::Other(message.clone())),
            None => Ok(ApiReply::new(404, "Not Found", "")),
        }
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn meta(&self) -> Result<ApiReply, BackendError> {
        self.answer("meta", "meta".to_string())
    }

    async fn preview(&self) -> Result<ApiReply, BackendError> {
        self.answer("preview", "preview".to_string())
    }

    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<ApiReply, BackendError> {
        self.answer("upload", format!("upload {} {}", file_name, contents.len()))
    }

    async fn reset(&self) -> Result<ApiReply, BackendError> {
        self.answer("reset", "reset".to_string())
    }

    async fn boxplot(&self, query: &BoxplotQuery) -> Result<ApiReply, BackendError> {
        self.answer("boxplot", format!("boxplot?{}", query.to_query_string()))
    }

    async fn correlation(&self) -> Result<ApiReply, BackendError> {
        self.answer("correlation", "correlation".to_string())
    }
}

/// Keeps every plotted figure; resizing an unplotted container fails
#[derive(Default)]
pub struct RecordingPlotter {
    plots: Mutex<Vec<(ChartContainer, Figure)>>,
    resizes: Mutex<Vec<(ChartContainer, Viewport)>>,
}

impl RecordingPlotter {
    pub fn plots(&self) -> Vec<(ChartContainer, Figure)> {
        self.plots.lock().unwrap().clone()
    }

    pub fn resizes(&self) -> Vec<(ChartContainer, Viewport)> {
        self.resizes.lock().unwrap().clone()
    }
}

impl Plotter for RecordingPlotter {
    fn new_plot(&self, container: ChartContainer, figure: &Figure) -> Result<(), PlotError> {
        self.plots.lock().unwrap().push((container, figure.clone()));
        Ok(())
    }

    fn resize(&self, container: ChartContainer, viewport: Viewport) -> Result<(), PlotError> {
        let plotted = self.plots.lock().unwrap().iter().any(|(c, _)| *c == container);
        if !plotted {
            return Err(PlotError::NotRendered(container.id()));
        }
        self.resizes.lock().unwrap().push((container, viewport));
        Ok(())
    }
}
