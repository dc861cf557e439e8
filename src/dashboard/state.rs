//! Dashboard UI State
//!
//! Everything the page would hold in its controls, as one value owned by
//! the session and passed by reference to each handler.

use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::dto::{Metadata, Preview};
use super::plot::Viewport;
use super::stats::clamp_group_cap;

/// Enable flag of an action control (a button)
#[derive(Debug, Clone)]
pub struct Control {
    enabled: Arc<AtomicBool>,
}

impl Control {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Disable the control until the returned guard drops.
    ///
    /// Returns `None` when the control is already disabled. Advisory only:
    /// it keeps one action from being submitted twice, nothing more.
    pub fn hold(&self) -> Option<ControlGuard> {
        self.enabled
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| ControlGuard {
                enabled: Arc::clone(&self.enabled),
            })
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Re-enables its control on every exit path
#[derive(Debug)]
pub struct ControlGuard {
    enabled: Arc<AtomicBool>,
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        self.enabled.store(true, Ordering::SeqCst);
    }
}

/// Preview rendered to strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    /// `None` when the preview has no columns
    pub fn from_preview(preview: &Preview) -> Option<Self> {
        if preview.columns.is_empty() {
            return None;
        }

        let rows = preview
            .rows
            .iter()
            .map(|row| {
                preview
                    .columns
                    .iter()
                    .map(|column| cell_text(row.get(column)))
                    .collect()
            })
            .collect();

        Some(Self {
            header: preview.columns.clone(),
            rows,
        })
    }
}

/// Missing and null render empty; strings render bare
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The dashboard's view state
#[derive(Debug, Clone)]
pub struct UiState {
    /// Status line
    pub status: String,
    /// Row and column counts, when the backend reports a row count
    pub summary: Option<String>,
    pub metric_options: Vec<String>,
    pub group_options: Vec<String>,
    pub selected_metric: Option<String>,
    pub selected_group: Option<String>,
    /// Raw text of the group-cap control
    pub group_cap_input: String,
    /// CSV chosen for upload
    pub selected_file: Option<PathBuf>,
    pub upload_control: Control,
    pub reset_control: Control,
    /// Boxplot and correlation actions
    pub actions_enabled: bool,
    pub preview: Option<PreviewTable>,
    /// Min/mean/max line of the last boxplot
    pub box_stats: Option<String>,
    pub viewport: Viewport,
}

impl UiState {
    pub fn new(default_group_cap: u32, viewport: Viewport) -> Self {
        Self {
            status: String::new(),
            summary: None,
            metric_options: Vec::new(),
            group_options: Vec::new(),
            selected_metric: None,
            selected_group: None,
            group_cap_input: default_group_cap.to_string(),
            selected_file: None,
            upload_control: Control::default(),
            reset_control: Control::default(),
            actions_enabled: false,
            preview: None,
            box_stats: None,
            viewport,
        }
    }

    /// Populate options from metadata, in the order received
    pub fn apply_metadata(&mut self, meta: &Metadata) {
        self.metric_options = meta.numeric_columns.clone();
        self.group_options = meta.group_columns.clone();
        self.selected_metric = keep_or_first(self.selected_metric.take(), &self.metric_options);
        self.selected_group = keep_or_first(self.selected_group.take(), &self.group_options);
        self.actions_enabled = !self.metric_options.is_empty() && !self.group_options.is_empty();

        self.summary = meta.row_count.map(|rows| {
            format!(
                "Rows: {} · Numeric columns: {} · Group columns: {}",
                rows,
                self.metric_options.len(),
                self.group_options.len()
            )
        });
    }

    /// Empty both option lists and disable the chart actions
    pub fn clear_options(&mut self) {
        self.metric_options.clear();
        self.group_options.clear();
        self.selected_metric = None;
        self.selected_group = None;
        self.actions_enabled = false;
        self.summary = None;
    }

    /// Select a metric; only listed options are accepted
    pub fn select_metric(&mut self, name: &str) -> bool {
        select(&self.metric_options, &mut self.selected_metric, name)
    }

    /// Select a group column; only listed options are accepted
    pub fn select_group(&mut self, name: &str) -> bool {
        select(&self.group_options, &mut self.selected_group, name)
    }

    /// Current group cap, clamped
    pub fn group_cap(&self) -> u32 {
        clamp_group_cap(&self.group_cap_input)
    }
}

fn keep_or_first(current: Option<String>, options: &[String]) -> Option<String> {
    current
        .filter(|c| options.contains(c))
        .or_else(|| options.first().cloned())
}

fn select(options: &[String], slot: &mut Option<String>, name: &str) -> bool {
    if options.iter().any(|o| o == name) {
        *slot = Some(name.to_string());
        true
    } else {
        false
    }
}
