//! Plotting
//!
//! Figures are Plotly documents (`data`, `layout`, `config`). A [`Plotter`]
//! puts a figure into a named chart container; [`HtmlPlotter`] writes a
//! standalone page per container that loads plotly.js.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::dto::{BoxplotData, CorrelationData};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Named chart slot on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartContainer {
    Boxplot,
    Correlation,
}

impl ChartContainer {
    pub const ALL: [ChartContainer; 2] = [ChartContainer::Boxplot, ChartContainer::Correlation];

    /// Element id of the container
    pub fn id(&self) -> &'static str {
        match self {
            ChartContainer::Boxplot => "boxplot",
            ChartContainer::Correlation => "corr",
        }
    }
}

/// Viewport size used when re-laying out charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One Plotly trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Box {
        y: Vec<Value>,
        name: String,
    },
    Heatmap {
        z: Vec<Vec<Option<f64>>>,
        x: Vec<String>,
        y: Vec<String>,
        colorscale: String,
        zmin: f64,
        zmax: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boxmode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    pub responsive: bool,
    #[serde(rename = "displayModeBar")]
    pub display_mode_bar: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            responsive: true,
            display_mode_bar: true,
        }
    }
}

/// A complete Plotly figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
    #[serde(default)]
    pub config: PlotConfig,
}

impl Figure {
    /// One box trace per group, paired positionally with its values.
    /// Groups without a value array are skipped.
    pub fn boxplot(metric: &str, group_by: &str, data: &BoxplotData) -> Self {
        let traces = data
            .groups
            .iter()
            .zip(data.values.iter())
            .map(|(name, values)| Trace::Box {
                y: values.clone(),
                name: name.clone(),
            })
            .collect();

        Self {
            data: traces,
            layout: Layout {
                title: format!("{} by {}", metric, group_by),
                boxmode: Some("group".to_string()),
                width: None,
                height: None,
            },
            config: PlotConfig::default(),
        }
    }

    /// Single heatmap over a fixed [-1, 1] color domain
    pub fn correlation(data: &CorrelationData) -> Self {
        Self {
            data: vec![Trace::Heatmap {
                z: data.matrix.clone(),
                x: data.labels.clone(),
                y: data.labels.clone(),
                colorscale: "RdBu".to_string(),
                zmin: -1.0,
                zmax: 1.0,
            }],
            layout: Layout {
                title: "Correlation Matrix".to_string(),
                boxmode: None,
                width: None,
                height: None,
            },
            config: PlotConfig::default(),
        }
    }
}

impl Figure {
    /// Size the layout to a viewport
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.layout.width = Some(viewport.width);
        self.layout.height = Some(viewport.height);
        self
    }
}

/// Plotting errors
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("chart '{0}' has not been rendered yet")]
    NotRendered(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("figure encoding error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The plotting library seam
pub trait Plotter: Send + Sync {
    /// Draw a figure into a container, replacing what was there
    fn new_plot(&self, container: ChartContainer, figure: &Figure) -> Result<(), PlotError>;

    /// Recompute the container layout for a viewport
    fn resize(&self, container: ChartContainer, viewport: Viewport) -> Result<(), PlotError>;
}

/// Writes `<dir>/<id>.json` and `<dir>/<id>.html` per container
pub struct HtmlPlotter {
    dir: PathBuf,
}

impl HtmlPlotter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_path(&self, container: ChartContainer) -> PathBuf {
        self.dir.join(format!("{}.html", container.id()))
    }

    pub fn figure_path(&self, container: ChartContainer) -> PathBuf {
        self.dir.join(format!("{}.json", container.id()))
    }

    fn write(&self, container: ChartContainer, figure: &Figure) -> Result<(), PlotError> {
        std::fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(figure)?;
        std::fs::write(self.figure_path(container), &json)?;
        std::fs::write(self.page_path(container), render_page(container, figure, &json))?;

        tracing::debug!(chart = container.id(), path = ?self.page_path(container), "Chart written");
        Ok(())
    }
}

impl Plotter for HtmlPlotter {
    fn new_plot(&self, container: ChartContainer, figure: &Figure) -> Result<(), PlotError> {
        self.write(container, figure)
    }

    fn resize(&self, container: ChartContainer, viewport: Viewport) -> Result<(), PlotError> {
        let path = self.figure_path(container);
        if !path.exists() {
            return Err(PlotError::NotRendered(container.id()));
        }

        let mut figure: Figure = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        figure.layout.width = Some(viewport.width);
        figure.layout.height = Some(viewport.height);

        self.write(container, &figure)
    }
}

fn render_page(container: ChartContainer, figure: &Figure, json: &str) -> String {
    // Keep the figure from closing the script element early
    let embedded = json.replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="{id}" style="width:100%;height:95vh;"></div>
<script>
const figure = {embedded};
Plotly.newPlot('{id}', figure.data, figure.layout, figure.config);
window.addEventListener('resize', () => {{
  try {{ Plotly.Plots.resize('{id}') }} catch (e) {{}}
}});
</script>
</body>
</html>
"#,
        title = escape_html(&figure.layout.title),
        cdn = PLOTLY_CDN,
        id = container.id(),
        embedded = embedded,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_boxplot() -> BoxplotData {
        BoxplotData {
            groups: vec!["A".to_string(), "B".to_string()],
            values: vec![vec![json!(1), json!(2), json!(3)], vec![json!(4), json!(5)]],
        }
    }

    #[test]
    fn test_boxplot_figure_pairs_groups() {
        let figure = Figure::boxplot("sales", "department", &sample_boxplot());

        assert_eq!(figure.data.len(), 2);
        assert_eq!(
            figure.data[0],
            Trace::Box {
                y: vec![json!(1), json!(2), json!(3)],
                name: "A".to_string()
            }
        );
        assert_eq!(figure.layout.title, "sales by department");
        assert_eq!(figure.layout.boxmode.as_deref(), Some("group"));
    }

    #[test]
    fn test_boxplot_skips_unpaired_groups() {
        let data = BoxplotData {
            groups: vec!["A".to_string(), "B".to_string()],
            values: vec![vec![json!(1)]],
        };
        assert_eq!(Figure::boxplot("m", "g", &data).data.len(), 1);
    }

    #[test]
    fn test_figure_serializes_as_plotly() {
        let data = CorrelationData {
            labels: vec!["a".to_string(), "b".to_string()],
            matrix: vec![vec![Some(1.0), Some(0.5)], vec![Some(0.5), Some(1.0)]],
        };
        let value = serde_json::to_value(Figure::correlation(&data)).unwrap();

        assert_eq!(value["data"][0]["type"], "heatmap");
        assert_eq!(value["data"][0]["zmin"], -1.0);
        assert_eq!(value["data"][0]["zmax"], 1.0);
        assert_eq!(value["data"][0]["x"], value["data"][0]["y"]);
        assert_eq!(value["layout"]["title"], "Correlation Matrix");
        assert!(value["layout"].get("boxmode").is_none());
        assert_eq!(value["config"]["displayModeBar"], true);
    }

    #[test]
    fn test_html_plotter_writes_page_and_figure() {
        let dir = tempdir().unwrap();
        let plotter = HtmlPlotter::new(dir.path().join("plots"));

        plotter
            .new_plot(
                ChartContainer::Boxplot,
                &Figure::boxplot("sales", "dept", &sample_boxplot()),
            )
            .unwrap();

        let page = std::fs::read_to_string(plotter.page_path(ChartContainer::Boxplot)).unwrap();
        assert!(page.contains("Plotly.newPlot('boxplot'"));
        assert!(page.contains("<title>sales by dept</title>"));
        assert!(plotter.figure_path(ChartContainer::Boxplot).exists());
    }

    #[test]
    fn test_resize_before_render_fails() {
        let dir = tempdir().unwrap();
        let plotter = HtmlPlotter::new(dir.path());

        let err = plotter
            .resize(ChartContainer::Correlation, Viewport::new(800, 600))
            .unwrap_err();
        assert!(matches!(err, PlotError::NotRendered("corr")));
    }

    #[test]
    fn test_resize_applies_viewport() {
        let dir = tempdir().unwrap();
        let plotter = HtmlPlotter::new(dir.path());
        let data = CorrelationData {
            labels: vec!["a".to_string()],
            matrix: vec![vec![Some(1.0)]],
        };

        plotter
            .new_plot(ChartContainer::Correlation, &Figure::correlation(&data))
            .unwrap();
        plotter
            .resize(ChartContainer::Correlation, Viewport::new(640, 480))
            .unwrap();

        let figure: Figure = serde_json::from_str(
            &std::fs::read_to_string(plotter.figure_path(ChartContainer::Correlation)).unwrap(),
        )
        .unwrap();
        assert_eq!(figure.layout.width, Some(640));
        assert_eq!(figure.layout.height, Some(480));
    }

    #[test]
    fn test_script_close_is_escaped() {
        let data = BoxplotData {
            groups: vec!["</script>".to_string()],
            values: vec![vec![json!(1)]],
        };
        let figure = Figure::boxplot("m", "g", &data);
        let json = serde_json::to_string(&figure).unwrap();
        let page = render_page(ChartContainer::Boxplot, &figure, &json);
        assert!(!page.contains("\"</script>\""));
    }
}
