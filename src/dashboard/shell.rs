//! Interactive Session
//!
//! A line-oriented front end for [`Dashboard`]: one command per line, the
//! state printed after each.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::client::BackendApi;
use super::controller::Dashboard;
use super::plot::{Plotter, Viewport};
use super::state::{PreviewTable, UiState};

const HELP: &str = "\
Commands:
  file <path>       choose the CSV to upload
  upload            upload the chosen file
  reset             clear all backend data
  metric <name>     select the boxplot metric
  group <name>      select the group-by column
  cap <n>           set the maximum number of groups (1-50)
  boxplot           render the boxplot
  corr              render the correlation heatmap
  preview           show the data preview
  resize <w> <h>    re-layout the charts
  status            show the current state
  help              show this help
  quit              leave";

/// One parsed session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    File(PathBuf),
    Upload,
    Reset,
    Metric(String),
    Group(String),
    Cap(String),
    Boxplot,
    Correlation,
    Preview,
    Resize(Viewport),
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse a line. `Ok(None)` for a blank line; `Err` carries a hint.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "file" => Command::File(PathBuf::from(required(rest, "file <path>")?)),
            "upload" => Command::Upload,
            "reset" => Command::Reset,
            "metric" => Command::Metric(required(rest, "metric <name>")?.to_string()),
            "group" => Command::Group(required(rest, "group <name>")?.to_string()),
            "cap" => Command::Cap(rest.to_string()),
            "boxplot" | "box" => Command::Boxplot,
            "corr" | "correlation" => Command::Correlation,
            "preview" => Command::Preview,
            "resize" => Command::Resize(parse_viewport(rest)?),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };

        Ok(Some(command))
    }
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(arg)
    }
}

fn parse_viewport(args: &str) -> Result<Viewport, String> {
    let usage = || "Usage: resize <width> <height>".to_string();
    let mut parts = args.split_whitespace();

    let width = parts.next().and_then(|w| w.parse().ok()).ok_or_else(usage)?;
    let height = parts.next().and_then(|h| h.parse().ok()).ok_or_else(usage)?;
    if parts.next().is_some() {
        return Err(usage());
    }

    Ok(Viewport::new(width, height))
}

/// Run the session until `quit` or end of input
pub async fn run_session<B, P, R, W>(
    dashboard: &Dashboard<B, P>,
    ui: &mut UiState,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    B: BackendApi,
    P: Plotter,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    dashboard.init(ui).await;
    writeln!(out, "{}", render_state(ui))?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(hint) => {
                writeln!(out, "{}", hint)?;
                continue;
            }
        };

        tracing::debug!(?command, "Session command");

        match command {
            Command::File(path) => ui.selected_file = Some(path),
            Command::Upload => dashboard.upload(ui).await,
            Command::Reset => dashboard.reset(ui).await,
            Command::Metric(name) => {
                if !ui.select_metric(&name) {
                    writeln!(out, "Unknown metric '{}'", name)?;
                }
            }
            Command::Group(name) => {
                if !ui.select_group(&name) {
                    writeln!(out, "Unknown group column '{}'", name)?;
                }
            }
            Command::Cap(text) => ui.group_cap_input = text,
            Command::Boxplot => dashboard.render_boxplot(ui).await,
            Command::Correlation => dashboard.render_correlation(ui).await,
            Command::Preview => {
                dashboard.refresh_preview(ui).await;
                writeln!(out, "{}", render_preview(ui.preview.as_ref()))?;
            }
            Command::Resize(viewport) => dashboard.handle_resize(ui, viewport),
            Command::Status => {}
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            Command::Quit => break,
        }

        writeln!(out, "{}", render_state(ui))?;
    }

    Ok(())
}

/// Status, summary, options and stats lines
pub fn render_state(ui: &UiState) -> String {
    let mut lines = Vec::new();

    if !ui.status.is_empty() {
        lines.push(format!("Status:  {}", ui.status));
    }
    if let Some(summary) = &ui.summary {
        lines.push(format!("Summary: {}", summary));
    }
    if let Some(path) = &ui.selected_file {
        lines.push(format!("File:    {}", path.display()));
    }

    lines.push(format!("Metrics: {}", options_line(&ui.metric_options, &ui.selected_metric)));
    lines.push(format!("Groups:  {}", options_line(&ui.group_options, &ui.selected_group)));
    lines.push(format!(
        "Cap:     {}{}",
        ui.group_cap(),
        if ui.actions_enabled { "" } else { "  (charts disabled)" }
    ));

    if let Some(stats) = &ui.box_stats {
        lines.push(format!("Stats:   {}", stats));
    }

    lines.join("\n")
}

/// Selected option is marked with `*`
fn options_line(options: &[String], selected: &Option<String>) -> String {
    if options.is_empty() {
        return "-".to_string();
    }

    options
        .iter()
        .map(|option| {
            if selected.as_deref() == Some(option.as_str()) {
                format!("*{}", option)
            } else {
                option.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_preview(preview: Option<&PreviewTable>) -> String {
    let Some(preview) = preview else {
        return "No preview available.".to_string();
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(preview.header.clone());

    for row in &preview.rows {
        table.add_row(row.clone());
    }

    table.to_string()
}
