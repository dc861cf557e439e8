//! csvboard CLI
//!
//! Command-line interface for the CSV analytics dashboard:
//! - Run an interactive dashboard session
//! - Invoke the relay function once on a serverless event
//! - Generate a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use csvboard::config::Config;
use csvboard::dashboard::{run_session, Dashboard, HtmlPlotter, HttpBackend, UiState, Viewport};
use csvboard::relay::{handle_event, RelayEvent, RelayState};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "csvboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upload, inspect and visualize CSV data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/csvboard/config.toml, then ./csvboard.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive dashboard
    Dashboard {
        /// Backend API base URL
        #[arg(long)]
        api_base: Option<String>,
        /// Directory charts are written to
        #[arg(long)]
        plot_dir: Option<PathBuf>,
    },

    /// Relay function operations
    Relay {
        #[command(subcommand)]
        command: RelayCommands,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RelayCommands {
    /// Handle one event and print the function response
    Invoke {
        /// Event JSON file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        event: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve_logged(cli.config.as_deref())?;
    config.logging.init_tracing();

    match cli.command {
        Commands::Dashboard { api_base, plot_dir } => {
            let settings = &config.dashboard;
            let api_base = api_base.unwrap_or_else(|| settings.api_base.clone());
            let plot_dir = plot_dir.unwrap_or_else(|| PathBuf::from(&settings.plot_dir));

            let api = HttpBackend::new(&api_base, Duration::from_secs(settings.request_timeout_secs))
                .context("failed to build HTTP client")?;
            let plotter = HtmlPlotter::new(&plot_dir);
            let dashboard = Dashboard::new(api, plotter);

            let mut ui = UiState::new(
                settings.default_group_cap,
                Viewport::new(settings.viewport_width, settings.viewport_height),
            );

            println!("csvboard v{}", env!("CARGO_PKG_VERSION"));
            println!("API base: {}", api_base);
            println!("Charts:   {}", plot_dir.display());
            println!("Type 'help' for commands.");
            println!();

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            run_session(&dashboard, &mut ui, stdin, &mut stdout).await?;
        }

        Commands::Relay {
            command: RelayCommands::Invoke { event },
        } => {
            let raw = read_event(&event)?;
            let event: RelayEvent =
                serde_json::from_str(&raw).context("event is not a valid function event")?;

            let state = RelayState::from_config(&config.relay)
                .context("failed to build relay HTTP client")?;
            let response = handle_event(&state, event).await;

            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Config { output } => {
            let config = csvboard::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn read_event(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("cannot read event file {}", source))
    }
}
