//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::relay::HeaderPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub dashboard: DashboardSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Proxy relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_relay_port")]
    pub port: u16,

    /// Upstream base URL. Usually provided through `BACKEND_URL`.
    #[serde(default)]
    pub backend_url: Option<String>,

    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,

    /// Also strip `content-length` when copying inbound headers
    #[serde(default = "default_true")]
    pub strip_content_length: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_relay_port() -> u16 {
    8888
}

fn default_public_prefix() -> String {
    crate::relay::PUBLIC_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_relay_port(),
            backend_url: None,
            public_prefix: default_public_prefix(),
            strip_content_length: default_true(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl RelaySection {
    /// Header stripping policy selected by this section
    pub fn header_policy(&self) -> HeaderPolicy {
        if self.strip_content_length {
            HeaderPolicy::StripHostAndContentLength
        } else {
            HeaderPolicy::StripHost
        }
    }
}

/// Dashboard client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSection {
    /// Base URL the backend endpoints are resolved against
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Directory chart pages are written to
    #[serde(default = "default_plot_dir")]
    pub plot_dir: String,

    #[serde(default = "default_group_cap")]
    pub default_group_cap: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
}

fn default_api_base() -> String {
    "http://localhost:8888/.netlify/functions/api".to_string()
}

fn default_plot_dir() -> String {
    "./plots".to_string()
}

fn default_group_cap() -> u32 {
    crate::dashboard::DEFAULT_GROUP_CAP
}

fn default_viewport_width() -> u32 {
    1200
}

fn default_viewport_height() -> u32 {
    700
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            plot_dir: default_plot_dir(),
            default_group_cap: default_group_cap(),
            request_timeout_secs: default_request_timeout(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured level. Output goes to
    /// stderr so interactive stdout stays readable.
    pub fn init_tracing(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("csvboard={},tower_http=info", self.level))
        });

        let registry = tracing_subscriber::registry().with(filter);

        if self.format.eq_ignore_ascii_case("json") {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicit file, or fall back to default locations
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                let config = Self::load_with_env(path)?;
                tracing::info!("Loaded config from {:?}", path);
                Ok(config)
            }
            None => Ok(Self::load_default()),
        }
    }

    /// [`Config::resolve`] under a temporary stderr subscriber.
    ///
    /// The configured subscriber needs the loaded config, so the load
    /// itself is reported through this one.
    pub fn resolve_logged(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_logged_to(explicit, std::io::stderr)
    }

    fn resolve_logged_to<W>(explicit: Option<&Path>, writer: W) -> Result<Self, ConfigError>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("csvboard=info"));
        let bootstrap = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .finish();

        tracing::subscriber::with_default(bootstrap, || Self::resolve(explicit))
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("csvboard").join("config.toml")),
            Some(PathBuf::from("./csvboard.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Relay overrides
        if let Some(url) = var("BACKEND_URL").filter(|s| !s.trim().is_empty()) {
            self.relay.backend_url = Some(url);
        }
        if let Some(host) = var("CSVBOARD_RELAY_HOST") {
            self.relay.host = host;
        }
        if let Some(port) = var("CSVBOARD_RELAY_PORT").or_else(|| var("PORT")) {
            if let Ok(p) = port.parse() {
                self.relay.port = p;
            }
        }

        // Dashboard overrides
        if let Some(base) = var("CSVBOARD_API_BASE") {
            self.dashboard.api_base = base;
        }
        if let Some(dir) = var("CSVBOARD_PLOT_DIR") {
            self.dashboard.plot_dir = dir;
        }

        // Logging overrides
        if let Some(level) = var("CSVBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CSVBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# csvboard Configuration
#
# Environment variables override these settings:
# - BACKEND_URL (relay upstream, required by the relay)
# - CSVBOARD_RELAY_HOST, CSVBOARD_RELAY_PORT (or PORT)
# - CSVBOARD_API_BASE
# - CSVBOARD_PLOT_DIR
# - CSVBOARD_LOG_LEVEL
# - CSVBOARD_LOG_FORMAT

[relay]
# Relay server host
host = "0.0.0.0"

# Relay server port
port = 8888

# Upstream backend origin (requests are forwarded to <backend_url>/api/...)
# backend_url = "https://backend.example"

# Public path prefix rewritten to /api
public_prefix = "/.netlify/functions/api"

# Strip content-length in addition to host when copying headers
strip_content_length = true

# Upstream request timeout in seconds
request_timeout_secs = 30

[dashboard]
# Backend API base: the relay prefix, or <backend>/api for direct access
api_base = "http://localhost:8888/.netlify/functions/api"

# Where chart pages are written
plot_dir = "./plots"

# Initial group cap for boxplots (clamped to 1..=50)
default_group_cap = 12

# Backend request timeout in seconds
request_timeout_secs = 30

# Initial chart viewport
viewport_width = 1200
viewport_height = 700

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Log sink shared between the subscriber and the test
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve_reports_loaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csvboard.toml");
        std::fs::write(&path, "[dashboard]\nviewport_width = 900\n").unwrap();
        let logs = CapturedLogs::default();
        let sink = logs.clone();

        let config = Config::resolve_logged_to(Some(&path), move || sink.clone()).unwrap();

        assert_eq!(config.dashboard.viewport_width, 900);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Loaded config from"));
        assert!(output.contains("csvboard.toml"));
    }

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(Path::new("default.toml"), &generate_default_config()).unwrap();
        assert_eq!(config.relay.port, 8888);
        assert_eq!(config.relay.backend_url, None);
        assert_eq!(config.relay.public_prefix, "/.netlify/functions/api");
        assert_eq!(config.dashboard.default_group_cap, 12);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse(Path::new("empty.toml"), "").unwrap();
        assert_eq!(config.relay.host, "0.0.0.0");
        assert_eq!(
            config.relay.header_policy(),
            HeaderPolicy::StripHostAndContentLength
        );
        assert_eq!(config.dashboard.plot_dir, "./plots");
    }

    #[test]
    fn test_header_policy_from_section() {
        let config =
            Config::parse(Path::new("x.toml"), "[relay]\nstrip_content_length = false\n").unwrap();
        assert_eq!(config.relay.header_policy(), HeaderPolicy::StripHost);
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = Config::parse(Path::new("broken.toml"), "[relay\n").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BACKEND_URL", "https://host.example"),
            ("PORT", "9000"),
            ("CSVBOARD_API_BASE", "http://localhost:5000/api"),
            ("CSVBOARD_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.relay.backend_url.as_deref(), Some("https://host.example"));
        assert_eq!(config.relay.port, 9000);
        assert_eq!(config.dashboard.api_base, "http://localhost:5000/api");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_blank_backend_url_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "BACKEND_URL").then(|| "  ".to_string()));
        assert_eq!(config.relay.backend_url, None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/csvboard.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
