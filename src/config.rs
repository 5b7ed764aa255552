//! Server configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`), falling back to defaults when unset.

use std::net::SocketAddr;
use std::str::FromStr;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Path the WebSocket endpoint is mounted at.
    pub ws_path: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// | Variable      | Default        |
    /// |---------------|----------------|
    /// | `LISTEN_ADDR` | `0.0.0.0:3000` |
    /// | `WS_PATH`     | `/ws`          |
    /// | `LOG_FORMAT`  | `pretty`       |
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed as a
    /// [`SocketAddr`], `WS_PATH` does not start with `/`, or `LOG_FORMAT`
    /// is set to an unknown format.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let ws_path = std::env::var("WS_PATH").unwrap_or_else(|_| "/ws".to_string());
        validate_ws_path(&ws_path)?;

        let log_format = parse_log_format(std::env::var("LOG_FORMAT").ok().as_deref())?;

        Ok(Self {
            listen_addr,
            ws_path,
            log_format,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ws_path: "/ws".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

fn validate_ws_path(path: &str) -> Result<(), String> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(format!("WS_PATH must start with '/': {path}"))
    }
}

/// Unset means the default format; anything else must parse.
fn parse_log_format(value: Option<&str>) -> Result<LogFormat, String> {
    value.map_or(Ok(LogFormat::default()), str::parse)
}
