//! Runtime settings assembled from command-line flags and environment
//! variables by the CLI.

use clap::ValueEnum;

/// Database file used when neither `--database` nor `TALLY_DATABASE` is given.
pub const DEFAULT_DATABASE: &str = "tally.db";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Output format for log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging settings. `RUST_LOG`, when set, overrides `default_directive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub default_directive: String,
    pub format: LogFormat,
}

impl LogConfig {
    /// One-shot commands stay quiet unless asked; the server reports every operation.
    pub fn for_command(verbose: bool, long_running: bool, format: LogFormat) -> Self {
        let level = match (verbose, long_running) {
            (true, _) => "debug",
            (false, true) => "info",
            (false, false) => "warn",
        };
        Self {
            default_directive: level.to_string(),
            format,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
