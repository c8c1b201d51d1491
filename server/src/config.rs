//! Configuration management for the server.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default endpoint serving the remote quote batch.
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// File holding the persisted quote collection
    pub quotes_path: PathBuf,
    /// Remote batch endpoint
    pub remote_endpoint: String,
    /// Quotes requested per sync
    pub remote_limit: usize,
    /// HTTP timeout for remote requests
    pub remote_timeout: Duration,
    /// Time between automatic syncs
    pub sync_interval: Duration,
    /// Whether automatic sync starts enabled
    pub auto_sync: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let quotes_path = lookup("QUOTES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("quotes.json"));

        let remote_endpoint =
            lookup("REMOTE_ENDPOINT").unwrap_or_else(|| DEFAULT_REMOTE_ENDPOINT.to_string());

        let remote_limit = parse_number(&lookup, "REMOTE_LIMIT", 10)?;
        let remote_timeout = Duration::from_secs(parse_number(&lookup, "REMOTE_TIMEOUT_SECS", 10)?);

        let interval_secs = parse_number(&lookup, "SYNC_INTERVAL_SECS", 30)?;
        if interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let auto_sync = match lookup("AUTO_SYNC") {
            None => true,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "AUTO_SYNC",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            host,
            port,
            quotes_path,
            remote_endpoint,
            remote_limit,
            remote_timeout,
            sync_interval: Duration::from_secs(interval_secs),
            auto_sync,
        })
    }
}

fn parse_number<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid {name} value: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("SYNC_INTERVAL_SECS must be greater than zero")]
    ZeroInterval,
}
