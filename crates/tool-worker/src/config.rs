//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_ADDR: &str = "127.0.0.1:8002";

/// Tool worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Shared secret callers must send as a bearer token. Auth is off when unset.
    pub secret: Option<String>,
    /// Per-call timeout.
    pub tool_timeout: Option<Duration>,
    /// Fully-qualified names (`Toolkit.Tool`) that may not be listed or invoked.
    pub disabled_tools: Vec<String>,
    /// Toolkits to serve. All bundled toolkits when unset.
    pub toolkits: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `WORKER_ADDR` | Server bind address | `127.0.0.1:8002` |
    /// | `WORKER_SECRET` | Bearer token required on tool routes | (none, auth off) |
    /// | `WORKER_TOOL_TIMEOUT_SECS` | Per-call timeout in seconds, `0` disables | `30` |
    /// | `WORKER_DISABLED_TOOLS` | Comma-separated `Toolkit.Tool` names | (none) |
    /// | `WORKER_TOOLKITS` | Comma-separated toolkit names to serve | (all) |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("WORKER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let secret = lookup("WORKER_SECRET").filter(|s| !s.trim().is_empty());

        let tool_timeout = match lookup("WORKER_TOOL_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(Duration::from_secs(30)),
        };

        let disabled_tools = lookup("WORKER_DISABLED_TOOLS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let toolkits = lookup("WORKER_TOOLKITS")
            .map(|raw| split_list(&raw))
            .filter(|names| !names.is_empty());

        Ok(Self {
            addr,
            secret,
            tool_timeout,
            disabled_tools,
            toolkits,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid WORKER_ADDR format")]
    InvalidAddr,

    #[error("Invalid WORKER_TOOL_TIMEOUT_SECS value: {0}")]
    InvalidTimeout(String),

    #[error("Unknown toolkit in WORKER_TOOLKITS: {0}")]
    UnknownToolkit(String),
}
