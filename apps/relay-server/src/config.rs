use std::path::PathBuf;

use crate::gateway::relay::DEFAULT_OUTBOUND_BUFFER;

/// Relay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the listener binds to (e.g. `0.0.0.0` or `localhost`).
    pub host: String,
    /// Port serving both the client assets and the WebSocket endpoint.
    pub port: u16,
    /// Directory holding `index.html` and `index.js`.
    pub client_dir: PathBuf,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; missing or unparseable values use defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: var("WS_HOST")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.host),
            port: var("WS_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            client_dir: var("CLIENT_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.client_dir),
            outbound_buffer: var("OUTBOUND_BUFFER")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.outbound_buffer),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            client_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}
