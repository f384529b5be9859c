pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;

use std::sync::Arc;

use config::Config;
use gateway::relay::Relay;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            relay: Arc::new(Relay::new(config.outbound_buffer)),
            config: Arc::new(config),
        }
    }
}
