pub mod connection;
pub mod registry;
pub mod relay;
pub mod server;
