pub mod config;
pub mod ghost_connection;

pub use config::GhostConfig;
pub use ghost_connection::GhostConnection;
