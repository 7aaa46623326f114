//! Domain layer for danmaku-client.
//!
//! Plain configuration types with no I/O beyond reading a TOML file.

pub mod config;

pub use config::{ClientConfig, ConfigError, ReconnectConfig, DEFAULT_DISCOVERY_URL, DEFAULT_HOST};
