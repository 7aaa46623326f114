//! Client configuration types.
//!
//! [`ClientConfig`] holds every runtime setting of a session.  It can be built
//! in code (`ClientConfig::new("5440")`), loaded from a TOML file, or filled in
//! from command-line arguments by the binary.
//!
//! Example file:
//!
//! ```toml
//! room_id = "5440"
//! uid = 0
//! heartbeat_interval_secs = 30
//! log_level = "info"
//!
//! [reconnect]
//! initial_delay_ms = 250
//! max_delay_ms = 30000
//! jitter_ms = 250
//! ```
//!
//! Every field has a serde default, so a file only needs the values it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public event-stream endpoint used when discovery is skipped.
pub const DEFAULT_HOST: &str = "wss://broadcastlv.chat.bilibili.com/sub";

/// Room metadata endpoint; the room id is appended as `?id={room}&type=0`.
pub const DEFAULT_DISCOVERY_URL: &str =
    "https://api.live.bilibili.com/xlive/web-room/v1/index/getDanmuInfo";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// All runtime configuration for one live-room session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Room to join.  Must parse as a positive integer; checked when the
    /// client is constructed.
    #[serde(default)]
    pub room_id: String,
    /// Explicit endpoint.  When set, metadata discovery is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Viewer uid sent in the enter frame; 0 joins anonymously.
    #[serde(default)]
    pub uid: u64,
    /// Compression the server is asked to use (3 = brotli, 2 = zlib).
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u16,
    /// Platform tag sent in the enter frame.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Seconds between heartbeat frames.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Base URL of the room metadata endpoint.
    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,
    /// `tracing` filter used by the binary when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Reconnect policy after read failures.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Exponential back-off for reconnect attempts.
///
/// The delay starts at `initial_delay_ms`, doubles per failed attempt, is
/// capped at `max_delay_ms`, and gets up to `jitter_ms` of random extra delay
/// added by the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_protocol_version() -> u16 {
    3
}
fn default_platform() -> String {
    "web".to_string()
}
fn default_heartbeat_interval_secs() -> u64 {
    30
}
fn default_discovery_url() -> String {
    DEFAULT_DISCOVERY_URL.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_initial_delay_ms() -> u64 {
    250
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_jitter_ms() -> u64 {
    250
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            room_id: String::new(),
            host: None,
            uid: 0,
            protocol_version: default_protocol_version(),
            platform: default_platform(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            discovery_url: default_discovery_url(),
            log_level: default_log_level(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

// ── Construction and loading ──────────────────────────────────────────────────

impl ClientConfig {
    /// Default configuration for `room_id`.
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or a field has
    /// the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Heartbeat period, never shorter than one second.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}

impl ReconnectConfig {
    /// Clamps delays to sane bounds and ensures `initial <= max`.
    ///
    /// Inverted bounds are swapped rather than rejected; jitter never exceeds
    /// the cap.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.initial_delay_ms = self.initial_delay_ms.max(1);
        self.max_delay_ms = self.max_delay_ms.max(1);
        if self.initial_delay_ms > self.max_delay_ms {
            std::mem::swap(&mut self.initial_delay_ms, &mut self.max_delay_ms);
        }
        self.jitter_ms = self.jitter_ms.min(self.max_delay_ms);
        self
    }

    /// Capped exponential delay before reconnect attempt `attempt` (0-based),
    /// without jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.protocol_version, 3);
        assert_eq!(cfg.platform, "web");
        assert_eq!(cfg.heartbeat_interval_secs, 30);
        assert_eq!(cfg.discovery_url, DEFAULT_DISCOVERY_URL);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.host.is_none());
        assert_eq!(cfg.reconnect, ReconnectConfig::default());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg = ClientConfig::from_toml_str("").expect("empty TOML is valid");
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_given_fields() {
        // Arrange
        let text = r#"
            room_id = "5440"
            host = "wss://example.test/sub"

            [reconnect]
            max_delay_ms = 1000
        "#;

        // Act
        let cfg = ClientConfig::from_toml_str(text).expect("parse");

        // Assert
        assert_eq!(cfg.room_id, "5440");
        assert_eq!(cfg.host.as_deref(), Some("wss://example.test/sub"));
        assert_eq!(cfg.heartbeat_interval_secs, 30);
        assert_eq!(cfg.reconnect.max_delay_ms, 1000);
        assert_eq!(cfg.reconnect.initial_delay_ms, 250);
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = ClientConfig::from_toml_str("heartbeat_interval_secs = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("danmaku-client-missing-config.toml");
        let _ = std::fs::remove_file(&path);

        let result = ClientConfig::load(&path);

        match result {
            Err(ConfigError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "danmaku-client-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "room_id = \"21\"\nuid = 7\n").expect("write temp config");

        let cfg = ClientConfig::load(&path).expect("load");
        let _ = std::fs::remove_file(&path);

        assert_eq!(cfg.room_id, "21");
        assert_eq!(cfg.uid, 7);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut cfg = ClientConfig::new("99");
        cfg.host = Some("wss://h/sub".to_string());
        cfg.reconnect.jitter_ms = 0;

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored = ClientConfig::from_toml_str(&text).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_heartbeat_interval_has_one_second_floor() {
        let mut cfg = ClientConfig::default();
        cfg.heartbeat_interval_secs = 0;
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(1));
    }

    // ── Reconnect policy ──────────────────────────────────────────────────────

    #[test]
    fn test_normalized_swaps_inverted_bounds() {
        let cfg = ReconnectConfig {
            initial_delay_ms: 5000,
            max_delay_ms: 100,
            jitter_ms: 10_000,
        }
        .normalized();

        assert_eq!(cfg.initial_delay_ms, 100);
        assert_eq!(cfg.max_delay_ms, 5000);
        assert_eq!(cfg.jitter_ms, 5000, "jitter is capped at the max delay");
    }

    #[test]
    fn test_normalized_raises_zero_delays() {
        let cfg = ReconnectConfig {
            initial_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
        .normalized();
        assert_eq!(cfg.initial_delay_ms, 1);
        assert_eq!(cfg.max_delay_ms, 1);
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        let cfg = ReconnectConfig {
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            jitter_ms: 0,
        };

        let delays: Vec<u64> = (0..6).map(|a| cfg.delay_for(a).as_millis() as u64).collect();

        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
    }

    #[test]
    fn test_delay_for_huge_attempt_does_not_overflow() {
        let cfg = ReconnectConfig::default();
        assert_eq!(cfg.delay_for(u32::MAX), Duration::from_millis(30_000));
        assert_eq!(cfg.delay_for(64), Duration::from_millis(30_000));
    }
}
