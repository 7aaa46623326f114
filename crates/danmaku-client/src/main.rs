//! danmaku-client: live-room event stream client, entry point.
//!
//! Joins one live room and logs every chat message, paid message, gift, guard
//! purchase, and stream-start event until Ctrl+C is pressed.
//!
//! # Usage
//!
//! ```text
//! danmaku-client [OPTIONS]
//!
//! Options:
//!   --room <ID>             Room to join (required unless set in the config file)
//!   --host <URL>            Stream endpoint; skips metadata discovery
//!   --default-host          Use the public default endpoint; skips discovery
//!   --config <PATH>         TOML configuration file
//!   --uid <UID>             Viewer uid sent in the enter frame
//!   --heartbeat-secs <SECS> Seconds between heartbeat frames
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable            | Description                 |
//! |---------------------|-----------------------------|
//! | `DANMAKU_ROOM`      | Room to join                |
//! | `DANMAKU_HOST`      | Stream endpoint             |
//! | `DANMAKU_CONFIG`    | Path to the TOML config     |
//! | `RUST_LOG`          | Log filter (overrides `log_level` in the config) |
//!
//! CLI arguments take precedence over the config file, which takes precedence
//! over built-in defaults.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use danmaku_client::domain::{ClientConfig, DEFAULT_HOST};
use danmaku_client::LiveClient;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Live-room danmaku stream client.
#[derive(Debug, Parser)]
#[command(
    name = "danmaku-client",
    about = "Joins a live room and logs its chat, gift, and status events",
    version
)]
struct Cli {
    /// Room id to join.
    #[arg(long, env = "DANMAKU_ROOM")]
    room: Option<String>,

    /// Stream endpoint, e.g. `wss://host/sub`.  Skips metadata discovery.
    #[arg(long, env = "DANMAKU_HOST", conflicts_with = "default_host")]
    host: Option<String>,

    /// Use the public default endpoint instead of metadata discovery.
    #[arg(long)]
    default_host: bool,

    /// TOML configuration file.
    #[arg(long, env = "DANMAKU_CONFIG")]
    config: Option<PathBuf>,

    /// Viewer uid sent in the enter frame.
    #[arg(long)]
    uid: Option<u64>,

    /// Seconds between heartbeat frames.
    #[arg(long)]
    heartbeat_secs: Option<u64>,
}

impl Cli {
    /// Builds the session configuration: file (if any), then CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or no room id is
    /// given anywhere.
    fn into_client_config(self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(room) = self.room {
            config.room_id = room;
        }
        if let Some(host) = self.host {
            config.host = Some(host);
        } else if self.default_host {
            config.host = Some(DEFAULT_HOST.to_string());
        }
        if let Some(uid) = self.uid {
            config.uid = uid;
        }
        if let Some(secs) = self.heartbeat_secs {
            config.heartbeat_interval_secs = secs;
        }

        if config.room_id.is_empty() {
            bail!("no room id given: pass --room or set room_id in the config file");
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_client_config()?;

    // `RUST_LOG` wins; otherwise the configured level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let client = LiveClient::with_config(config).context("invalid client configuration")?;
    register_logging_handlers(&client);

    info!("joining room {}", client.room_id());
    client
        .connect_and_start()
        .await
        .with_context(|| format!("failed to join room {}", client.room_id()))?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        },
        _ = client.stopped() => warn!("session ended on its own"),
    }

    client.stop();
    client.stopped().await;
    info!("danmaku-client stopped");
    Ok(())
}

fn register_logging_handlers(client: &LiveClient) {
    client.on_danmaku(|d| info!("[danmaku] {}: {}", d.uname, d.msg));
    client.on_super_chat(|sc| info!("[super chat] {} ({}): {}", sc.uname, sc.price, sc.message));
    client.on_gift(|g| info!("[gift] {} {} {} x{}", g.uname, g.action, g.gift_name, g.num));
    client.on_guard_buy(|g| info!("[guard] {} bought {} x{}", g.username, g.gift_name, g.num));
    client.on_live(|l| info!("[live] room {} went live at {}", l.room_id, l.live_time));
}

// ── Tests ─────────────────────────────────────────────────────────────────────
