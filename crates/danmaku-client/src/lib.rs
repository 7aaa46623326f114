//! danmaku-client library crate.
//!
//! Connects to a live room's event stream, keeps the session alive, and hands
//! decoded events to user callbacks.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! stream server (binary frames over WebSocket)
//!         ↕
//! [danmaku-client]
//!   ├── domain/           ClientConfig, ReconnectConfig (TOML)
//!   ├── application/      Handler registry, packet routing, panic isolation
//!   └── infrastructure/
//!         ├── discovery   Room metadata lookup over HTTPS (reqwest)
//!         └── session     LiveClient: connect, read loop, heartbeat, reconnect
//! ```
//!
//! # Layer rules
//!
//! - `domain` performs no I/O beyond reading its config file.
//! - `application` depends on `domain` and `danmaku-core` only; it is fed
//!   packets and never opens a socket.
//! - `infrastructure` depends on all other layers plus `tokio`,
//!   `tokio-tungstenite`, and `reqwest`.
//!
//! # For beginners: a minimal program
//!
//! ```no_run
//! use danmaku_client::LiveClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = LiveClient::new("5440")?;
//!     client.on_danmaku(|d| println!("{}: {}", d.uname, d.msg));
//!     client.on_gift(|g| println!("{} sent {} x{}", g.uname, g.gift_name, g.num));
//!     client.connect_and_start().await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     client.stop();
//!     client.stopped().await;
//!     Ok(())
//! }
//! ```

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: handler registry and packet routing.
pub mod application;

/// Infrastructure layer: metadata discovery and the live session.
pub mod infrastructure;

pub use application::Dispatch;
pub use domain::{ClientConfig, ConfigError, ReconnectConfig};
pub use infrastructure::{ClientError, LiveClient, SessionState};
