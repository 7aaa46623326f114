//! Room metadata discovery.
//!
//! Before dialing, a client without an explicit host asks the platform's HTTP
//! API which stream servers serve the room and which auth token to present in
//! the enter frame:
//!
//! ```text
//! GET {discovery_url}?id={room}&type=0
//!
//! {"code":0,"message":"0","data":{
//!     "token":"...",
//!     "host_list":[{"host":"a.chat.example","port":2243,"wss_port":443,"ws_port":2244}, ...]}}
//! ```
//!
//! The first host wins.  The lookup sits behind the [`RoomInfoSource`] trait so
//! tests can substitute a fixed answer.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::config::DEFAULT_DISCOVERY_URL;

/// Errors returned by a [`RoomInfoSource`].
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The HTTP request failed or returned an error status.
    #[error("metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("invalid metadata response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API answered with a non-zero code.
    #[error("metadata endpoint returned code {code}: {message}")]
    Api { code: i64, message: String },

    /// The API answered successfully but listed no hosts.
    #[error("metadata response lists no stream hosts")]
    NoHosts,
}

/// One stream server offered for the room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HostEntry {
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub wss_port: u16,
    #[serde(default)]
    pub ws_port: u16,
}

/// Result of a metadata lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomInfo {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub host_list: Vec<HostEntry>,
}

impl RoomInfo {
    /// Stream endpoint of the first listed host.
    pub fn endpoint(&self) -> Option<String> {
        self.host_list
            .first()
            .map(|entry| format!("wss://{}/sub", entry.host))
    }

    /// The auth token, or `None` when the API returned an empty one.
    pub fn token(&self) -> Option<&str> {
        Some(self.token.as_str()).filter(|t| !t.is_empty())
    }
}

#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RoomInfo>,
}

/// Parses a metadata API response body.
///
/// # Errors
///
/// Returns [`DiscoveryError::Decode`] for malformed JSON,
/// [`DiscoveryError::Api`] for a non-zero `code`, and
/// [`DiscoveryError::NoHosts`] when the host list is missing or empty.
pub fn parse_response(body: &[u8]) -> Result<RoomInfo, DiscoveryError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    if envelope.code != 0 {
        return Err(DiscoveryError::Api {
            code: envelope.code,
            message: envelope.message,
        });
    }
    let info = envelope.data.unwrap_or_default();
    if info.host_list.is_empty() {
        return Err(DiscoveryError::NoHosts);
    }
    Ok(info)
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Looks up the stream servers and token for a room.
///
/// Infrastructure implementation calls the HTTP API; tests use fixed answers.
#[async_trait]
pub trait RoomInfoSource: Send + Sync {
    async fn fetch(&self, room_id: &str) -> Result<RoomInfo, DiscoveryError>;
}

/// [`RoomInfoSource`] backed by the platform's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRoomInfoSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoomInfoSource {
    /// Creates a source querying `base_url` (without query string).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("danmaku-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for HttpRoomInfoSource {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_URL)
    }
}

#[async_trait]
impl RoomInfoSource for HttpRoomInfoSource {
    async fn fetch(&self, room_id: &str) -> Result<RoomInfo, DiscoveryError> {
        debug!("requesting room metadata for {room_id} from {}", self.base_url);
        let body = self
            .client
            .get(&self.base_url)
            .query(&[("id", room_id), ("type", "0")])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        parse_response(&body)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
