//! Live-room session: connection lifecycle, read loop, and heartbeat loop.
//!
//! # Lifecycle
//!
//! ```text
//!  Idle ──connect()──► Dialing ──ok──► Connected ──start()──► Running
//!   ▲                    │                                       │
//!   └──────error─────────┘                   stop() / fatal write failure
//!                                                                ▼
//!                       any state ──────────stop()────────────► Stopped
//! ```
//!
//! `connect` resolves the endpoint (explicit host, or room metadata
//! discovery) and dials it.  `start` sends the enter frame and spawns two
//! loops that share one [`CancellationToken`]:
//!
//! - **Read loop** – receives one WebSocket message at a time, decodes it
//!   into packets, and hands each packet to the [`EventRouter`] in its own
//!   task.  A read failure, an undecodable message, or a Close from the peer
//!   triggers a reconnect: an immediate attempt, then capped exponential
//!   back-off with jitter, until it succeeds or the session is stopped.  The
//!   enter frame is re-sent on every new socket.
//! - **Heartbeat loop** – writes a heartbeat frame every
//!   `heartbeat_interval_secs`.  While a reconnect is in progress there is no
//!   socket to write to and the tick is skipped.  A failed write on a live
//!   socket is fatal: the session is cancelled.
//!
//! All outbound writes go through one `tokio::sync::Mutex` around the sink,
//! so enter and heartbeat frames never interleave.

use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use rand::Rng;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use danmaku_core::protocol::sequence::SequenceCounter;
use danmaku_core::{
    decode_packets, encode_enter, encode_heartbeat, Danmaku, EnterRequest, FrameError, Gift,
    GuardBuy, Live, Packet, SuperChat,
};

use crate::application::registry::HandlerRegistry;
use crate::application::router::{Dispatch, EventRouter};
use crate::domain::config::{ClientConfig, ConfigError, DEFAULT_HOST};
use crate::infrastructure::discovery::{
    DiscoveryError, HttpRoomInfoSource, RoomInfoSource,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSource = SplitStream<WsStream>;

/// Outbound half of the socket.  Boxed so the write path does not depend on
/// the concrete transport.
type WsSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

// ── Errors and state ──────────────────────────────────────────────────────────

/// Errors returned by [`LiveClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The room id is not a positive integer.
    #[error("invalid room id {0:?}: expected a positive integer")]
    InvalidRoomId(String),

    /// Room metadata could not be resolved.
    #[error("room metadata discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// The WebSocket connection could not be opened.
    #[error("failed to connect to {url}: {source}")]
    Dial {
        url: String,
        #[source]
        source: Box<WsError>,
    },

    /// Writing a frame to the socket failed.
    #[error("failed to write {frame} frame: {source}")]
    Write {
        frame: &'static str,
        #[source]
        source: Box<WsError>,
    },

    /// An outbound frame could not be encoded.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] FrameError),

    /// The operation is not allowed in the current state.
    #[error("cannot {operation} while the session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Dialing,
    Connected,
    Running,
    /// Terminal.
    Stopped,
}

/// Validates a room id: a positive decimal integer.
///
/// # Errors
///
/// Returns [`ClientError::InvalidRoomId`] for anything else.
pub fn parse_room_id(room_id: &str) -> Result<u64, ClientError> {
    room_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ClientError::InvalidRoomId(room_id.to_string()))
}

// ── Shared session state ──────────────────────────────────────────────────────

/// State shared by the client handle and both session loops.
struct Inner {
    room_id: u64,
    config: ClientConfig,
    host: Mutex<Option<String>>,
    token: Mutex<Option<String>>,
    room_info: Mutex<Arc<dyn RoomInfoSource>>,
    state: Mutex<SessionState>,
    writer: tokio::sync::Mutex<Option<WsSink>>,
    reader: tokio::sync::Mutex<Option<WsSource>>,
    sequence: SequenceCounter,
    popularity: AtomicU32,
    cancel: CancellationToken,
    /// Held across the awaits in `stopped`, so every caller waits for the loops.
    tasks: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

/// Result of a write attempt on the shared sink.
enum WriteOutcome {
    Sent,
    /// No socket is installed (reconnect in progress).
    NoSocket,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Atomically moves `from → to`; fails with the current state otherwise.
    fn transition(
        &self,
        from: SessionState,
        to: SessionState,
        operation: &'static str,
    ) -> Result<(), ClientError> {
        let mut state = lock(&self.state);
        if *state != from {
            return Err(ClientError::InvalidState {
                operation,
                state: *state,
            });
        }
        *state = to;
        Ok(())
    }

    /// Marks the session stopped and cancels both loops.  Returns `false` if
    /// it was already stopped.
    fn shutdown(&self) -> bool {
        {
            let mut state = lock(&self.state);
            if *state == SessionState::Stopped {
                return false;
            }
            *state = SessionState::Stopped;
        }
        self.cancel.cancel();
        true
    }

    /// Explicit host, or the endpoint found by discovery (cached for reconnects).
    async fn resolve_endpoint(&self) -> Result<String, ClientError> {
        if let Some(host) = lock(&self.host).clone() {
            return Ok(host);
        }
        let source = Arc::clone(&*lock(&self.room_info));
        let info = source.fetch(&self.room_id.to_string()).await?;
        let url = info.endpoint().ok_or(DiscoveryError::NoHosts)?;
        info!("room {} resolved to {url}", self.room_id);
        *lock(&self.token) = info.token().map(str::to_owned);
        *lock(&self.host) = Some(url.clone());
        Ok(url)
    }

    async fn dial(&self) -> Result<(WsSink, WsSource), ClientError> {
        let url = self.resolve_endpoint().await?;
        debug!("dialing {url}");
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|source| ClientError::Dial {
                url,
                source: Box::new(source),
            })?;
        let (sink, source) = stream.split();
        Ok((Box::pin(sink), source))
    }

    fn enter_frame(&self) -> Result<Vec<u8>, ClientError> {
        let request = EnterRequest {
            uid: self.config.uid,
            protocol_version: self.config.protocol_version,
            platform: self.config.platform.clone(),
            token: lock(&self.token).clone(),
            ..EnterRequest::new(self.room_id)
        };
        Ok(encode_enter(&request, self.sequence.next())?)
    }

    /// Writes one binary frame through the shared sink.
    async fn write(&self, frame: &'static str, bytes: Vec<u8>) -> Result<WriteOutcome, ClientError> {
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Ok(WriteOutcome::NoSocket);
        };
        sink.send(Message::Binary(bytes))
            .await
            .map_err(|source| ClientError::Write {
                frame,
                source: Box::new(source),
            })?;
        Ok(WriteOutcome::Sent)
    }

    /// Closes the socket if one is still installed.  The read loop normally
    /// does this on exit; this covers sockets that never reached it.
    async fn release_socket(&self) {
        self.reader.lock().await.take();
        if let Some(mut sink) = self.writer.lock().await.take() {
            let _ = sink.close().await;
        }
    }

    /// Records the room popularity carried by heartbeat replies.
    fn observe(&self, packet: &Packet) {
        if let Some(value) = packet.popularity() {
            self.popularity.store(value, Ordering::Relaxed);
            debug!("heartbeat reply: popularity={value}");
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Client for one live room's event stream.
///
/// # Example
///
/// ```no_run
/// use danmaku_client::LiveClient;
///
/// # async fn example() -> Result<(), danmaku_client::ClientError> {
/// let client = LiveClient::new("5440")?;
/// client.on_danmaku(|d| println!("{}: {}", d.uname, d.msg));
/// client.connect_and_start().await?;
/// tokio::signal::ctrl_c().await.ok();
/// client.stop();
/// client.stopped().await;
/// # Ok(())
/// # }
/// ```
pub struct LiveClient {
    inner: Arc<Inner>,
    router: Arc<EventRouter>,
}

impl LiveClient {
    /// Creates a client for `room_id` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRoomId`] if `room_id` is not a positive
    /// integer.  No network activity happens here.
    pub fn new(room_id: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::new(room_id))
    }

    /// Creates a client from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRoomId`] if `config.room_id` is invalid.
    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        let room_id = parse_room_id(&config.room_id)?;
        let room_info: Arc<dyn RoomInfoSource> =
            Arc::new(HttpRoomInfoSource::new(config.discovery_url.clone()));
        let registry = Arc::new(HandlerRegistry::new());
        let inner = Inner {
            room_id,
            host: Mutex::new(config.host.clone()),
            config,
            token: Mutex::new(None),
            room_info: Mutex::new(room_info),
            state: Mutex::new(SessionState::Idle),
            writer: tokio::sync::Mutex::new(None),
            reader: tokio::sync::Mutex::new(None),
            sequence: SequenceCounter::new(),
            popularity: AtomicU32::new(0),
            cancel: CancellationToken::new(),
            tasks: tokio::sync::Mutex::new(Vec::new()),
        };
        Ok(Self {
            inner: Arc::new(inner),
            router: Arc::new(EventRouter::new(registry)),
        })
    }

    /// Replaces the room metadata source used by `connect`.
    pub fn with_room_info_source(self, source: Arc<dyn RoomInfoSource>) -> Self {
        *lock(&self.inner.room_info) = source;
        self
    }

    /// Uses `url` as the stream endpoint; discovery is skipped.
    pub fn set_host(&self, url: impl Into<String>) {
        *lock(&self.inner.host) = Some(url.into());
    }

    /// Uses the public default endpoint; discovery is skipped.
    pub fn use_default_host(&self) {
        self.set_host(DEFAULT_HOST);
    }

    pub fn room_id(&self) -> u64 {
        self.inner.room_id
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    /// Last room popularity reported by a heartbeat reply; 0 before the first.
    pub fn popularity(&self) -> u32 {
        self.inner.popularity.load(Ordering::Relaxed)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Resolves the endpoint and opens the WebSocket (`Idle → Connected`).
    ///
    /// Failures are returned, not retried; the client goes back to `Idle` so
    /// the caller may try again.
    ///
    /// # Errors
    ///
    /// [`ClientError::Discovery`] or [`ClientError::Dial`] on failure, and
    /// [`ClientError::InvalidState`] unless the client is `Idle`.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.inner
            .transition(SessionState::Idle, SessionState::Dialing, "connect")?;

        let (sink, source) = match self.inner.dial().await {
            Ok(halves) => halves,
            Err(e) => {
                // A concurrent stop() wins; otherwise allow another attempt.
                let _ = self
                    .inner
                    .transition(SessionState::Dialing, SessionState::Idle, "connect");
                return Err(e);
            }
        };

        *self.inner.writer.lock().await = Some(sink);
        *self.inner.reader.lock().await = Some(source);
        if let Err(e) = self
            .inner
            .transition(SessionState::Dialing, SessionState::Connected, "connect")
        {
            // stop() landed while dialing: the socket must not outlive it.
            self.inner.release_socket().await;
            return Err(e);
        }
        info!("connected to room {}", self.inner.room_id);
        Ok(())
    }

    /// Sends the enter frame and spawns the read and heartbeat loops
    /// (`Connected → Running`).
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidState`] unless the client is `Connected`.  A
    /// failure to write the enter frame is fatal: the session is stopped and
    /// the error returned.
    pub async fn start(&self) -> Result<(), ClientError> {
        self.inner
            .transition(SessionState::Connected, SessionState::Running, "start")?;

        let source = self.inner.reader.lock().await.take();
        let Some(source) = source else {
            self.inner.shutdown();
            return Err(ClientError::InvalidState {
                operation: "start",
                state: SessionState::Stopped,
            });
        };

        if let Err(e) = self.send_enter().await {
            error!("enter frame failed; stopping session: {e}");
            self.inner.shutdown();
            return Err(e);
        }

        let read_loop = tokio::spawn(read_loop(
            Arc::clone(&self.inner),
            Arc::clone(&self.router),
            source,
        ));
        let heartbeat_loop = tokio::spawn(heartbeat_loop(Arc::clone(&self.inner)));
        self.inner.tasks.lock().await.extend([read_loop, heartbeat_loop]);

        info!("session for room {} running", self.inner.room_id);
        Ok(())
    }

    /// `connect` followed by `start`.
    ///
    /// # Errors
    ///
    /// Any error of either step.
    pub async fn connect_and_start(&self) -> Result<(), ClientError> {
        self.connect().await?;
        self.start().await
    }

    /// Signals both loops to exit.
    ///
    /// Returns `true` the first time; later calls do nothing and return
    /// `false`.  Does not wait; use [`LiveClient::stopped`] for that.
    pub fn stop(&self) -> bool {
        let first = self.inner.shutdown();
        if first {
            info!("stopping session for room {}", self.inner.room_id);
        }
        first
    }

    /// Resolves once the session is stopped and both loops have exited.
    ///
    /// Any number of callers may wait at once.  A socket that was connected
    /// but never started is closed here.
    pub async fn stopped(&self) {
        self.inner.cancel.cancelled().await;
        let mut tasks = self.inner.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        drop(tasks);
        self.inner.release_socket().await;
    }

    async fn send_enter(&self) -> Result<(), ClientError> {
        let frame = self.inner.enter_frame()?;
        match self.inner.write("enter", frame).await? {
            WriteOutcome::Sent => {
                debug!("sent enter frame for room {}", self.inner.room_id);
                Ok(())
            }
            WriteOutcome::NoSocket => Err(ClientError::InvalidState {
                operation: "start",
                state: self.inner.state(),
            }),
        }
    }

    // ── Handler registration ──────────────────────────────────────────────────

    pub fn on_danmaku(&self, f: impl Fn(&Danmaku) + Send + Sync + 'static) {
        self.router.registry().on_danmaku(f);
    }

    pub fn on_super_chat(&self, f: impl Fn(&SuperChat) + Send + Sync + 'static) {
        self.router.registry().on_super_chat(f);
    }

    pub fn on_gift(&self, f: impl Fn(&Gift) + Send + Sync + 'static) {
        self.router.registry().on_gift(f);
    }

    pub fn on_guard_buy(&self, f: impl Fn(&GuardBuy) + Send + Sync + 'static) {
        self.router.registry().on_guard_buy(f);
    }

    pub fn on_live(&self, f: impl Fn(&Live) + Send + Sync + 'static) {
        self.router.registry().on_live(f);
    }

    /// Routes the exact command `cmd` to `f` with the raw JSON body, bypassing
    /// typed decoding.  Replaces any earlier override for `cmd`.
    pub fn register_custom_event_handler(
        &self,
        cmd: impl Into<String>,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) {
        self.router.registry().register_custom(cmd, f);
    }

    /// Routes one packet as if it had arrived on the socket.
    pub fn handle(&self, packet: Packet) -> Dispatch {
        self.inner.observe(&packet);
        self.router.handle(packet)
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

// ── Session loops ─────────────────────────────────────────────────────────────

async fn read_loop(inner: Arc<Inner>, router: Arc<EventRouter>, mut source: WsSource) {
    loop {
        let next = tokio::select! {
            _ = inner.cancel.cancelled() => break,
            next = source.next() => next,
        };

        let failure = match next {
            Some(Ok(Message::Binary(data))) => match decode_packets(&data) {
                Ok(packets) => {
                    for packet in packets {
                        inner.observe(&packet);
                        let router = Arc::clone(&router);
                        tokio::spawn(async move {
                            router.handle(packet);
                        });
                    }
                    continue;
                }
                Err(e) => format!("undecodable message: {e}"),
            },
            Some(Ok(Message::Close(frame))) => format!("peer closed the connection: {frame:?}"),
            // Pongs are queued by tungstenite and flushed with the next write.
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(other)) => {
                warn!("ignoring non-binary message: {other:?}");
                continue;
            }
            Some(Err(e)) => format!("read error: {e}"),
            None => "stream ended".to_string(),
        };

        warn!("room {}: {failure}; reconnecting", inner.room_id);
        match reconnect(&inner).await {
            Some(new_source) => source = new_source,
            None => break,
        }
    }

    if let Some(mut sink) = inner.writer.lock().await.take() {
        let _ = sink.close().await;
    }
    debug!("room {}: read loop exited", inner.room_id);
}

/// Replaces the socket after a read failure.
///
/// Returns the new read half, or `None` once the session is cancelled.
async fn reconnect(inner: &Arc<Inner>) -> Option<WsSource> {
    // Heartbeats skip their tick until a new sink is installed.
    if let Some(mut old) = inner.writer.lock().await.take() {
        let _ = old.close().await;
    }

    let policy = inner.config.reconnect.normalized();
    let mut attempt: u32 = 0;
    loop {
        let dialed = tokio::select! {
            _ = inner.cancel.cancelled() => return None,
            dialed = inner.dial() => dialed,
        };

        match dialed {
            Ok((mut sink, source)) => {
                // The subscription is per socket: enter again before anything
                // else can be written.
                let sent = match inner.enter_frame() {
                    Ok(frame) => sink.send(Message::Binary(frame)).await.map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                if let Err(e) = sent {
                    error!("room {}: enter frame failed after reconnect; stopping session: {e}", inner.room_id);
                    inner.shutdown();
                    return None;
                }
                *inner.writer.lock().await = Some(sink);
                info!("room {}: reconnected after {} failed attempt(s)", inner.room_id, attempt);
                return Some(source);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt) + jitter(policy.jitter_ms);
                warn!("room {}: reconnect attempt {} failed: {e}; retrying in {delay:?}", inner.room_id, attempt + 1);
                attempt = attempt.saturating_add(1);
                tokio::select! {
                    _ = inner.cancel.cancelled() => return None,
                    _ = sleep(delay) => {}
                }
            }
        }
    }
}

fn jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

async fn heartbeat_loop(inner: Arc<Inner>) {
    let mut ticker = interval(inner.config.heartbeat_interval());
    // A stalled write must not be followed by a burst of catch-up beats.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick resolves immediately; the first heartbeat is due one
    // interval after the enter frame.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let frame = encode_heartbeat(inner.sequence.next());
        match inner.write("heartbeat", frame).await {
            Ok(WriteOutcome::Sent) => debug!("room {}: sent heartbeat", inner.room_id),
            Ok(WriteOutcome::NoSocket) => {
                debug!("room {}: reconnecting, heartbeat skipped", inner.room_id);
            }
            Err(e) => {
                error!("room {}: {e}; stopping session", inner.room_id);
                inner.shutdown();
                break;
            }
        }
    }
    debug!("room {}: heartbeat loop exited", inner.room_id);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
