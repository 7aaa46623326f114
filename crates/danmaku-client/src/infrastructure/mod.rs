//! Infrastructure layer for danmaku-client.
//!
//! Everything that touches the network lives here.
//!
//! # Responsibilities
//!
//! - Asking the HTTP metadata API which stream host serves a room
//! - Dialing the WebSocket and sending the enter frame
//! - Running the read loop (with reconnects) and the heartbeat loop
//! - Stopping both loops on request
//!
//! # What does NOT belong here?
//!
//! - Frame layout and JSON decoding (that is `danmaku-core`)
//! - Choosing which handler sees a packet (that is the application layer)

pub mod discovery;
pub mod session;

pub use discovery::{DiscoveryError, HostEntry, HttpRoomInfoSource, RoomInfo, RoomInfoSource};
pub use session::{parse_room_id, ClientError, LiveClient, SessionState};
