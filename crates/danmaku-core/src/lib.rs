//! # danmaku-core
//!
//! Shared library for the live-room event stream client containing the binary
//! frame codec and the decoders that turn notification JSON into typed events.
//!
//! This crate has no dependencies on sockets, async runtimes, or HTTP.  It only
//! turns bytes into values and values into bytes, which keeps it easy to test.
//!
//! # Architecture overview (for beginners)
//!
//! A live room pushes its chat ("danmaku"), paid messages, gifts, and status
//! changes over a WebSocket.  Every WebSocket message carries one or more
//! *frames*, and a frame may itself contain a compressed stream of further
//! frames.  This crate defines:
//!
//! - **`protocol`** – How bytes travel over the socket.  Frames have a 16-byte
//!   big-endian header followed by a body; compressed bodies (zlib or brotli)
//!   are unpacked recursively until only plain frames remain.
//!
//! - **`message`** – What the notification bodies mean.  The upstream JSON uses
//!   arrays-of-arrays instead of named fields for most values, so the decoders
//!   read values by positional path and fall back to zero values whenever the
//!   shape does not match.

pub mod message;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `danmaku_core::Packet` instead of `danmaku_core::protocol::packet::Packet`.
pub use message::{
    decode, CommonNoticeDanmaku, Danmaku, DanmakuKind, Event, EventKind, Gift, GuardBuy,
    JsonView, Live, SuperChat,
};
pub use protocol::codec::{decode_packets, encode_enter, encode_frame, encode_heartbeat, FrameError};
pub use protocol::packet::{EnterRequest, Operation, Packet, ProtocolVersion};
