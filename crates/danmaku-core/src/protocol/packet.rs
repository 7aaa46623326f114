//! Frame types for the live-room stream protocol.
//!
//! Every frame starts with a fixed 16-byte header.  All integers are big-endian:
//!
//! ```text
//! [packet_length:4][header_length:2][protocol_version:2][operation:4][sequence:4][body:N]
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Header length written into every outbound frame.
pub const HEADER_LENGTH: u16 = HEADER_SIZE as u16;

// ── Operation codes ───────────────────────────────────────────────────────────

/// Operation code carried in bytes 8..12 of the header.
///
/// Codes the protocol does not define are kept in [`Operation::Other`] so the
/// router can log them instead of the decoder rejecting the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Client keep-alive (2).
    Heartbeat,
    /// Server reply to a heartbeat; carries the room popularity (3).
    HeartbeatReply,
    /// Room notification with a JSON body keyed by `cmd` (5).
    Notification,
    /// Client enter/handshake request (7).
    Enter,
    /// Server acknowledgement of the enter request (8).
    EnterReply,
    /// Any other code.
    Other(u32),
}

impl From<u32> for Operation {
    fn from(value: u32) -> Self {
        match value {
            2 => Operation::Heartbeat,
            3 => Operation::HeartbeatReply,
            5 => Operation::Notification,
            7 => Operation::Enter,
            8 => Operation::EnterReply,
            other => Operation::Other(other),
        }
    }
}

impl From<Operation> for u32 {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Heartbeat => 2,
            Operation::HeartbeatReply => 3,
            Operation::Notification => 5,
            Operation::Enter => 7,
            Operation::EnterReply => 8,
            Operation::Other(code) => code,
        }
    }
}

// ── Protocol versions ─────────────────────────────────────────────────────────

/// Body encoding selector carried in bytes 6..8 of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// UTF-8 JSON text, or an integer rendered as text (0).
    Plain,
    /// A 4-byte big-endian unsigned integer (1).
    Int32,
    /// zlib-compressed stream of nested frames (2).
    Zlib,
    /// brotli-compressed stream of nested frames (3).
    Brotli,
    /// Unknown version; passed through untouched.
    Other(u16),
}

impl ProtocolVersion {
    /// Returns `true` for versions whose body holds nested compressed frames.
    ///
    /// Packets with a compressed version never leave the decoder.
    pub fn is_compressed(self) -> bool {
        matches!(self, ProtocolVersion::Zlib | ProtocolVersion::Brotli)
    }
}

impl From<u16> for ProtocolVersion {
    fn from(value: u16) -> Self {
        match value {
            0 => ProtocolVersion::Plain,
            1 => ProtocolVersion::Int32,
            2 => ProtocolVersion::Zlib,
            3 => ProtocolVersion::Brotli,
            other => ProtocolVersion::Other(other),
        }
    }
}

impl From<ProtocolVersion> for u16 {
    fn from(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::Plain => 0,
            ProtocolVersion::Int32 => 1,
            ProtocolVersion::Zlib => 2,
            ProtocolVersion::Brotli => 3,
            ProtocolVersion::Other(v) => v,
        }
    }
}

// ── Header and packet ─────────────────────────────────────────────────────────

/// Parsed 16-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Total length of the frame, header included.
    pub packet_length: u32,
    /// Length of the header; conventionally [`HEADER_LENGTH`].
    pub header_length: u16,
    /// How the body is encoded.
    pub protocol_version: ProtocolVersion,
    /// What the frame means.
    pub operation: Operation,
    /// Sender-assigned sequence id.
    pub sequence: u32,
}

impl FrameHeader {
    /// Number of body bytes this header declares.
    pub fn body_length(&self) -> usize {
        (self.packet_length as usize).saturating_sub(self.header_length as usize)
    }
}

/// A terminal, fully decompressed protocol unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Body encoding; never [`ProtocolVersion::Zlib`] or [`ProtocolVersion::Brotli`]
    /// for packets returned by [`crate::protocol::decode_packets`].
    pub protocol_version: ProtocolVersion,
    /// What the packet means.
    pub operation: Operation,
    /// Sequence id copied from the header.
    pub sequence: u32,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl Packet {
    /// Creates a packet from its parts.
    pub fn new(
        operation: Operation,
        protocol_version: ProtocolVersion,
        sequence: u32,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            protocol_version,
            operation,
            sequence,
            body: body.into(),
        }
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Room popularity carried by a heartbeat reply.
    ///
    /// `Int32` bodies hold a 4-byte big-endian value; `Plain` bodies hold the
    /// value rendered as decimal text.  Returns `None` for any other packet.
    pub fn popularity(&self) -> Option<u32> {
        if self.operation != Operation::HeartbeatReply {
            return None;
        }
        match self.protocol_version {
            ProtocolVersion::Int32 => {
                let bytes: [u8; 4] = self.body.get(..4)?.try_into().ok()?;
                Some(u32::from_be_bytes(bytes))
            }
            ProtocolVersion::Plain => self.body_text().trim().parse().ok(),
            _ => None,
        }
    }
}

// ── Enter request ─────────────────────────────────────────────────────────────

/// Body of the enter (handshake) frame a client sends to join a room.
///
/// Serialises to the JSON object the server expects:
///
/// ```text
/// {"uid":0,"roomid":1234,"protover":3,"platform":"web","type":2,"key":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterRequest {
    /// Numeric id of the room to join.
    #[serde(rename = "roomid")]
    pub room_id: u64,
    /// Viewer uid; 0 joins anonymously.
    pub uid: u64,
    /// Compression the server should use for notification bundles.
    #[serde(rename = "protover")]
    pub protocol_version: u16,
    /// Client platform tag, e.g. `"web"`.
    pub platform: String,
    /// Auth token obtained from metadata discovery, if any.
    #[serde(rename = "key", skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
    /// Fixed client type expected by the server.
    #[serde(rename = "type", default = "default_client_type")]
    pub client_type: u8,
}

fn default_client_type() -> u8 {
    2
}

impl EnterRequest {
    /// Creates an anonymous web enter request for `room_id` asking for brotli bundles.
    pub fn new(room_id: u64) -> Self {
        Self {
            room_id,
            uid: 0,
            protocol_version: 3,
            platform: "web".to_string(),
            token: None,
            client_type: default_client_type(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
