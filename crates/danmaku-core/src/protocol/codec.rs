//! Binary codec for encoding and decoding live-room stream frames.
//!
//! Wire format:
//! ```text
//! [packet_length:4][header_length:2][protocol_version:2][operation:4][sequence:4][body:N]
//! ```
//! Header size: 16 bytes. All multi-byte integers are big-endian.
//!
//! # Nested frames
//!
//! A single WebSocket message may carry several frames back to back.  Frames
//! whose protocol version is 2 (zlib) or 3 (brotli) do not carry a payload of
//! their own: their body is a compressed stream of *further* frames.  The
//! decoder inflates those bodies and decodes the result with the same rules,
//! so callers only ever see terminal packets.

use std::io::Read;

use flate2::read::ZlibDecoder;
use thiserror::Error;
use tracing::trace;

use crate::protocol::packet::{
    EnterRequest, FrameHeader, Operation, Packet, ProtocolVersion, HEADER_LENGTH, HEADER_SIZE,
};

/// Nested compressed streams deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Largest body a single compressed frame may inflate to.
pub const MAX_INFLATED_SIZE: usize = 8 * 1024 * 1024;

/// Internal buffer size handed to the brotli decompressor.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Errors that can occur during frame encoding or decoding.
///
/// Every decode error means the inbound buffer cannot be trusted; the session
/// treats it like a transport read failure.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// The buffer ends before the header or body it declares.
    #[error("truncated frame: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    /// The header length field is smaller than the fixed header.
    #[error("invalid header length: {0}")]
    InvalidHeaderLength(u16),

    /// The packet length field is smaller than the header length.
    #[error("invalid packet length {packet_length} for header length {header_length}")]
    InvalidPacketLength { packet_length: u32, header_length: u16 },

    /// A compressed body could not be inflated.
    #[error("failed to decompress protocol version {version} body: {message}")]
    Decompress { version: u16, message: String },

    /// Compressed frames were nested deeper than [`MAX_NESTING_DEPTH`].
    #[error("compressed frames nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// An outbound body could not be serialised.
    #[error("failed to encode frame body: {0}")]
    Encode(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parses the 16-byte header at the start of `bytes`.
///
/// # Errors
///
/// Returns [`FrameError::Truncated`] when fewer than 16 bytes are available,
/// and a length error when the declared lengths are inconsistent.
pub fn decode_header(bytes: &[u8]) -> Result<FrameHeader, FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let packet_length = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let header_length = u16::from_be_bytes([bytes[4], bytes[5]]);
    let protocol_version = u16::from_be_bytes([bytes[6], bytes[7]]);
    let operation = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let sequence = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    if header_length < HEADER_LENGTH {
        return Err(FrameError::InvalidHeaderLength(header_length));
    }
    if packet_length < u32::from(header_length) {
        return Err(FrameError::InvalidPacketLength {
            packet_length,
            header_length,
        });
    }

    Ok(FrameHeader {
        packet_length,
        header_length,
        protocol_version: ProtocolVersion::from(protocol_version),
        operation: Operation::from(operation),
        sequence,
    })
}

/// Decodes every frame in `bytes` into terminal packets, in arrival order.
///
/// Compressed frames are replaced by the packets found inside them.  An empty
/// buffer decodes to an empty list.
///
/// # Errors
///
/// Returns [`FrameError`] if any header or body is truncated or malformed, or
/// if a compressed body cannot be inflated.  Nothing is returned on error:
/// a buffer is either decoded completely or rejected.
///
/// # Examples
///
/// ```rust
/// use danmaku_core::protocol::{decode_packets, encode_frame, Operation, ProtocolVersion};
///
/// let mut bytes = encode_frame(Operation::Notification, ProtocolVersion::Plain, 1, br#"{"cmd":"LIVE"}"#);
/// bytes.extend(encode_frame(Operation::HeartbeatReply, ProtocolVersion::Int32, 2, &7u32.to_be_bytes()));
///
/// let packets = decode_packets(&bytes).unwrap();
/// assert_eq!(packets.len(), 2);
/// assert_eq!(packets[1].popularity(), Some(7));
/// ```
pub fn decode_packets(bytes: &[u8]) -> Result<Vec<Packet>, FrameError> {
    let mut packets = Vec::new();
    decode_stream(bytes, 0, &mut packets)?;
    Ok(packets)
}

/// Encodes one frame with a 16-byte header in front of `body`.
///
/// # Examples
///
/// ```rust
/// use danmaku_core::protocol::{encode_frame, Operation, ProtocolVersion, HEADER_SIZE};
///
/// let bytes = encode_frame(Operation::Heartbeat, ProtocolVersion::Int32, 1, &[]);
/// assert_eq!(bytes.len(), HEADER_SIZE);
/// ```
pub fn encode_frame(
    operation: Operation,
    protocol_version: ProtocolVersion,
    sequence: u32,
    body: &[u8],
) -> Vec<u8> {
    let packet_length = (HEADER_SIZE + body.len()) as u32;

    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
    buf.extend_from_slice(&packet_length.to_be_bytes());
    buf.extend_from_slice(&HEADER_LENGTH.to_be_bytes());
    buf.extend_from_slice(&u16::from(protocol_version).to_be_bytes());
    buf.extend_from_slice(&u32::from(operation).to_be_bytes());
    buf.extend_from_slice(&sequence.to_be_bytes());
    buf.extend_from_slice(body);
    buf
}

/// Builds the keep-alive frame: operation 2, protocol version 1, empty body.
pub fn encode_heartbeat(sequence: u32) -> Vec<u8> {
    encode_frame(Operation::Heartbeat, ProtocolVersion::Int32, sequence, &[])
}

/// Builds the enter (handshake) frame carrying `request` as JSON.
///
/// # Errors
///
/// Returns [`FrameError::Encode`] if the request cannot be serialised.
pub fn encode_enter(request: &EnterRequest, sequence: u32) -> Result<Vec<u8>, FrameError> {
    let body = serde_json::to_vec(request).map_err(|e| FrameError::Encode(e.to_string()))?;
    Ok(encode_frame(
        Operation::Enter,
        ProtocolVersion::Int32,
        sequence,
        &body,
    ))
}

// ── Stream decoding ───────────────────────────────────────────────────────────

fn decode_stream(bytes: &[u8], depth: usize, out: &mut Vec<Packet>) -> Result<(), FrameError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(FrameError::NestingTooDeep(MAX_NESTING_DEPTH));
    }

    let mut offset = 0;
    while offset < bytes.len() {
        let rest = &bytes[offset..];
        let header = decode_header(rest)?;

        let packet_length = header.packet_length as usize;
        if rest.len() < packet_length {
            return Err(FrameError::Truncated {
                needed: packet_length,
                available: rest.len(),
            });
        }
        let body = &rest[header.header_length as usize..packet_length];

        match header.protocol_version {
            ProtocolVersion::Zlib => {
                let inflated = inflate_zlib(body)?;
                trace!(depth, inflated = inflated.len(), "inflated zlib bundle");
                decode_stream(&inflated, depth + 1, out)?;
            }
            ProtocolVersion::Brotli => {
                let inflated = inflate_brotli(body)?;
                trace!(depth, inflated = inflated.len(), "inflated brotli bundle");
                decode_stream(&inflated, depth + 1, out)?;
            }
            version => out.push(Packet {
                protocol_version: version,
                operation: header.operation,
                sequence: header.sequence,
                body: body.to_vec(),
            }),
        }

        // Advancing by packet_length always makes progress: decode_header
        // guarantees packet_length >= header_length >= 16.
        offset += packet_length;
    }
    Ok(())
}

fn inflate_zlib(body: &[u8]) -> Result<Vec<u8>, FrameError> {
    read_bounded(ZlibDecoder::new(body), ProtocolVersion::Zlib)
}

fn inflate_brotli(body: &[u8]) -> Result<Vec<u8>, FrameError> {
    read_bounded(
        brotli::Decompressor::new(body, BROTLI_BUFFER_SIZE),
        ProtocolVersion::Brotli,
    )
}

/// Reads at most [`MAX_INFLATED_SIZE`] bytes; anything larger is rejected.
fn read_bounded(decoder: impl Read, version: ProtocolVersion) -> Result<Vec<u8>, FrameError> {
    let mut inflated = Vec::new();
    decoder
        .take(MAX_INFLATED_SIZE as u64 + 1)
        .read_to_end(&mut inflated)
        .map_err(|e| FrameError::Decompress {
            version: version.into(),
            message: e.to_string(),
        })?;
    if inflated.len() > MAX_INFLATED_SIZE {
        return Err(FrameError::Decompress {
            version: version.into(),
            message: format!("inflated body exceeds {MAX_INFLATED_SIZE} bytes"),
        });
    }
    Ok(inflated)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
