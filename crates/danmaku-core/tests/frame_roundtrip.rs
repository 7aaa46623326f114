//! Integration tests for the danmaku-core frame codec.
//!
//! These tests drive the public API the way the client does: bytes arrive from
//! a WebSocket message, [`decode_packets`] turns them into terminal packets,
//! and the notification bodies are handed to the typed decoders.
//!
//! Property tests check that any plain frame survives an encode/decode trip,
//! that back-to-back frames keep their order, and that wrapping a stream in
//! up to [`MAX_NESTING_DEPTH`] compressed layers is transparent.

use std::io::Write;

use danmaku_core::protocol::codec::MAX_NESTING_DEPTH;
use danmaku_core::protocol::sequence::SequenceCounter;
use danmaku_core::{
    decode, decode_packets, encode_enter, encode_frame, encode_heartbeat, EnterRequest, Event,
    EventKind, FrameError, Operation, Packet, ProtocolVersion,
};
use flate2::{write::ZlibEncoder, Compression};
use proptest::prelude::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(data).expect("write to Vec cannot fail");
    enc.finish().expect("finish to Vec cannot fail")
}

fn brotli(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
        writer.write_all(data).expect("write to Vec cannot fail");
    }
    out
}

/// Wraps `stream` in `layers` compressed frames, alternating zlib and brotli.
fn wrap(mut stream: Vec<u8>, layers: usize) -> Vec<u8> {
    for layer in 0..layers {
        stream = if layer % 2 == 0 {
            encode_frame(Operation::Notification, ProtocolVersion::Zlib, 0, &zlib(&stream))
        } else {
            encode_frame(Operation::Notification, ProtocolVersion::Brotli, 0, &brotli(&stream))
        };
    }
    stream
}

fn terminal_version() -> impl Strategy<Value = ProtocolVersion> {
    prop_oneof![
        Just(ProtocolVersion::Plain),
        Just(ProtocolVersion::Int32),
        (4u16..=u16::MAX).prop_map(ProtocolVersion::Other),
    ]
}

fn operation() -> impl Strategy<Value = Operation> {
    any::<u32>().prop_map(Operation::from)
}

fn packet() -> impl Strategy<Value = Packet> {
    (
        operation(),
        terminal_version(),
        any::<u32>(),
        proptest::collection::vec(any::<u8>(), 0..256),
    )
        .prop_map(|(op, ver, seq, body)| Packet::new(op, ver, seq, body))
}

fn encode(packet: &Packet) -> Vec<u8> {
    encode_frame(
        packet.operation,
        packet.protocol_version,
        packet.sequence,
        &packet.body,
    )
}

// ── Properties ────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_single_frame_round_trips(p in packet()) {
        let decoded = decode_packets(&encode(&p)).unwrap();
        prop_assert_eq!(decoded, vec![p]);
    }

    #[test]
    fn prop_concatenated_frames_keep_order(packets in proptest::collection::vec(packet(), 0..16)) {
        let bytes: Vec<u8> = packets.iter().flat_map(encode).collect();
        prop_assert_eq!(decode_packets(&bytes).unwrap(), packets);
    }

    #[test]
    fn prop_nested_compression_is_transparent(
        packets in proptest::collection::vec(packet(), 1..6),
        layers in 1usize..=MAX_NESTING_DEPTH,
    ) {
        let inner: Vec<u8> = packets.iter().flat_map(encode).collect();
        let decoded = decode_packets(&wrap(inner, layers)).unwrap();
        prop_assert_eq!(decoded, packets);
    }

    #[test]
    fn prop_truncation_never_panics(p in packet(), cut in 1usize..32) {
        let bytes = encode(&p);
        let end = bytes.len().saturating_sub(cut);
        prop_assume!(end > 0);
        prop_assert!(decode_packets(&bytes[..end]).is_err());
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_nesting_one_level_too_deep_is_rejected() {
    let inner = encode_frame(Operation::Notification, ProtocolVersion::Plain, 1, b"{}");
    let err = decode_packets(&wrap(inner, MAX_NESTING_DEPTH + 1)).unwrap_err();
    assert_eq!(err, FrameError::NestingTooDeep(MAX_NESTING_DEPTH));
}

#[test]
fn test_server_bundle_decodes_to_typed_events() {
    // Arrange: a brotli bundle of two notifications followed by a popularity reply,
    // as a server would send it.
    let chat = br#"{"cmd":"DANMU_MSG:4:0:2:2:2:0","info":[[0,1,25,16777215,1700000000000],"hi",[1,"alice"]]}"#;
    let gift = br#"{"cmd":"SEND_GIFT","data":{"giftName":"flower","num":3,"uname":"bob"}}"#;
    let mut inner = encode_frame(Operation::Notification, ProtocolVersion::Plain, 0, chat);
    inner.extend(encode_frame(Operation::Notification, ProtocolVersion::Plain, 0, gift));
    let mut bytes = encode_frame(Operation::Notification, ProtocolVersion::Brotli, 0, &brotli(&inner));
    bytes.extend(encode_frame(
        Operation::HeartbeatReply,
        ProtocolVersion::Int32,
        0,
        &1234u32.to_be_bytes(),
    ));

    // Act
    let packets = decode_packets(&bytes).expect("bundle must decode");

    // Assert
    assert_eq!(packets.len(), 3);
    assert_eq!(packets[2].popularity(), Some(1234));

    let events: Vec<Event> = packets[..2]
        .iter()
        .map(|p| {
            let cmd = danmaku_core::message::command_of(&p.body);
            let kind = EventKind::from_cmd(&cmd).expect("typed command");
            decode(kind, &p.body)
        })
        .collect();
    match &events[0] {
        Event::Danmaku(d) => {
            assert_eq!(d.msg, "hi");
            assert_eq!(d.uname, "alice");
        }
        other => panic!("expected Danmaku, got {other:?}"),
    }
    match &events[1] {
        Event::Gift(g) => {
            assert_eq!(g.gift_name, "flower");
            assert_eq!(g.num, 3);
        }
        other => panic!("expected Gift, got {other:?}"),
    }
}

#[test]
fn test_outbound_frames_use_increasing_sequences() {
    // Arrange
    let counter = SequenceCounter::new();
    let request = EnterRequest {
        token: Some("tok".to_string()),
        ..EnterRequest::new(5440)
    };

    // Act
    let enter = encode_enter(&request, counter.next()).expect("enter encodes");
    let heartbeat = encode_heartbeat(counter.next());
    let mut bytes = enter;
    bytes.extend(heartbeat);
    let packets = decode_packets(&bytes).expect("own frames decode");

    // Assert
    assert_eq!(packets[0].operation, Operation::Enter);
    assert_eq!(packets[1].operation, Operation::Heartbeat);
    assert!(packets[1].sequence > packets[0].sequence);
    let body: serde_json::Value = serde_json::from_slice(&packets[0].body).expect("json body");
    assert_eq!(body["roomid"], 5440);
    assert_eq!(body["key"], "tok");
    assert_eq!(body["protover"], 3);
}
