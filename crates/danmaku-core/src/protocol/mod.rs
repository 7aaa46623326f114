//! Protocol module containing frame types and the binary codec.

pub mod codec;
pub mod packet;
pub mod sequence;

pub use codec::{
    decode_header, decode_packets, encode_enter, encode_frame, encode_heartbeat, FrameError,
    MAX_INFLATED_SIZE, MAX_NESTING_DEPTH,
};
pub use packet::*;
pub use sequence::SequenceCounter;
