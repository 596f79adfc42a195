//! # hnclient-protocol
//!
//! Wire protocol implementation for the HNClient pharmacy gateway.
//!
//! This crate provides:
//! - The chained XOR stream cipher used to scramble every wire segment
//! - Length-indicator framing (2-char kind tag + 10 decimal digits)
//! - Handshake scrambling and session seed derivation
//! - Request buffer assembly and response payload extraction
//!
//! Everything here is pure: no I/O, no state beyond function parameters.
//! The session driver in `hnclient-client` owns the socket work.

pub mod codec;
pub mod error;
pub mod frame;

pub use codec::{
    build_request_buffer, decode_stream, encode_stream, extract_message, scramble_handshake,
};
pub use error::ProtocolError;
pub use frame::{build_length_header, host_identity_frame, parse_length_header, FrameKind};

/// Default port the HNClient gateway listens on (loopback only).
pub const DEFAULT_PORT: u16 = 19430;

/// Size of a length-indicator header: 2-char kind tag + 10 decimal digits.
pub const LENGTH_HEADER_SIZE: usize = 12;

/// Width of the zero-padded decimal length field.
pub const LENGTH_FIELD_DIGITS: usize = 10;

/// Largest payload length representable in the 10-digit length field.
pub const MAX_PAYLOAD_SIZE: u64 = 9_999_999_999;

/// Handshake acknowledgement segment, echoed verbatim (unscrambled) by the
/// client ahead of the scrambled frames.
pub const HANDSHAKE_ACK: &[u8; 12] = b"HS0000000008";

/// Size of the handshake payload that seeds the session cipher.
pub const HANDSHAKE_PAYLOAD_SIZE: usize = 8;

/// Total width of the sender-identity frame (header + payload).
pub const HOST_IDENTITY_WIDTH: usize = 44;

/// Marker that starts the embedded HL7 message within a decoded response.
pub const MESSAGE_HEADER_MARKER: &str = "MSH";

/// Loopback address text embedded in the sender-identity frame.
pub const LOOPBACK_ADDR: &str = "127.0.0.1";
