//! Chained XOR stream cipher and wire buffer assembly.
//!
//! Every segment on the wire (other than the literal handshake ack) is
//! scrambled with a self-synchronizing XOR cipher keyed by a single session
//! seed byte. Encoding chains each output byte on the previous *ciphertext*
//! byte:
//!
//! ```text
//! c[0] = p[0] ^ seed
//! c[i] = p[i] ^ c[i-1]
//! ```
//!
//! Decoding reverses this by XORing each received byte with the previous
//! received byte, so `decode_stream(encode_stream(x, s), s)` always
//! reproduces `x`. Each segment restarts the chain from the seed; the
//! cipher does not run continuously across segment boundaries.

use crate::error::ProtocolError;
use crate::frame::{build_length_header, host_identity_frame, FrameKind};
use crate::{HANDSHAKE_ACK, HANDSHAKE_PAYLOAD_SIZE, LENGTH_HEADER_SIZE, MESSAGE_HEADER_MARKER};
use bytes::{BufMut, BytesMut};

/// Scrambles a byte sequence with the chained XOR cipher.
pub fn encode_stream(data: &[u8], seed: u8) -> Vec<u8> {
    let mut out = data.to_vec();
    let mut prev = seed;
    for byte in &mut out {
        *byte ^= prev;
        prev = *byte;
    }
    out
}

/// Descrambles a byte sequence and interprets the result as text.
///
/// The inverse of [`encode_stream`]: each byte is XORed with the previous
/// ciphertext byte (the seed for the first). Decoded bytes are read as
/// UTF-8 lossily since the protocol envelope ahead of the `MSH` marker may
/// carry arbitrary control bytes.
pub fn decode_stream(data: &[u8], seed: u8) -> String {
    let mut out = data.to_vec();
    let mut prev = seed;
    for byte in &mut out {
        let cipher = *byte;
        *byte ^= prev;
        prev = cipher;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Scrambles the 8-byte handshake payload with seed 0 and derives the
/// session seed from it.
///
/// The seed is the final scrambled byte, which with a zero initial seed
/// equals the XOR of all eight payload bytes. The scrambled payload is
/// echoed back to the gateway verbatim in the transmit phase.
pub fn scramble_handshake(payload: &[u8; HANDSHAKE_PAYLOAD_SIZE]) -> (Vec<u8>, u8) {
    let scrambled = encode_stream(payload, 0);
    let seed = scrambled[HANDSHAKE_PAYLOAD_SIZE - 1];
    (scrambled, seed)
}

/// Assembles the complete outbound buffer for one exchange.
///
/// Layout, in order:
/// 1. literal handshake ack `"HS0000000008"` (unscrambled)
/// 2. the seed-0-scrambled handshake echo (8 bytes)
/// 3. sender-identity header (12 bytes) and payload (32 bytes)
/// 4. data header (`"DT"` + 10-digit message byte length) and the message
///
/// Segments 3 and 4 are each scrambled independently with the session
/// seed, restarting the cipher chain per segment.
pub fn build_request_buffer(
    handshake_echo: &[u8],
    machine_name: &str,
    message: &str,
    seed: u8,
) -> Result<Vec<u8>, ProtocolError> {
    let identity = host_identity_frame(machine_name);
    let data_header = build_length_header(FrameKind::Data, message.len() as u64)?;

    let mut buf = BytesMut::with_capacity(
        HANDSHAKE_ACK.len()
            + handshake_echo.len()
            + identity.len()
            + data_header.len()
            + message.len(),
    );

    buf.put_slice(HANDSHAKE_ACK);
    buf.put_slice(handshake_echo);

    let (si_header, si_payload) = identity.as_bytes().split_at(LENGTH_HEADER_SIZE);
    buf.put_slice(&encode_stream(si_header, seed));
    buf.put_slice(&encode_stream(si_payload, seed));
    buf.put_slice(&encode_stream(data_header.as_bytes(), seed));
    buf.put_slice(&encode_stream(message.as_bytes(), seed));

    Ok(buf.to_vec())
}

/// Extracts the embedded HL7 message from a decoded response body.
///
/// Everything ahead of the first `"MSH"` occurrence is protocol envelope
/// and is discarded; a trailing carriage return is appended to the kept
/// portion. A body with no marker is a framing failure.
pub fn extract_message(decoded: &str) -> Result<String, ProtocolError> {
    match decoded.find(MESSAGE_HEADER_MARKER) {
        Some(idx) => Ok(format!("{}\r", &decoded[idx..])),
        None => Err(ProtocolError::HeaderMarkerNotFound),
    }
}
