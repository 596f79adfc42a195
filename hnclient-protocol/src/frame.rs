//! Length-indicator framing for HNClient wire segments.
//!
//! Segment layout (12-byte header + payload):
//!
//! ```text
//! +----------+---------------------+---------------------+
//! | kind tag | payload length      | payload             |
//! | 2 chars  | 10 decimal digits   | payload_len bytes   |
//! +----------+---------------------+---------------------+
//! ```
//!
//! The length field is always zero-padded to exactly 10 digits, which puts a
//! hard ceiling of 9,999,999,999 bytes on any payload.

use crate::error::ProtocolError;
use crate::{LENGTH_FIELD_DIGITS, LENGTH_HEADER_SIZE, LOOPBACK_ADDR, MAX_PAYLOAD_SIZE};

/// Kinds of wire segment, identified by the 2-char tag in the length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Handshake segment ("HS").
    Handshake,
    /// Sender-identity segment ("SI").
    SenderIdentity,
    /// Data segment carrying the HL7 message ("DT").
    Data,
}

impl FrameKind {
    /// Returns the 2-char wire tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            FrameKind::Handshake => "HS",
            FrameKind::SenderIdentity => "SI",
            FrameKind::Data => "DT",
        }
    }

    /// Parses a 2-char wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "HS" => Some(FrameKind::Handshake),
            "SI" => Some(FrameKind::SenderIdentity),
            "DT" => Some(FrameKind::Data),
            _ => None,
        }
    }
}

/// Builds a 12-char length header: kind tag + zero-padded 10-digit length.
///
/// Lengths beyond [`MAX_PAYLOAD_SIZE`] do not fit the fixed-width field and
/// are rejected rather than silently truncated.
pub fn build_length_header(kind: FrameKind, payload_len: u64) -> Result<String, ProtocolError> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(format!(
        "{}{:0width$}",
        kind.tag(),
        payload_len,
        width = LENGTH_FIELD_DIGITS
    ))
}

/// Parses a 12-char length header back into its kind tag and payload length.
///
/// The decoded response header arrives through the stream cipher, so a
/// corrupted stream shows up here as a malformed header rather than a
/// panic further down.
pub fn parse_length_header(header: &str) -> Result<(FrameKind, u64), ProtocolError> {
    let malformed = || ProtocolError::InvalidLengthHeader {
        header: header.to_string(),
    };

    if header.len() != LENGTH_HEADER_SIZE || !header.is_ascii() {
        return Err(malformed());
    }

    let kind = FrameKind::from_tag(&header[..2]).ok_or_else(malformed)?;
    let digits = &header[2..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let payload_len: u64 = digits.parse().map_err(|_| malformed())?;

    Ok((kind, payload_len))
}

/// Builds the 44-char sender-identity frame.
///
/// Layout: `"SI" + "0000000032" + "A"` followed by the machine name
/// truncated/right-padded to 16 chars and the loopback address text
/// right-padded to 15 chars. The result is always exactly 44 chars wide,
/// whatever the machine name length.
pub fn host_identity_frame(machine_name: &str) -> String {
    let mut frame = String::with_capacity(crate::HOST_IDENTITY_WIDTH);
    frame.push_str("SI0000000032A");
    frame.push_str(&format!("{machine_name:<16.16}"));
    frame.push_str(&format!("{LOOPBACK_ADDR:<15}"));
    format!("{frame:<44}")
}
