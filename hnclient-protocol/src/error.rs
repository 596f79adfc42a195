//! Protocol error types.

use thiserror::Error;

/// Errors raised while framing or unframing wire segments.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("invalid length header: {header:?}")]
    InvalidLengthHeader { header: String },

    #[error("message header marker not found in decoded response")]
    HeaderMarkerNotFound,
}
