//! Client error types.

use crate::session::Phase;
use thiserror::Error;

/// Errors surfaced by the session driver and transport.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] hnclient_protocol::ProtocolError),

    #[error("could not connect to gateway on port {port}: {source}")]
    Connect {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out waiting for {phase} after {attempts} poll attempts")]
    Timeout { phase: Phase, attempts: u32 },

    #[error("deadline exceeded while waiting for {phase}")]
    DeadlineExceeded { phase: Phase },
}

impl ClientError {
    /// Returns whether this error is potentially retryable with a fresh
    /// exchange.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_)
                | ClientError::Connect { .. }
                | ClientError::Timeout { .. }
                | ClientError::DeadlineExceeded { .. }
        )
    }
}
