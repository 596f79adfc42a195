//! # hnclient-client
//!
//! Client library for the HNClient pharmacy gateway.
//!
//! This crate provides:
//! - A blocking TCP transport bound to the loopback gateway port
//! - The session driver that performs one handshake/request/response
//!   exchange per call, with bounded polling at every wait point
//! - File/environment configuration
//!
//! Each call to [`HnClient::send_receive`] owns its own connection and
//! cipher seed end to end; nothing is shared across calls, so concurrent
//! callers are safe by construction.

pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use config::{Config, ConfigError};
pub use error::ClientError;
pub use session::{HnClient, Phase, SessionConfig};
pub use transport::{TcpTransport, Transport};
