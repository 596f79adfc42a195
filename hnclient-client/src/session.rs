//! Session driver: one handshake/request/response exchange per call.
//!
//! Call flow: acquire a transport, wait for and read the gateway's
//! handshake, derive the session seed, transmit the scrambled request
//! buffer, wait for and read the 12-byte response header, wait until the
//! advertised body length is available, read and descramble the body, and
//! extract the embedded HL7 message. Every wait point runs the same
//! bounded polling loop; exhaustion surfaces as an explicit timeout.

use crate::error::ClientError;
use crate::transport::{TcpTransport, Transport};
use hnclient_protocol::{
    build_request_buffer, decode_stream, extract_message, parse_length_header, scramble_handshake,
    HANDSHAKE_PAYLOAD_SIZE, LENGTH_HEADER_SIZE,
};
use std::fmt;
use std::process::Command;
use std::time::{Duration, Instant};

/// Interval between availability polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Maximum polls per wait point before giving up (~10s at the default
/// interval; three wait points per call).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 100;

/// The wait point a timeout occurred at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the gateway's initial handshake bytes.
    Handshake,
    /// Waiting for the 12-byte response header.
    ResponseHeader,
    /// Waiting for the full response body advertised by the header.
    ResponseBody,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Handshake => write!(f, "handshake"),
            Phase::ResponseHeader => write!(f, "response header"),
            Phase::ResponseBody => write!(f, "response body"),
        }
    }
}

/// Per-client settings. Everything else about an exchange is call-scoped.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Gateway port on the loopback interface.
    pub port: u16,
    /// Sleep between availability polls.
    pub poll_interval: Duration,
    /// Poll budget per wait point.
    pub max_poll_attempts: u32,
    /// Optional overall deadline per exchange, checked in every poll loop.
    pub deadline: Option<Duration>,
    /// Machine name embedded in the sender-identity frame.
    pub machine_name: String,
}

impl SessionConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            deadline: None,
            machine_name: detect_machine_name(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_machine_name(mut self, name: impl Into<String>) -> Self {
        self.machine_name = name.into();
        self
    }
}

/// Detects the local machine name for the sender-identity frame.
fn detect_machine_name() -> String {
    if let Ok(output) = Command::new("hostname").output() {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

/// Client for the HNClient gateway.
///
/// Holds only configuration; each [`send_receive`](Self::send_receive)
/// call opens its own connection and derives its own cipher seed, so a
/// single client is safe to share across threads.
pub struct HnClient {
    config: SessionConfig,
}

impl HnClient {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Performs one complete exchange: sends `message` and returns the
    /// gateway's response from its `MSH` marker onward, with a trailing
    /// carriage return.
    ///
    /// The message is passed through as-is; validating it is the caller's
    /// concern.
    pub fn send_receive(&self, message: &str) -> Result<String, ClientError> {
        let mut transport = TcpTransport::connect(self.config.port)?;
        self.exchange(&mut transport, message)
    }

    /// Runs the exchange over an already-acquired transport.
    ///
    /// Split out from [`send_receive`](Self::send_receive) so the protocol
    /// logic can be driven over scripted transports.
    pub fn exchange<T: Transport>(
        &self,
        transport: &mut T,
        message: &str,
    ) -> Result<String, ClientError> {
        let deadline = self.config.deadline.map(|d| Instant::now() + d);

        // Handshake phase: the gateway speaks first.
        self.poll_until(transport, Phase::Handshake, deadline, |n| n >= 1)?;
        let mut ack = [0u8; LENGTH_HEADER_SIZE];
        self.read_exact(transport, Phase::Handshake, deadline, &mut ack)?;
        let mut payload = [0u8; HANDSHAKE_PAYLOAD_SIZE];
        self.read_exact(transport, Phase::Handshake, deadline, &mut payload)?;

        let (echo, seed) = scramble_handshake(&payload);
        tracing::debug!(seed, "handshake received, session seed derived");

        // Transmit phase: the whole request goes out as one buffer.
        let request = build_request_buffer(&echo, &self.config.machine_name, message, seed)?;
        self.send_all(transport, &request)?;
        tracing::debug!(bytes = request.len(), "request transmitted");

        // Header-receive phase.
        self.poll_until(transport, Phase::ResponseHeader, deadline, |n| n >= 1)?;
        let mut header = [0u8; LENGTH_HEADER_SIZE];
        self.read_exact(transport, Phase::ResponseHeader, deadline, &mut header)?;
        let header_text = decode_stream(&header, seed);
        let (_, body_len) = parse_length_header(&header_text)?;
        let body_len = body_len as usize;
        tracing::debug!(body_len, "response header decoded");

        // Body-receive phase: unlike the earlier waits, the full body must
        // be buffered before the read.
        self.poll_until(transport, Phase::ResponseBody, deadline, |n| n >= body_len)?;
        let mut body = vec![0u8; body_len];
        self.read_exact(transport, Phase::ResponseBody, deadline, &mut body)?;

        let decoded = decode_stream(&body, seed);
        let extracted = extract_message(&decoded)?;
        tracing::debug!(bytes = extracted.len(), "response extracted");
        Ok(extracted)
    }

    /// Polls `available()` until `ready` holds, sleeping a fixed interval
    /// between attempts, up to the configured attempt budget.
    fn poll_until<T, F>(
        &self,
        transport: &mut T,
        phase: Phase,
        deadline: Option<Instant>,
        mut ready: F,
    ) -> Result<(), ClientError>
    where
        T: Transport,
        F: FnMut(usize) -> bool,
    {
        let mut attempts = 0;
        loop {
            if ready(transport.available()?) {
                return Ok(());
            }
            attempts += 1;
            if attempts >= self.config.max_poll_attempts {
                tracing::warn!(%phase, attempts, "poll budget exhausted");
                return Err(ClientError::Timeout { phase, attempts });
            }
            if let Some(limit) = deadline {
                if Instant::now() >= limit {
                    return Err(ClientError::DeadlineExceeded { phase });
                }
            }
            if !self.config.poll_interval.is_zero() {
                std::thread::sleep(self.config.poll_interval);
            }
        }
    }

    /// Reads exactly `buf.len()` bytes, re-entering the bounded poll loop
    /// whenever the transport runs dry mid-frame.
    ///
    /// The legacy client issued a single sized receive and ignored short
    /// reads; accumulating here is a deliberate robustness improvement.
    fn read_exact<T: Transport>(
        &self,
        transport: &mut T,
        phase: Phase,
        deadline: Option<Instant>,
        buf: &mut [u8],
    ) -> Result<(), ClientError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = transport.receive(&mut buf[filled..])?;
            if n == 0 {
                self.poll_until(transport, phase, deadline, |a| a >= 1)?;
                continue;
            }
            filled += n;
        }
        Ok(())
    }

    fn send_all<T: Transport>(&self, transport: &mut T, data: &[u8]) -> Result<(), ClientError> {
        let mut sent = 0;
        while sent < data.len() {
            let n = transport.send(&data[sent..])?;
            if n == 0 {
                return Err(ClientError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "transport accepted no bytes",
                )));
            }
            sent += n;
        }
        Ok(())
    }
}
