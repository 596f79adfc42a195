//! Byte-stream transport over the gateway socket.
//!
//! The [`Transport`] trait is the narrow seam between the session driver
//! and the operating system: connectivity, readable-byte count, send and
//! receive. The production implementation is a blocking loopback TCP
//! socket; tests substitute scripted fakes.

use crate::error::ClientError;
use bytes::{Buf, BytesMut};
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, TcpStream};

/// Capability set the session driver needs from a byte stream.
///
/// No retry or framing logic belongs here; implementations only move
/// bytes. `available` reports how many bytes are currently buffered for
/// read without blocking, which the driver polls in its bounded wait
/// loops.
pub trait Transport {
    /// Returns whether the underlying connection is still established.
    fn is_connected(&self) -> bool;

    /// Returns the number of bytes that can be read without blocking.
    fn available(&mut self) -> io::Result<usize>;

    /// Sends bytes, returning how many were written.
    fn send(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Receives up to `buf.len()` bytes, returning how many were read.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Blocking TCP transport bound to the loopback gateway port.
///
/// `available()` toggles the socket into nonblocking mode, drains whatever
/// the kernel has buffered into an internal receive buffer, and reports
/// the accumulated count. `receive()` serves from that buffer first, then
/// falls back to a blocking read. The socket is closed when the transport
/// is dropped, on every exit path.
pub struct TcpTransport {
    stream: TcpStream,
    rx: BytesMut,
    connected: bool,
}

impl TcpTransport {
    /// Connects eagerly to the gateway on the loopback interface.
    pub fn connect(port: u16) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port))
            .map_err(|source| ClientError::Connect { port, source })?;
        stream.set_nodelay(true).ok();

        // A connect that resolved but produced no peer is not established.
        if stream.peer_addr().is_err() {
            return Err(ClientError::Connect {
                port,
                source: io::Error::new(io::ErrorKind::NotConnected, "no peer after connect"),
            });
        }

        tracing::debug!(port, "connected to gateway");
        Ok(Self {
            stream,
            rx: BytesMut::with_capacity(8 * 1024),
            connected: true,
        })
    }

    /// Drains kernel-buffered bytes into `rx` without blocking.
    fn fill(&mut self) -> io::Result<()> {
        self.stream.set_nonblocking(true)?;
        let result = self.fill_nonblocking();
        self.stream.set_nonblocking(false)?;
        result
    }

    fn fill_nonblocking(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; 8 * 1024];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.connected = false;
                    return Ok(());
                }
                Ok(n) => self.rx.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.connected = false;
                    return Err(e);
                }
            }
        }
    }
}

impl Transport for TcpTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn available(&mut self) -> io::Result<usize> {
        self.fill()?;
        Ok(self.rx.len())
    }

    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        self.stream.write(data)
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rx.is_empty() {
            // Blocking read, as the legacy gateway client did. The driver
            // only lands here after a poll confirmed data is on its way.
            return self.stream.read(buf);
        }
        let n = buf.len().min(self.rx.len());
        self.rx.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpTransport::connect(port);
        assert!(matches!(result, Err(ClientError::Connect { .. })));
    }

    #[test]
    fn test_available_accumulates() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = std::thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            peer.write_all(b"HS0000000008").unwrap();
            peer.flush().unwrap();
            // Keep the connection open until the client is done reading.
            let mut sink = [0u8; 1];
            let _ = peer.read(&mut sink);
        });

        let mut transport = TcpTransport::connect(port).unwrap();
        assert!(transport.is_connected());

        let mut seen = 0;
        for _ in 0..200 {
            seen = transport.available().unwrap();
            if seen >= 12 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(seen, 12);

        let mut buf = [0u8; 12];
        assert_eq!(transport.receive(&mut buf).unwrap(), 12);
        assert_eq!(&buf, b"HS0000000008");

        transport.send(b"x").unwrap();
        handle.join().unwrap();
    }
}
