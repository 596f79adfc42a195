//! End-to-end exchange against a scripted in-process gateway.

use hnclient_client::{ClientError, HnClient, SessionConfig};
use hnclient_protocol::{decode_stream, encode_stream, scramble_handshake};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;

const HANDSHAKE_PAYLOAD: [u8; 8] = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80];

/// Spawns a gateway that performs the handshake, consumes the request, and
/// replies with `response` (envelope + HL7 body). Returns the port and the
/// thread handle, which yields the request text the gateway decoded.
fn spawn_gateway(response: &'static str) -> (u16, std::thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = std::thread::spawn(move || {
        let (mut peer, _) = listener.accept().unwrap();

        // Handshake: ack segment plus the seed payload.
        peer.write_all(b"HS0000000008").unwrap();
        peer.write_all(&HANDSHAKE_PAYLOAD).unwrap();
        peer.flush().unwrap();

        let (_, seed) = scramble_handshake(&HANDSHAKE_PAYLOAD);

        // Request: ack echo (12) + handshake echo (8) + SI frame (44) + DT header (12).
        let mut fixed = [0u8; 12 + 8 + 44 + 12];
        peer.read_exact(&mut fixed).unwrap();
        assert_eq!(&fixed[..12], b"HS0000000008");

        let dt_header = decode_stream(&fixed[64..76], seed);
        let request_len: usize = dt_header[2..].parse().unwrap();
        let mut request = vec![0u8; request_len];
        peer.read_exact(&mut request).unwrap();
        let request_text = decode_stream(&request, seed);

        // Response: scrambled header then scrambled body.
        let header = format!("DT{:010}", response.len());
        peer.write_all(&encode_stream(header.as_bytes(), seed)).unwrap();
        peer.write_all(&encode_stream(response.as_bytes(), seed)).unwrap();
        peer.flush().unwrap();

        request_text
    });

    (port, handle)
}

fn fast_config(port: u16) -> SessionConfig {
    SessionConfig::new(port)
        .with_poll_interval(Duration::from_millis(5))
        .with_machine_name("integration-host")
}

#[test]
fn exchange_over_real_socket() {
    let (port, gateway) = spawn_gateway("\u{b}envelope MSH|^~\\&|PNP|PP|reply-body");

    let client = HnClient::new(fast_config(port));
    let result = client.send_receive("ZPN|test-request").unwrap();

    assert_eq!(result, "MSH|^~\\&|PNP|PP|reply-body\r");
    assert_eq!(gateway.join().unwrap(), "ZPN|test-request");
}

#[test]
fn marker_missing_over_real_socket() {
    let (port, gateway) = spawn_gateway("reply with no marker at all");

    let client = HnClient::new(fast_config(port));
    let result = client.send_receive("ZPN|test-request");

    assert!(matches!(
        result,
        Err(ClientError::Protocol(
            hnclient_protocol::ProtocolError::HeaderMarkerNotFound
        ))
    ));
    gateway.join().unwrap();
}

#[test]
fn silent_gateway_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let client = HnClient::new(
        SessionConfig::new(port)
            .with_poll_interval(Duration::from_millis(1))
            .with_max_poll_attempts(5)
            .with_machine_name("integration-host"),
    );

    // Accepts but never speaks; the handshake wait must give up.
    let result = client.send_receive("ZPN|test-request");
    assert!(matches!(
        result,
        Err(ClientError::Timeout { attempts: 5, .. })
    ));
    drop(listener);
}
