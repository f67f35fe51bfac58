// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client sessions against an in-process mock controller.

use rtde::protocol::{Command, FieldType, Packet, PacketCodec, Value};
use rtde::{ClientConfig, ConnectionState, ControllerVersion, Recipe, RtdeClient, RtdeError};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const RECIPE_ID: u8 = 1;

/// Spawn a one-shot controller on loopback running `script` on the accepted stream.
fn mock_controller<F>(script: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(&mut TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("timeout");
        script(&mut stream);
    });
    (port, handle)
}

fn read_packet(stream: &mut TcpStream) -> Packet {
    let mut header = [0u8; 3];
    stream.read_exact(&mut header).expect("header");
    let size = u16::from_be_bytes([header[0], header[1]]) as usize;
    let mut payload = vec![0u8; size - 3];
    stream.read_exact(&mut payload).expect("payload");
    Packet {
        command: Command::from(header[2]),
        payload,
    }
}

fn frame(command: Command, payload: &[u8]) -> Vec<u8> {
    PacketCodec::encode(command, payload).expect("encode")
}

fn expect_request(stream: &mut TcpStream, command: Command) -> Vec<u8> {
    let packet = read_packet(stream);
    assert_eq!(packet.command, command);
    packet.payload
}

fn accept_handshake(stream: &mut TcpStream) {
    let payload = expect_request(stream, Command::RequestProtocolVersion);
    assert_eq!(payload, vec![0, 2]);
    stream
        .write_all(&frame(Command::RequestProtocolVersion, &[1]))
        .expect("write");
}

fn accept_setup(stream: &mut TcpStream, types: &str) {
    let payload = expect_request(stream, Command::SetupOutputs);
    let frequency = f64::from_be_bytes(payload[..8].try_into().expect("f64"));
    assert_eq!(frequency, 125.0);
    assert_eq!(&payload[8..], b"timestamp,actual_q");

    let mut reply = vec![RECIPE_ID];
    reply.extend_from_slice(types.as_bytes());
    stream
        .write_all(&frame(Command::SetupOutputs, &reply))
        .expect("write");
}

fn recipe() -> Recipe {
    Recipe::new([
        ("timestamp", FieldType::Double),
        ("actual_q", FieldType::Vector6d),
    ])
}

fn data_package(recipe_id: u8, timestamp: f64) -> Vec<u8> {
    let mut payload = vec![recipe_id];
    Value::Double(timestamp)
        .encode(&mut payload)
        .expect("encode");
    Value::Vector6d([timestamp; 6])
        .encode(&mut payload)
        .expect("encode");
    frame(Command::DataPackage, &payload)
}

fn text_message(msg: &str, source: &str, level: u8) -> Vec<u8> {
    let mut payload = vec![msg.len() as u8];
    payload.extend_from_slice(msg.as_bytes());
    payload.push(source.len() as u8);
    payload.extend_from_slice(source.as_bytes());
    payload.push(level);
    frame(Command::TextMessage, &payload)
}

fn client(port: u16) -> RtdeClient {
    RtdeClient::new(
        ClientConfig::new("127.0.0.1")
            .port(port)
            .receive_timeout(Duration::from_millis(200)),
    )
}

fn timestamp(sample: &rtde::Sample) -> f64 {
    match sample.get("timestamp") {
        Some(Value::Double(t)) => *t,
        other => panic!("unexpected timestamp {:?}", other),
    }
}

#[test]
fn test_handshake_and_controller_version() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        expect_request(stream, Command::GetControllerVersion);
        let mut reply = Vec::new();
        for part in [5u32, 11, 0, 108] {
            reply.extend_from_slice(&part.to_be_bytes());
        }
        stream
            .write_all(&frame(Command::GetControllerVersion, &reply))
            .expect("write");
    });

    let mut client = client(port);
    client.connect().expect("connect");
    assert_eq!(client.state(), ConnectionState::Connected);

    let version = client.get_controller_version().expect("version");
    assert_eq!(
        version,
        ControllerVersion {
            major: 5,
            minor: 11,
            bugfix: 0,
            build: 108
        }
    );

    client.disconnect();
    client.disconnect();
    assert!(!client.is_connected());
    server.join().expect("server");
}

#[test]
fn test_protocol_version_rejected() {
    let (port, server) = mock_controller(|stream| {
        expect_request(stream, Command::RequestProtocolVersion);
        stream
            .write_all(&frame(Command::RequestProtocolVersion, &[0]))
            .expect("write");
    });

    let mut client = client(port);
    let err = client.connect().expect_err("rejected");
    assert!(matches!(err, RtdeError::ProtocolVersionRejected(2)));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    server.join().expect("server");
}

#[test]
fn test_text_message_before_reply_is_skipped() {
    let (port, server) = mock_controller(|stream| {
        expect_request(stream, Command::RequestProtocolVersion);
        let mut bytes = text_message("booting", "ctl", 3);
        bytes.extend(frame(Command::RequestProtocolVersion, &[1]));
        stream.write_all(&bytes).expect("write");
    });

    let mut client = client(port);
    client.connect().expect("connect");
    server.join().expect("server");
}

#[test]
fn test_buffered_receive_preserves_every_package() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,VECTOR6D");

        expect_request(stream, Command::Start);
        let mut bytes = frame(Command::Start, &[1]);
        bytes.extend(data_package(RECIPE_ID, 1.0));
        bytes.extend(text_message("protective stop cleared", "ctl", 2));
        bytes.extend(data_package(RECIPE_ID, 2.0));
        bytes.extend(data_package(RECIPE_ID, 3.0));
        stream.write_all(&bytes).expect("write");

        expect_request(stream, Command::Pause);
        let mut bytes = data_package(RECIPE_ID, 4.0);
        bytes.extend(frame(Command::Pause, &[1]));
        stream.write_all(&bytes).expect("write");
    });

    let mut client = client(port);
    client.connect().expect("connect");
    client
        .send_output_setup(&recipe(), 125.0)
        .expect("setup");
    assert_eq!(client.output_recipe().map(|r| r.len()), Some(2));
    client.send_start().expect("start");
    assert_eq!(client.state(), ConnectionState::Started);

    let mut seen = Vec::new();
    while let Some(sample) = client.receive_buffered().expect("receive") {
        seen.push(timestamp(&sample));
    }
    assert_eq!(seen, vec![1.0, 2.0, 3.0]);

    client.send_pause().expect("pause");
    assert_eq!(client.state(), ConnectionState::Paused);
    client.disconnect();
    server.join().expect("server");
}

#[test]
fn test_receive_returns_latest_package() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,VECTOR6D");

        expect_request(stream, Command::Start);
        let mut bytes = frame(Command::Start, &[1]);
        for t in [1.0, 2.0, 3.0] {
            bytes.extend(data_package(RECIPE_ID, t));
        }
        stream.write_all(&bytes).expect("write");

        // Hold the connection open until the client hangs up.
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
    });

    let mut client = client(port);
    client.connect().expect("connect");
    client
        .send_output_setup(&recipe(), 125.0)
        .expect("setup");
    client.send_start().expect("start");
    thread::sleep(Duration::from_millis(100));

    let sample = client.receive().expect("receive").expect("sample");
    assert_eq!(timestamp(&sample), 3.0);
    assert_eq!(client.skipped_packages(), 2);

    // Nothing else is coming: the read timeout yields an absent sample.
    assert!(client.receive().expect("receive").is_none());

    client.disconnect();
    server.join().expect("server");
}

#[test]
fn test_foreign_recipe_id_ignored() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,VECTOR6D");
        expect_request(stream, Command::Start);
        let mut bytes = frame(Command::Start, &[1]);
        bytes.extend(data_package(RECIPE_ID + 1, 9.0));
        bytes.extend(data_package(RECIPE_ID, 1.0));
        stream.write_all(&bytes).expect("write");
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
    });

    let mut client = client(port);
    client.connect().expect("connect");
    client
        .send_output_setup(&recipe(), 125.0)
        .expect("setup");
    client.send_start().expect("start");

    let sample = client.receive_buffered().expect("receive").expect("sample");
    assert_eq!(timestamp(&sample), 1.0);
    assert_eq!(sample.recipe().names(), recipe().names());

    client.disconnect();
    server.join().expect("server");
}

#[test]
fn test_setup_rejected_for_unknown_variable() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,NOT_FOUND");
    });

    let mut client = client(port);
    client.connect().expect("connect");
    let err = client
        .send_output_setup(&recipe(), 125.0)
        .expect_err("rejected");
    match err {
        RtdeError::SetupRejected(reason) => assert!(reason.contains("actual_q")),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(client.output_recipe().is_none());
    server.join().expect("server");
}

#[test]
fn test_setup_rejected_for_type_mismatch() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,VECTOR3D");
    });

    let mut client = client(port);
    client.connect().expect("connect");
    assert!(matches!(
        client.send_output_setup(&recipe(), 125.0),
        Err(RtdeError::SetupRejected(_))
    ));
    server.join().expect("server");
}

#[test]
fn test_start_rejected() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,VECTOR6D");
        expect_request(stream, Command::Start);
        stream
            .write_all(&frame(Command::Start, &[0]))
            .expect("write");
    });

    let mut client = client(port);
    client.connect().expect("connect");
    client
        .send_output_setup(&recipe(), 125.0)
        .expect("setup");
    assert!(matches!(client.send_start(), Err(RtdeError::StartRejected)));
    server.join().expect("server");
}

#[test]
fn test_peer_close_is_connection_lost() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,VECTOR6D");
        expect_request(stream, Command::Start);
        stream
            .write_all(&frame(Command::Start, &[1]))
            .expect("write");
        // Dropping the stream closes the connection.
    });

    let mut client = client(port);
    client.connect().expect("connect");
    client
        .send_output_setup(&recipe(), 125.0)
        .expect("setup");
    client.send_start().expect("start");
    server.join().expect("server");

    let err = client.receive_buffered().expect_err("closed");
    assert!(matches!(err, RtdeError::ConnectionLost));
    assert!(!client.is_connected());
    assert!(matches!(client.receive(), Err(RtdeError::NotConnected)));
}

#[test]
fn test_malformed_data_package_is_fatal() {
    let (port, server) = mock_controller(|stream| {
        accept_handshake(stream);
        accept_setup(stream, "DOUBLE,VECTOR6D");
        expect_request(stream, Command::Start);
        let mut bytes = frame(Command::Start, &[1]);
        bytes.extend(frame(Command::DataPackage, &[RECIPE_ID, 0, 0, 0]));
        stream.write_all(&bytes).expect("write");
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
    });

    let mut client = client(port);
    client.connect().expect("connect");
    client
        .send_output_setup(&recipe(), 125.0)
        .expect("setup");
    client.send_start().expect("start");

    assert!(matches!(
        client.receive_buffered(),
        Err(RtdeError::Malformed {
            command: Command::DataPackage,
            ..
        })
    ));

    client.disconnect();
    server.join().expect("server");
}

#[test]
fn test_samples_share_the_negotiated_recipe() {
    let recipe = Arc::new(recipe());
    let sample = rtde::Sample::from_values(
        Arc::clone(&recipe),
        vec![Value::Double(0.5), Value::Vector6d([0.0; 6])],
    )
    .expect("sample");
    assert!(Arc::ptr_eq(sample.recipe(), &recipe));
}
