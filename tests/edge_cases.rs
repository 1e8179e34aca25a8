//! Malformed input, odd segmentation and deadlines against a live server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::time::Duration;

use common::TestServer;
use mcprotocol::core::buffer::Buffer;
use mcprotocol::core::packet::Packet;
use mcprotocol::protocol::handshake::Handshake;
use mcprotocol::protocol::message::Message;
use mcprotocol::protocol::play::PluginMessage;
use mcprotocol::protocol::status::{Ping, Pong, StatusResponse};

#[tokio::test]
async fn malformed_client_drops_only_itself() {
    let server = TestServer::start().await;

    let mut good = server.connect().await;
    good.login("Good").await;
    server.wait_for_online(1).await;

    let mut bad = server.connect().await;
    // handshake whose string length runs past the frame
    let mut packet = Packet::new(0x00);
    packet.payload.write_var_int(5);
    packet.payload.write_var_int(100);
    packet.payload.write_bytes(b"short");
    bad.send_packet(packet).await;
    assert!(bad.is_closed_by_server().await);

    server.wait_for_online(1).await;
    let mut fresh = server.connect().await;
    fresh.handshake(1).await;
    let response: StatusResponse = fresh.recv_as(0x00).await;
    assert_eq!(response.payload().unwrap().players.online, 1);

    assert!(server.ctx.metrics().snapshot().protocol_errors >= 1);
    server.shutdown().await;
}

#[tokio::test]
async fn zero_length_frame_closes_session() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    client.send_raw(&[0x00]).await;
    assert!(client.is_closed_by_server().await);
    server.wait_for_empty_registry().await;

    server.shutdown().await;
}

#[tokio::test]
async fn oversized_frame_is_rejected_before_buffering() {
    let server = TestServer::start_with(|s| s.server.max_packet_size = 1024).await;
    let mut client = server.connect().await;

    let mut prefix = Buffer::new();
    prefix.write_var_int(4096);
    client.send_raw(prefix.as_slice()).await;
    assert!(client.is_closed_by_server().await);

    server.shutdown().await;
}

#[tokio::test]
async fn frames_split_byte_by_byte_are_reassembled() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let mut bytes = Handshake {
        protocol_version: 5,
        server_address: "localhost".to_string(),
        server_port: 25565,
        next_state: 1,
    }
    .to_packet()
    .to_bytes();
    bytes.extend(Ping { payload: -9 }.to_packet().to_bytes());

    for byte in bytes {
        client.send_raw(&[byte]).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(client.recv().await.id, 0x00);
    let pong: Pong = client.recv_as(0x01).await;
    assert_eq!(pong.payload, -9);

    server.shutdown().await;
}

#[tokio::test]
async fn coalesced_frames_are_handled_in_order() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let mut bytes = Handshake {
        protocol_version: 5,
        server_address: "localhost".to_string(),
        server_port: 25565,
        next_state: 1,
    }
    .to_packet()
    .to_bytes();
    for payload in [1i64, 2, 3] {
        bytes.extend(Ping { payload }.to_packet().to_bytes());
    }
    client.send_raw(&bytes).await;

    assert_eq!(client.recv().await.id, 0x00);
    for expected in [1i64, 2, 3] {
        let pong: Pong = client.recv_as(0x01).await;
        assert_eq!(pong.payload, expected);
    }

    server.shutdown().await;
}

#[tokio::test]
async fn unknown_packets_do_not_disconnect() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.login("Curious").await;

    let mut unknown = Packet::new(0x6E);
    unknown.payload.write_int(1);
    client.send_packet(unknown).await;

    // the brand echo proves the session is still reading
    let brand = PluginMessage {
        channel: "minecraft:brand".to_string(),
        data: b"test".to_vec(),
    };
    client.send(&brand).await;
    let echoed: PluginMessage = client.recv_as(0x3F).await;
    assert_eq!(echoed, brand);

    // still served: an unknown next_state is ignored too
    let mut status = server.connect().await;
    status.handshake(9).await;
    status.handshake(1).await;
    assert_eq!(status.recv().await.id, 0x00);

    assert_eq!(server.ctx.online_count(), 1);
    assert!(server.ctx.metrics().snapshot().unknown_packets >= 1);
    server.shutdown().await;
}

#[tokio::test]
async fn silent_client_hits_read_deadline() {
    let server = TestServer::start_with(|s| {
        s.server.read_timeout = Duration::from_millis(300);
        s.server.keepalive_interval = Duration::from_millis(100);
    })
    .await;

    let mut client = server.connect().await;
    assert!(client.is_closed_by_server().await);
    server.wait_for_empty_registry().await;

    server.shutdown().await;
}
