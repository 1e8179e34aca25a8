//! Shared helpers for integration tests: a server on an ephemeral port and a
//! minimal framed client.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use mcprotocol::config::ServerSettings;
use mcprotocol::core::codec::PacketCodec;
use mcprotocol::core::packet::Packet;
use mcprotocol::protocol::handshake::Handshake;
use mcprotocol::protocol::login::{LoginStart, LoginSuccess};
use mcprotocol::protocol::message::Message;
use mcprotocol::server::{Server, ServerContext};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use uuid::Uuid;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("mcprotocol=debug")
        .try_init();
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub ctx: Arc<ServerContext>,
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<mcprotocol::Result<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with the keepalive timer pushed out of the way; tests broadcast by hand.
    pub async fn start_with<F: FnOnce(&mut ServerSettings)>(mutator: F) -> Self {
        init_tracing();
        let settings = ServerSettings::default_with_overrides(|s| {
            s.server.address = "127.0.0.1:0".to_string();
            s.server.read_timeout = Duration::from_secs(120);
            s.server.keepalive_interval = Duration::from_secs(60);
            s.server.shutdown_timeout = Duration::from_secs(2);
            mutator(s);
        });

        let listener = TcpListener::bind(&settings.server.address).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::new(settings);
        let ctx = server.context();
        let (shutdown, rx) = mpsc::channel(1);
        let handle = tokio::spawn(server.serve(listener, rx));

        Self {
            addr,
            ctx,
            shutdown,
            handle,
        }
    }

    pub async fn connect(&self) -> TestClient {
        TestClient::connect(self.addr).await
    }

    /// Wait until the registry holds `n` logged-in sessions.
    pub async fn wait_for_online(&self, n: usize) {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while self.ctx.online_count() != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("online count never reached target");
    }

    /// Wait until no session is registered.
    pub async fn wait_for_empty_registry(&self) {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while !self.ctx.registry().is_empty().await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("registry never emptied");
    }

    pub async fn shutdown(self) {
        self.shutdown.send(()).await.unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

pub struct TestClient {
    framed: Framed<TcpStream, PacketCodec>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            framed: Framed::new(stream, PacketCodec::default()),
        }
    }

    pub async fn send<M: Message>(&mut self, message: &M) {
        self.send_packet(message.to_packet()).await;
    }

    pub async fn send_packet(&mut self, packet: Packet) {
        self.framed.send(packet).await.unwrap();
    }

    /// Write bytes straight to the socket, bypassing framing.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await.unwrap();
        stream.flush().await.unwrap();
    }

    pub async fn recv(&mut self) -> Packet {
        tokio::time::timeout(RECV_TIMEOUT, self.framed.next())
            .await
            .expect("timed out waiting for a packet")
            .expect("connection closed")
            .expect("undecodable packet")
    }

    pub async fn recv_as<M: Message>(&mut self, id: u8) -> M {
        let mut packet = self.recv().await;
        assert_eq!(packet.id, id, "unexpected packet id");
        M::from_packet(&mut packet).unwrap()
    }

    /// True if the server closes the connection before `RECV_TIMEOUT`.
    pub async fn is_closed_by_server(&mut self) -> bool {
        loop {
            match tokio::time::timeout(RECV_TIMEOUT, self.framed.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    pub async fn handshake(&mut self, next_state: i32) {
        self.send(&Handshake {
            protocol_version: 5,
            server_address: "localhost".to_string(),
            server_port: 25565,
            next_state,
        })
        .await;
    }

    /// Log in and consume Login Success, Join Game and Spawn Position.
    pub async fn login(&mut self, name: &str) -> Uuid {
        self.handshake(2).await;
        self.send(&LoginStart {
            name: name.to_string(),
            uuid: None,
        })
        .await;

        let success: LoginSuccess = self.recv_as(0x02).await;
        assert_eq!(success.name, name);
        assert_eq!(self.recv().await.id, 0x01);
        assert_eq!(self.recv().await.id, 0x05);
        success.uuid
    }
}
