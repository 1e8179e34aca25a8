//! One task per connection: read, decode, dispatch, reply.
//!
//! Replies and broadcasts reach the socket through a single writer task fed by a
//! bounded channel, so packets go out in the order they were queued.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use futures::SinkExt;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::codec::PacketCodec;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::protocol::player::Player;
use crate::server::registry::Profile;
use crate::server::ServerContext;
use crate::utils::timeout::with_timeout_error;

/// Transient read errors tolerated in a row before the session gives up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 8;

/// How long teardown waits for queued packets to reach the socket.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

const READ_BUFFER_CAPACITY: usize = 4096;

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Peer closed or reset the connection.
    Disconnected,
    /// A handler asked to close after its replies.
    Kicked,
    /// Server shutdown.
    Shutdown,
    /// Read deadline expired or the connection failed repeatedly.
    Failed(ProtocolError),
    /// Malformed input or an illegal state change.
    Protocol(ProtocolError),
}

/// Drive one connection from accept to teardown.
///
/// The registry entry is added before the first read and removed exactly once
/// here, whatever ends the session.
#[instrument(skip_all, fields(peer = %addr))]
pub async fn run_session(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: Arc<ServerContext>,
    shutdown: CancellationToken,
) {
    let config = &ctx.settings().server;
    let codec = PacketCodec::new(config.max_packet_size);
    let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_queue);

    if !ctx.registry().register(addr, outbound_tx.clone()).await {
        warn!("Address already has a session, dropping new connection");
        return;
    }

    let (reader, writer) = stream.into_split();
    let mut writer_task = tokio::spawn(write_loop(writer, outbound_rx, codec, ctx.clone(), addr));

    let mut player = Player::new(addr);
    let end = read_loop(reader, &mut player, codec, &ctx, &outbound_tx, &shutdown).await;

    match &end {
        SessionEnd::Disconnected => debug!("Peer disconnected"),
        SessionEnd::Kicked => info!("Session closed by server"),
        SessionEnd::Shutdown => debug!("Session closed for shutdown"),
        SessionEnd::Failed(e) => info!(error = %e, "Session ended"),
        SessionEnd::Protocol(e) => {
            ctx.metrics().protocol_error();
            warn!(error = %e, state = %player.state(), "Protocol error, closing session");
        }
    }

    if player.logged_in {
        ctx.registry().release_slot();
    }
    // Both senders must go before the writer sees the end of its queue.
    ctx.registry().remove(&addr).await;
    drop(outbound_tx);

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task)
        .await
        .is_err()
    {
        debug!("Writer did not drain in time, aborting");
        writer_task.abort();
    }

    info!(
        name = player.name.as_deref().unwrap_or("-"),
        state = %player.state(),
        "Connection closed"
    );
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    player: &mut Player,
    mut codec: PacketCodec,
    ctx: &ServerContext,
    outbound: &mpsc::Sender<Packet>,
    shutdown: &CancellationToken,
) -> SessionEnd {
    let read_timeout = ctx.settings().server.read_timeout;
    let mut buf = BytesMut::with_capacity(READ_BUFFER_CAPACITY);
    let mut read_errors = 0u32;

    loop {
        // Drain every complete frame before reading again.
        loop {
            let packet = match codec.decode(&mut buf) {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(e) => return SessionEnd::Protocol(e),
            };
            match handle_packet(player, packet, ctx, outbound).await {
                Ok(()) if !player.is_alive() => return SessionEnd::Kicked,
                Ok(()) => {}
                Err(e) if e.is_disconnect() => return SessionEnd::Disconnected,
                Err(e) => return SessionEnd::Protocol(e),
            }
        }

        let read = tokio::select! {
            _ = shutdown.cancelled() => return SessionEnd::Shutdown,
            read = with_timeout_error(
                async { Ok(reader.read_buf(&mut buf).await?) },
                read_timeout,
            ) => read,
        };

        match read {
            Ok(0) => return SessionEnd::Disconnected,
            Ok(_) => read_errors = 0,
            Err(e) if e.is_disconnect() => return SessionEnd::Disconnected,
            Err(ProtocolError::Timeout) => {
                return SessionEnd::Failed(ProtocolError::Timeout);
            }
            Err(e) => {
                read_errors += 1;
                if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    return SessionEnd::Failed(e);
                }
                warn!(error = %e, attempt = read_errors, "Read failed, retrying");
            }
        }
    }
}

/// Dispatch one packet and queue its replies.
///
/// The session is published as logged in only after Login Success is queued, so a
/// KeepAlive can never overtake it.
async fn handle_packet(
    player: &mut Player,
    mut packet: Packet,
    ctx: &ServerContext,
    outbound: &mpsc::Sender<Packet>,
) -> Result<()> {
    ctx.metrics().packet_received(packet.frame_len() as u64);

    let was_logged_in = player.logged_in;
    let replies = ctx.dispatcher().dispatch(player, &mut packet, ctx)?;

    for reply in replies {
        outbound
            .send(reply)
            .await
            .map_err(|_| ProtocolError::ConnectionClosed)?;
    }

    if player.logged_in && !was_logged_in {
        if let (Some(uuid), Some(name)) = (player.uuid, player.name.clone()) {
            ctx.registry()
                .mark_logged_in(player.addr(), Profile { uuid, name })
                .await;
        }
    }
    Ok(())
}

async fn write_loop(
    writer: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Packet>,
    codec: PacketCodec,
    ctx: Arc<ServerContext>,
    addr: SocketAddr,
) {
    let mut framed = FramedWrite::new(writer, codec);

    while let Some(packet) = outbound.recv().await {
        let len = packet.frame_len() as u64;
        if let Err(e) = framed.send(packet).await {
            debug!(peer = %addr, error = %e, "Write failed, closing writer");
            return;
        }
        ctx.metrics().packet_sent(len);
    }
}
