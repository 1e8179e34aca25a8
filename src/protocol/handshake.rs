//! Handshake state: the first packet on every connection.

use tracing::{debug, warn};

use crate::core::buffer::Buffer;
use crate::core::packet::{Packet, PacketId};
use crate::error::Result;
use crate::protocol::ids;
use crate::protocol::message::{Decode, Encode, Message};
use crate::protocol::player::Player;
use crate::protocol::state::ProtocolState;
use crate::protocol::status;
use crate::server::ServerContext;

/// `next_state` value asking for the server list status.
pub const NEXT_STATE_STATUS: i32 = 1;
/// `next_state` value asking to log in.
pub const NEXT_STATE_LOGIN: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: i32,
}

impl Handshake {
    /// State the client asked for, or `None` for a value the protocol does not define.
    pub fn requested_state(&self) -> Option<ProtocolState> {
        match self.next_state {
            NEXT_STATE_STATUS => Some(ProtocolState::Status),
            NEXT_STATE_LOGIN => Some(ProtocolState::Login),
            _ => None,
        }
    }
}

impl Encode for Handshake {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_var_int(self.protocol_version);
        buf.write_string(&self.server_address);
        buf.write_ushort(self.server_port);
        buf.write_var_int(self.next_state);
    }
}

impl Decode for Handshake {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            protocol_version: buf.read_var_int()?,
            server_address: buf.read_string()?,
            server_port: buf.read_ushort()?,
            next_state: buf.read_var_int()?,
        })
    }
}

impl Message for Handshake {
    const ID: PacketId = ids::handshake::serverbound::HANDSHAKE;
}

pub(crate) fn handle_handshake(
    player: &mut Player,
    packet: &mut Packet,
    ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let handshake = Handshake::from_packet(packet)?;
    debug!(
        peer = %player.addr(),
        protocol = handshake.protocol_version,
        address = %handshake.server_address,
        port = handshake.server_port,
        next_state = handshake.next_state,
        "Handshake received"
    );

    match handshake.requested_state() {
        Some(ProtocolState::Status) => {
            player.transition(ProtocolState::Status)?;
            player.mark_status_sent();
            Ok(vec![status::status_response(ctx)?])
        }
        Some(next) => {
            player.transition(next)?;
            Ok(Vec::new())
        }
        None => {
            warn!(
                peer = %player.addr(),
                next_state = handshake.next_state,
                "Unknown next state in handshake, staying in handshake"
            );
            Ok(Vec::new())
        }
    }
}
