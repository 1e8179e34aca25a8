use std::collections::HashMap;
use tracing::warn;

use crate::core::packet::{Packet, PacketId};
use crate::error::Result;
use crate::protocol::ids;
use crate::protocol::player::Player;
use crate::protocol::state::ProtocolState;
use crate::protocol::{handshake, login, play, status};
use crate::server::ServerContext;

type HandlerFn =
    dyn Fn(&mut Player, &mut Packet, &ServerContext) -> Result<Vec<Packet>> + Send + Sync + 'static;

/// Routes a packet to its handler by `(state, id)`.
///
/// Built once at startup and read-only afterwards, so lookups take no lock.
pub struct Dispatcher {
    handlers: HashMap<(ProtocolState, PacketId), Box<HandlerFn>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_default_handlers()
    }
}

impl Dispatcher {
    /// A dispatcher with no routes.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Every packet this server understands, wired to its handler.
    pub fn with_default_handlers() -> Self {
        use ProtocolState::*;

        let mut d = Self::new();
        d.register(
            Handshake,
            ids::handshake::serverbound::HANDSHAKE,
            handshake::handle_handshake,
        );
        d.register(Status, ids::status::serverbound::REQUEST, status::handle_request);
        d.register(Status, ids::status::serverbound::PING, status::handle_ping);
        d.register(
            Login,
            ids::login::serverbound::LOGIN_START,
            login::handle_login_start,
        );
        d.register(
            Login,
            ids::login::serverbound::ENCRYPTION_RESPONSE,
            login::handle_encryption_response,
        );
        d.register(Play, ids::play::serverbound::KEEP_ALIVE, play::handle_keep_alive);
        d.register(Play, ids::play::serverbound::PLAYER, play::handle_on_ground);
        d.register(
            Play,
            ids::play::serverbound::PLAYER_POSITION,
            play::handle_position,
        );
        d.register(
            Play,
            ids::play::serverbound::CLIENT_SETTINGS,
            play::handle_client_settings,
        );
        d.register(
            Play,
            ids::play::serverbound::PLUGIN_MESSAGE,
            play::handle_plugin_message,
        );
        d
    }

    /// Add or replace the handler for `id` in `state`.
    pub fn register<F>(&mut self, state: ProtocolState, id: PacketId, handler: F)
    where
        F: Fn(&mut Player, &mut Packet, &ServerContext) -> Result<Vec<Packet>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert((state, id), Box::new(handler));
    }

    pub fn is_registered(&self, state: ProtocolState, id: PacketId) -> bool {
        self.handlers.contains_key(&(state, id))
    }

    /// Run the handler for `packet` in the player's current state.
    ///
    /// Unknown ids are logged, counted and answered with nothing; they never end
    /// the session.
    pub fn dispatch(
        &self,
        player: &mut Player,
        packet: &mut Packet,
        ctx: &ServerContext,
    ) -> Result<Vec<Packet>> {
        let state = player.state();
        match self.handlers.get(&(state, packet.id)) {
            Some(handler) => handler(player, packet, ctx),
            None => {
                warn!(
                    peer = %player.addr(),
                    %state,
                    id = format_args!("{:#04x}", packet.id),
                    name = ids::serverbound_name(state, packet.id),
                    len = packet.payload.remaining(),
                    "Unhandled packet"
                );
                ctx.metrics().unknown_packet();
                Ok(Vec::new())
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.handlers.len())
            .finish()
    }
}
