use std::net::SocketAddr;
use uuid::Uuid;

use crate::error::Result;
use crate::protocol::play::ClientSettings;
use crate::protocol::state::ProtocolState;

/// Last position reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub feet_y: f64,
    pub head_y: f64,
    pub z: f64,
    pub on_ground: bool,
}

/// Per-connection session state, owned by the session task.
///
/// Handlers mutate it in place; the outbound side of the connection lives in the
/// registry, not here.
#[derive(Debug)]
pub struct Player {
    addr: SocketAddr,
    state: ProtocolState,
    pub uuid: Option<Uuid>,
    pub name: Option<String>,
    /// UUID the client sent with Login Start, if any. Never used as the identity.
    pub asserted_uuid: Option<Uuid>,
    pub position: Position,
    pub settings: Option<ClientSettings>,
    pub logged_in: bool,
    alive: bool,
    status_sent: bool,
}

impl Player {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            state: ProtocolState::Handshake,
            uuid: None,
            name: None,
            asserted_uuid: None,
            position: Position::default(),
            settings: None,
            logged_in: false,
            alive: true,
            status_sent: false,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Apply a state change, rejecting moves the protocol does not define.
    pub fn transition(&mut self, to: ProtocolState) -> Result<()> {
        self.state = self.state.transition(to)?;
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Ask the session loop to flush pending replies and close.
    pub fn disconnect(&mut self) {
        self.alive = false;
    }

    /// Record that a Status Response went out; returns false if one already had.
    pub(crate) fn mark_status_sent(&mut self) -> bool {
        !std::mem::replace(&mut self.status_sent, true)
    }

    /// Assign the login identity.
    pub(crate) fn log_in(&mut self, uuid: Uuid, name: String) {
        self.uuid = Some(uuid);
        self.name = Some(name);
        self.logged_in = true;
    }
}
