//! Status state: server list ping.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StatusConfig;
use crate::core::buffer::Buffer;
use crate::core::packet::{Packet, PacketId};
use crate::error::Result;
use crate::protocol::ids;
use crate::protocol::message::{Decode, Encode, Message};
use crate::protocol::player::Player;
use crate::server::ServerContext;

/// JSON body of the Status Response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub version: StatusVersion,
    pub players: StatusPlayers,
    pub description: Description,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforces_secure_chat: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPlayers {
    pub max: u32,
    pub online: u32,
    #[serde(default)]
    pub sample: Vec<PlayerSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSample {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub text: String,
}

impl StatusPayload {
    pub fn from_config(config: &StatusConfig, online: u32) -> Self {
        Self {
            version: StatusVersion {
                name: config.version_name.clone(),
                protocol: config.protocol_version,
            },
            players: StatusPlayers {
                max: config.max_players,
                online,
                sample: Vec::new(),
            },
            description: Description {
                text: config.motd.clone(),
            },
            favicon: config.favicon.clone(),
            enforces_secure_chat: config.enforces_secure_chat,
        }
    }
}

/// Serverbound request for the status JSON. Any payload is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRequest;

impl Encode for StatusRequest {
    fn encode(&self, _buf: &mut Buffer) {}
}

impl Decode for StatusRequest {
    fn decode(_buf: &mut Buffer) -> Result<Self> {
        Ok(StatusRequest)
    }
}

impl Message for StatusRequest {
    const ID: PacketId = ids::status::serverbound::REQUEST;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}

impl StatusResponse {
    pub fn from_payload(payload: &StatusPayload) -> Result<Self> {
        Ok(Self {
            json: serde_json::to_string(payload)?,
        })
    }

    pub fn payload(&self) -> Result<StatusPayload> {
        Ok(serde_json::from_str(&self.json)?)
    }
}

impl Encode for StatusResponse {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_string(&self.json);
    }
}

impl Decode for StatusResponse {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            json: buf.read_string()?,
        })
    }
}

impl Message for StatusResponse {
    const ID: PacketId = ids::status::clientbound::RESPONSE;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub payload: i64,
}

impl Encode for Ping {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_long(self.payload);
    }
}

impl Decode for Ping {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            payload: buf.read_long()?,
        })
    }
}

impl Message for Ping {
    const ID: PacketId = ids::status::serverbound::PING;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong {
    pub payload: i64,
}

impl Encode for Pong {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_long(self.payload);
    }
}

impl Decode for Pong {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            payload: buf.read_long()?,
        })
    }
}

impl Message for Pong {
    const ID: PacketId = ids::status::clientbound::PONG;
}

/// Build the Status Response packet with the live online count.
pub(crate) fn status_response(ctx: &ServerContext) -> Result<Packet> {
    let payload = ctx.status_payload();
    Ok(StatusResponse::from_payload(&payload)?.to_packet())
}

pub(crate) fn handle_request(
    player: &mut Player,
    packet: &mut Packet,
    ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    StatusRequest::from_packet(packet)?;
    if !player.mark_status_sent() {
        debug!(peer = %player.addr(), "Status already sent, ignoring request");
        return Ok(Vec::new());
    }
    Ok(vec![status_response(ctx)?])
}

pub(crate) fn handle_ping(
    player: &mut Player,
    packet: &mut Packet,
    _ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let ping = Ping::from_packet(packet)?;
    debug!(peer = %player.addr(), payload = ping.payload, "Ping");
    Ok(vec![Pong {
        payload: ping.payload,
    }
    .to_packet()])
}
