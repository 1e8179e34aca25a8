//! Play state messages and handlers.

use tracing::{debug, trace};

use crate::core::buffer::Buffer;
use crate::core::packet::{Packet, PacketId};
use crate::error::{ProtocolError, Result};
use crate::protocol::ids;
use crate::protocol::message::{Decode, Encode, Message};
use crate::protocol::player::{Player, Position};
use crate::server::ServerContext;

/// Channels whose plugin messages are echoed back to the client.
pub const BRAND_CHANNELS: [&str; 2] = ["MC|Brand", "minecraft:brand"];

/// KeepAlive with an Int correlation id; same layout in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub id: i32,
}

impl Encode for KeepAlive {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_int(self.id);
    }
}

impl Decode for KeepAlive {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            id: buf.read_int()?,
        })
    }
}

impl Message for KeepAlive {
    const ID: PacketId = ids::play::clientbound::KEEP_ALIVE;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGame {
    pub entity_id: i32,
    pub game_mode: u8,
    pub dimension: i8,
    pub difficulty: u8,
    pub max_players: u8,
    pub level_type: String,
}

impl Default for JoinGame {
    fn default() -> Self {
        Self {
            entity_id: 0,
            game_mode: 0,
            dimension: 0,
            difficulty: 0,
            max_players: 20,
            level_type: String::from("default"),
        }
    }
}

impl Encode for JoinGame {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_int(self.entity_id);
        buf.write_byte(self.game_mode);
        buf.write_signed_byte(self.dimension);
        buf.write_byte(self.difficulty);
        buf.write_byte(self.max_players);
        buf.write_string(&self.level_type);
    }
}

impl Decode for JoinGame {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            entity_id: buf.read_int()?,
            game_mode: buf.read_byte()?,
            dimension: buf.read_signed_byte()?,
            difficulty: buf.read_byte()?,
            max_players: buf.read_byte()?,
            level_type: buf.read_string()?,
        })
    }
}

impl Message for JoinGame {
    const ID: PacketId = ids::play::clientbound::JOIN_GAME;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Default for SpawnPosition {
    fn default() -> Self {
        Self { x: 0, y: 64, z: 0 }
    }
}

impl Encode for SpawnPosition {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_int(self.x);
        buf.write_int(self.y);
        buf.write_int(self.z);
    }
}

impl Decode for SpawnPosition {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            x: buf.read_int()?,
            y: buf.read_int()?,
            z: buf.read_int()?,
        })
    }
}

impl Message for SpawnPosition {
    const ID: PacketId = ids::play::clientbound::SPAWN_POSITION;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOnGround {
    pub on_ground: bool,
}

impl Encode for PlayerOnGround {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_bool(self.on_ground);
    }
}

impl Decode for PlayerOnGround {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            on_ground: buf.read_bool()?,
        })
    }
}

impl Message for PlayerOnGround {
    const ID: PacketId = ids::play::serverbound::PLAYER;
}

/// Serverbound position; 1.7 sends both feet and head height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition {
    pub x: f64,
    pub feet_y: f64,
    pub head_y: f64,
    pub z: f64,
    pub on_ground: bool,
}

impl Encode for PlayerPosition {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_double(self.x);
        buf.write_double(self.feet_y);
        buf.write_double(self.head_y);
        buf.write_double(self.z);
        buf.write_bool(self.on_ground);
    }
}

impl Decode for PlayerPosition {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            x: buf.read_double()?,
            feet_y: buf.read_double()?,
            head_y: buf.read_double()?,
            z: buf.read_double()?,
            on_ground: buf.read_bool()?,
        })
    }
}

impl Message for PlayerPosition {
    const ID: PacketId = ids::play::serverbound::PLAYER_POSITION;
}

impl From<PlayerPosition> for Position {
    fn from(p: PlayerPosition) -> Self {
        Position {
            x: p.x,
            feet_y: p.feet_y,
            head_y: p.head_y,
            z: p.z,
            on_ground: p.on_ground,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub locale: String,
    pub view_distance: u8,
    pub chat_flags: u8,
    pub chat_colours: bool,
    pub difficulty: u8,
    pub show_cape: bool,
}

impl Encode for ClientSettings {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_string(&self.locale);
        buf.write_byte(self.view_distance);
        buf.write_byte(self.chat_flags);
        buf.write_bool(self.chat_colours);
        buf.write_byte(self.difficulty);
        buf.write_bool(self.show_cape);
    }
}

impl Decode for ClientSettings {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            locale: buf.read_string()?,
            view_distance: buf.read_byte()?,
            chat_flags: buf.read_byte()?,
            chat_colours: buf.read_bool()?,
            difficulty: buf.read_byte()?,
            show_cape: buf.read_bool()?,
        })
    }
}

impl Message for ClientSettings {
    const ID: PacketId = ids::play::serverbound::CLIENT_SETTINGS;
}

/// Plugin channel message with a Short-prefixed body.
///
/// [`Message::ID`] is the serverbound id; use [`PluginMessage::to_clientbound`] to
/// send one to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessage {
    pub channel: String,
    pub data: Vec<u8>,
}

impl PluginMessage {
    pub fn is_brand(&self) -> bool {
        BRAND_CHANNELS.contains(&self.channel.as_str())
    }

    pub fn to_clientbound(&self) -> Packet {
        let mut packet = Packet::new(ids::play::clientbound::PLUGIN_MESSAGE);
        self.encode(&mut packet.payload);
        packet
    }
}

impl Encode for PluginMessage {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_string(&self.channel);
        debug_assert!(self.data.len() <= i16::MAX as usize);
        buf.write_short(self.data.len() as i16);
        buf.write_bytes(&self.data);
    }
}

impl Decode for PluginMessage {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        let channel = buf.read_string()?;
        let len = buf.read_short()?;
        let len = usize::try_from(len).map_err(|_| ProtocolError::InvalidLength(i64::from(len)))?;
        Ok(Self {
            channel,
            data: buf.read_bytes(len)?,
        })
    }
}

impl Message for PluginMessage {
    const ID: PacketId = ids::play::serverbound::PLUGIN_MESSAGE;
}

pub(crate) fn handle_keep_alive(
    player: &mut Player,
    packet: &mut Packet,
    _ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let keep_alive = KeepAlive::from_packet(packet)?;
    debug!(peer = %player.addr(), id = keep_alive.id, "KeepAlive echoed");
    Ok(Vec::new())
}

pub(crate) fn handle_on_ground(
    player: &mut Player,
    packet: &mut Packet,
    _ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    player.position.on_ground = PlayerOnGround::from_packet(packet)?.on_ground;
    Ok(Vec::new())
}

pub(crate) fn handle_position(
    player: &mut Player,
    packet: &mut Packet,
    _ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let position = PlayerPosition::from_packet(packet)?;
    player.position = position.into();
    trace!(peer = %player.addr(), position = ?player.position, "Position update");
    Ok(Vec::new())
}

pub(crate) fn handle_client_settings(
    player: &mut Player,
    packet: &mut Packet,
    _ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let settings = ClientSettings::from_packet(packet)?;
    debug!(
        peer = %player.addr(),
        locale = %settings.locale,
        view_distance = settings.view_distance,
        "Client settings"
    );
    player.settings = Some(settings);
    Ok(Vec::new())
}

pub(crate) fn handle_plugin_message(
    player: &mut Player,
    packet: &mut Packet,
    _ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let message = PluginMessage::from_packet(packet)?;
    if !message.is_brand() {
        debug!(peer = %player.addr(), channel = %message.channel, "Plugin message ignored");
        return Ok(Vec::new());
    }

    debug!(
        peer = %player.addr(),
        brand = %String::from_utf8_lossy(&message.data),
        "Client brand, echoing"
    );
    Ok(vec![message.to_clientbound()])
}
