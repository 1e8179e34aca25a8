//! Packet ids for protocol revision 5, grouped by state and direction.

use crate::core::packet::PacketId;
use crate::protocol::state::ProtocolState;

pub mod handshake {
    pub mod serverbound {
        use crate::core::packet::PacketId;

        pub const HANDSHAKE: PacketId = 0x00;
    }
}

pub mod status {
    pub mod serverbound {
        use crate::core::packet::PacketId;

        pub const REQUEST: PacketId = 0x00;
        pub const PING: PacketId = 0x01;
    }

    pub mod clientbound {
        use crate::core::packet::PacketId;

        pub const RESPONSE: PacketId = 0x00;
        pub const PONG: PacketId = 0x01;
    }
}

pub mod login {
    pub mod serverbound {
        use crate::core::packet::PacketId;

        pub const LOGIN_START: PacketId = 0x00;
        pub const ENCRYPTION_RESPONSE: PacketId = 0x01;
    }

    pub mod clientbound {
        use crate::core::packet::PacketId;

        pub const DISCONNECT: PacketId = 0x00;
        pub const ENCRYPTION_REQUEST: PacketId = 0x01;
        pub const LOGIN_SUCCESS: PacketId = 0x02;
    }
}

pub mod play {
    pub mod serverbound {
        use crate::core::packet::PacketId;

        pub const KEEP_ALIVE: PacketId = 0x00;
        pub const CHAT_MESSAGE: PacketId = 0x01;
        pub const USE_ENTITY: PacketId = 0x02;
        pub const PLAYER: PacketId = 0x03;
        pub const PLAYER_POSITION: PacketId = 0x04;
        pub const PLAYER_LOOK: PacketId = 0x05;
        pub const PLAYER_POSITION_AND_LOOK: PacketId = 0x06;
        pub const PLAYER_DIGGING: PacketId = 0x07;
        pub const PLAYER_BLOCK_PLACEMENT: PacketId = 0x08;
        pub const HELD_ITEM_CHANGE: PacketId = 0x09;
        pub const ANIMATION: PacketId = 0x0A;
        pub const ENTITY_ACTION: PacketId = 0x0B;
        pub const PLAYER_ABILITIES: PacketId = 0x13;
        pub const TAB_COMPLETE: PacketId = 0x14;
        pub const CLIENT_SETTINGS: PacketId = 0x15;
        pub const CLIENT_STATUS: PacketId = 0x16;
        pub const PLUGIN_MESSAGE: PacketId = 0x17;
    }

    pub mod clientbound {
        use crate::core::packet::PacketId;

        pub const KEEP_ALIVE: PacketId = 0x00;
        pub const JOIN_GAME: PacketId = 0x01;
        pub const CHAT_MESSAGE: PacketId = 0x02;
        pub const TIME_UPDATE: PacketId = 0x03;
        pub const SPAWN_POSITION: PacketId = 0x05;
        pub const PLAYER_POSITION_AND_LOOK: PacketId = 0x08;
        pub const PLUGIN_MESSAGE: PacketId = 0x3F;
        pub const DISCONNECT: PacketId = 0x40;
    }
}

/// Human-readable name of a serverbound packet, for logs.
pub fn serverbound_name(state: ProtocolState, id: PacketId) -> &'static str {
    use ProtocolState::*;

    match (state, id) {
        (Handshake, handshake::serverbound::HANDSHAKE) => "Handshake",
        (Status, status::serverbound::REQUEST) => "StatusRequest",
        (Status, status::serverbound::PING) => "Ping",
        (Login, login::serverbound::LOGIN_START) => "LoginStart",
        (Login, login::serverbound::ENCRYPTION_RESPONSE) => "EncryptionResponse",
        (Play, play::serverbound::KEEP_ALIVE) => "KeepAlive",
        (Play, play::serverbound::CHAT_MESSAGE) => "ChatMessage",
        (Play, play::serverbound::USE_ENTITY) => "UseEntity",
        (Play, play::serverbound::PLAYER) => "Player",
        (Play, play::serverbound::PLAYER_POSITION) => "PlayerPosition",
        (Play, play::serverbound::PLAYER_LOOK) => "PlayerLook",
        (Play, play::serverbound::PLAYER_POSITION_AND_LOOK) => "PlayerPositionAndLook",
        (Play, play::serverbound::PLAYER_DIGGING) => "PlayerDigging",
        (Play, play::serverbound::PLAYER_BLOCK_PLACEMENT) => "PlayerBlockPlacement",
        (Play, play::serverbound::HELD_ITEM_CHANGE) => "HeldItemChange",
        (Play, play::serverbound::ANIMATION) => "Animation",
        (Play, play::serverbound::ENTITY_ACTION) => "EntityAction",
        (Play, play::serverbound::PLAYER_ABILITIES) => "PlayerAbilities",
        (Play, play::serverbound::TAB_COMPLETE) => "TabComplete",
        (Play, play::serverbound::CLIENT_SETTINGS) => "ClientSettings",
        (Play, play::serverbound::CLIENT_STATUS) => "ClientStatus",
        (Play, play::serverbound::PLUGIN_MESSAGE) => "PluginMessage",
        _ => "Unknown",
    }
}
