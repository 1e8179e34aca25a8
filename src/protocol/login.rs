//! Login state: offline-mode login and the encryption handshake messages.
//!
//! The server runs in plaintext. Encryption Request and Response are modelled so a
//! client that sends a Response anyway is decoded cleanly, but no cipher is enabled.

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::buffer::Buffer;
use crate::core::packet::{Packet, PacketId};
use crate::error::Result;
use crate::protocol::ids;
use crate::protocol::message::{Decode, Encode, Message};
use crate::protocol::play::{JoinGame, SpawnPosition};
use crate::protocol::player::Player;
use crate::protocol::state::ProtocolState;
use crate::server::ServerContext;
use crate::utils::crypto::KeyPair;

/// Length of the verify token sent in the Encryption Request.
pub const VERIFY_TOKEN_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub name: String,
    /// Sent by newer clients after the name.
    pub uuid: Option<Uuid>,
}

impl Encode for LoginStart {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_string(&self.name);
        if let Some(uuid) = &self.uuid {
            buf.write_uuid(uuid);
        }
    }
}

impl Decode for LoginStart {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        let name = buf.read_string()?;
        let uuid = if buf.remaining() >= 16 {
            Some(buf.read_uuid()?)
        } else {
            None
        };
        Ok(Self { name, uuid })
    }
}

impl Message for LoginStart {
    const ID: PacketId = ids::login::serverbound::LOGIN_START;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub name: String,
}

impl Encode for LoginSuccess {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_uuid(&self.uuid);
        buf.write_string(&self.name);
        // no profile properties
        buf.write_var_int(0);
        buf.write_bool(false);
    }
}

impl Decode for LoginSuccess {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        let uuid = buf.read_uuid()?;
        let name = buf.read_string()?;
        if !buf.is_empty() {
            buf.read_var_int()?;
        }
        if !buf.is_empty() {
            buf.read_bool()?;
        }
        Ok(Self { uuid, name })
    }
}

impl Message for LoginSuccess {
    const ID: PacketId = ids::login::clientbound::LOGIN_SUCCESS;
}

/// Login-phase disconnect; `reason` is a JSON chat component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDisconnect {
    pub reason: String,
}

impl LoginDisconnect {
    pub fn with_text(text: &str) -> Self {
        Self {
            reason: serde_json::json!({ "text": text }).to_string(),
        }
    }
}

impl Encode for LoginDisconnect {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_string(&self.reason);
    }
}

impl Decode for LoginDisconnect {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            reason: buf.read_string()?,
        })
    }
}

impl Message for LoginDisconnect {
    const ID: PacketId = ids::login::clientbound::DISCONNECT;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionRequest {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
    pub should_authenticate: bool,
}

impl EncryptionRequest {
    /// Request built from the server key with a fresh random verify token.
    pub fn new(keys: &KeyPair) -> Self {
        let token: [u8; VERIFY_TOKEN_LEN] = rand::random();
        Self {
            server_id: String::new(),
            public_key: keys.public_key_der().to_vec(),
            verify_token: token.to_vec(),
            should_authenticate: false,
        }
    }
}

impl Encode for EncryptionRequest {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_string(&self.server_id);
        buf.write_byte_array(&self.public_key);
        buf.write_byte_array(&self.verify_token);
        buf.write_bool(self.should_authenticate);
    }
}

impl Decode for EncryptionRequest {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        let server_id = buf.read_string()?;
        let public_key = buf.read_byte_array()?;
        let verify_token = buf.read_byte_array()?;
        let should_authenticate = if buf.is_empty() {
            false
        } else {
            buf.read_bool()?
        };
        Ok(Self {
            server_id,
            public_key,
            verify_token,
            should_authenticate,
        })
    }
}

impl Message for EncryptionRequest {
    const ID: PacketId = ids::login::clientbound::ENCRYPTION_REQUEST;
}

/// Shared secret and verify token, both RSA-encrypted with the server key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl EncryptionResponse {
    /// Decrypt both fields with the server key, returning `(secret, token)`.
    pub fn decrypt(&self, keys: &KeyPair) -> Result<(Vec<u8>, Vec<u8>)> {
        Ok((
            keys.decrypt(&self.shared_secret)?,
            keys.decrypt(&self.verify_token)?,
        ))
    }
}

impl Encode for EncryptionResponse {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_byte_array(&self.shared_secret);
        buf.write_byte_array(&self.verify_token);
    }
}

impl Decode for EncryptionResponse {
    fn decode(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            shared_secret: buf.read_byte_array()?,
            verify_token: buf.read_byte_array()?,
        })
    }
}

impl Message for EncryptionResponse {
    const ID: PacketId = ids::login::serverbound::ENCRYPTION_RESPONSE;
}

pub(crate) fn handle_login_start(
    player: &mut Player,
    packet: &mut Packet,
    ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let start = LoginStart::from_packet(packet)?;

    let status = &ctx.settings().status;
    // the slot is released by session teardown once `logged_in` is set
    if !ctx.registry().try_reserve_slot(status.max_players as usize) {
        info!(peer = %player.addr(), name = %start.name, "Server full, refusing login");
        player.disconnect();
        return Ok(vec![LoginDisconnect::with_text("Server is full").to_packet()]);
    }

    let uuid = Uuid::new_v4();
    info!(peer = %player.addr(), name = %start.name, %uuid, "Player logged in");

    player.asserted_uuid = start.uuid;
    player.log_in(uuid, start.name.clone());
    player.transition(ProtocolState::Play)?;
    ctx.metrics().login();

    let join = JoinGame {
        max_players: u8::try_from(status.max_players).unwrap_or(u8::MAX),
        ..JoinGame::default()
    };

    Ok(vec![
        LoginSuccess {
            uuid,
            name: start.name,
        }
        .to_packet(),
        join.to_packet(),
        SpawnPosition::default().to_packet(),
    ])
}

/// Decrypts a stray Encryption Response with the server key and logs the result.
///
/// No Encryption Request is ever sent, so there is no token to match and no
/// cipher to enable; the session stays in Login either way.
pub(crate) fn handle_encryption_response(
    player: &mut Player,
    packet: &mut Packet,
    ctx: &ServerContext,
) -> Result<Vec<Packet>> {
    let response = EncryptionResponse::from_packet(packet)?;
    let outcome = ctx.keypair().and_then(|keys| response.decrypt(keys));
    match outcome {
        Ok((secret, token)) => warn!(
            peer = %player.addr(),
            secret_len = secret.len(),
            token_len = token.len(),
            "Encryption response decrypted but encryption is disabled, ignoring"
        ),
        Err(e) => warn!(
            peer = %player.addr(),
            error = %e,
            "Encryption response could not be decrypted, ignoring"
        ),
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_start_without_uuid() {
        let mut packet = LoginStart {
            name: "Alice".to_string(),
            uuid: None,
        }
        .to_packet();
        let decoded = LoginStart::from_packet(&mut packet).unwrap();
        assert_eq!(decoded.name, "Alice");
        assert_eq!(decoded.uuid, None);
    }

    #[test]
    fn login_start_with_trailing_uuid() {
        let uuid = Uuid::new_v4();
        let mut packet = LoginStart {
            name: "Bob".to_string(),
            uuid: Some(uuid),
        }
        .to_packet();
        assert_eq!(LoginStart::from_packet(&mut packet).unwrap().uuid, Some(uuid));
    }

    #[test]
    fn login_success_layout() {
        let uuid = Uuid::parse_str("89ce1791-dab0-4b2a-97d9-ee72a0cdc1fd").unwrap();
        let packet = LoginSuccess {
            uuid,
            name: "Alice".to_string(),
        }
        .to_packet();

        assert_eq!(packet.id, 0x02);
        let bytes = packet.payload.as_slice();
        assert_eq!(&bytes[..16], uuid.as_bytes());
        assert_eq!(bytes[16], 5);
        assert_eq!(&bytes[17..22], b"Alice");
        assert_eq!(&bytes[22..], &[0x00, 0x00]);
    }

    #[test]
    fn encryption_request_carries_der_key() {
        let keys = KeyPair::generate_with_bits(512).unwrap();
        let request = EncryptionRequest::new(&keys);
        assert_eq!(request.server_id, "");
        assert_eq!(request.verify_token.len(), VERIFY_TOKEN_LEN);

        let mut packet = request.to_packet();
        assert_eq!(packet.id, 0x01);
        let decoded = EncryptionRequest::from_packet(&mut packet).unwrap();
        assert_eq!(decoded.public_key, keys.public_key_der());
    }

    #[test]
    fn encryption_response_decrypts_with_server_key() {
        let keys = KeyPair::generate_with_bits(512).unwrap();
        let secret = [9u8; 16];
        let token = [1u8, 2, 3, 4];
        let response = EncryptionResponse {
            shared_secret: keys.encrypt(&secret).unwrap(),
            verify_token: keys.encrypt(&token).unwrap(),
        };

        let mut packet = response.to_packet();
        let decoded = EncryptionResponse::from_packet(&mut packet).unwrap();
        let (s, t) = decoded.decrypt(&keys).unwrap();
        assert_eq!(s, secret);
        assert_eq!(t, token);
    }

    #[test]
    fn disconnect_reason_is_chat_json() {
        let reason = LoginDisconnect::with_text("Server is full").reason;
        assert_eq!(reason, r#"{"text":"Server is full"}"#);
    }
}
