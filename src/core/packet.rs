//! Packet framing.
//!
//! ```text
//! [VarInt length] [id(1)] [payload(length - 1)]
//! ```
//!
//! The length counts the id byte plus the payload, never itself.

use bytes::{BufMut, BytesMut};

use crate::core::buffer::{var_int_len, Buffer};
use crate::error::{ProtocolError, Result};

/// Packet type identifier, scoped to a protocol state and direction.
pub type PacketId = u8;

/// One protocol packet: an id and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: PacketId,
    pub payload: Buffer,
}

impl Packet {
    /// An outbound packet with an empty payload, ready to be written into.
    pub fn new(id: PacketId) -> Self {
        Self {
            id,
            payload: Buffer::new(),
        }
    }

    pub fn with_payload(id: PacketId, payload: Buffer) -> Self {
        Self { id, payload }
    }

    /// Length of the inner sequence (`id || payload`) that the frame prefix declares.
    pub fn body_len(&self) -> usize {
        1 + self.payload.remaining()
    }

    /// Total bytes this packet occupies on the wire.
    pub fn frame_len(&self) -> usize {
        let body = self.body_len();
        var_int_len(body as i32) + body
    }

    /// Append the framed packet to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        let mut prefix = Buffer::with_capacity(5);
        prefix.write_var_len(self.body_len());

        dst.reserve(self.frame_len());
        dst.put_slice(prefix.as_slice());
        dst.put_u8(self.id);
        dst.put_slice(self.payload.as_slice());
    }

    /// Frame the packet into a fresh byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = BytesMut::with_capacity(self.frame_len());
        self.encode_into(&mut out);
        out.to_vec()
    }

    /// Unframe exactly one packet from `bytes`.
    ///
    /// The declared length must equal the id byte plus every payload byte present.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = Buffer::from_slice(bytes);
        let declared = buf.read_var_int()?;
        let declared =
            usize::try_from(declared).map_err(|_| ProtocolError::InvalidLength(i64::from(declared)))?;

        let actual = buf.remaining();
        if actual == 0 {
            return Err(ProtocolError::EmptyFrame);
        }
        if declared != actual {
            return Err(ProtocolError::FrameLengthMismatch { declared, actual });
        }

        let id = buf.read_byte()?;
        Ok(Self { id, payload: buf })
    }
}
