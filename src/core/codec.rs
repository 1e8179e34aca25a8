//! Length-prefixed stream codec for `tokio_util` framed readers and writers.
//!
//! The frame length is checked against the configured limit as soon as its
//! VarInt prefix is readable, before any payload is buffered.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::MAX_PACKET_SIZE;
use crate::core::buffer::{peek_var_int, Buffer};
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};

/// Stream codec turning a byte stream into [`Packet`]s and back.
///
/// Frames split across reads are buffered until complete; several frames in one
/// read are yielded one at a time.
#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_frame_len: usize,
}

impl PacketCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(MAX_PACKET_SIZE)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        let (declared, prefix_len) = match peek_var_int(src)? {
            Some(prefix) => prefix,
            None => return Ok(None),
        };

        let declared = usize::try_from(declared)
            .map_err(|_| ProtocolError::InvalidLength(i64::from(declared)))?;
        if declared == 0 {
            return Err(ProtocolError::EmptyFrame);
        }
        if declared > self.max_frame_len {
            return Err(ProtocolError::OversizedPacket(declared));
        }

        let total = prefix_len + declared;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(prefix_len);
        let mut body = src.split_to(declared);
        let id = body[0];
        body.advance(1);

        Ok(Some(Packet::with_payload(id, Buffer::from(body))))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        let body_len = item.body_len();
        if body_len > self.max_frame_len {
            return Err(ProtocolError::OversizedPacket(body_len));
        }
        item.encode_into(dst);
        Ok(())
    }
}
