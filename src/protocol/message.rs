use crate::core::buffer::Buffer;
use crate::core::packet::{Packet, PacketId};
use crate::error::Result;

/// Writes a message body into a packet payload.
pub trait Encode {
    fn encode(&self, buf: &mut Buffer);
}

/// Reads a message body from a packet payload, field by field in wire order.
pub trait Decode: Sized {
    fn decode(buf: &mut Buffer) -> Result<Self>;
}

/// A message bound to one packet id in its state and direction.
pub trait Message: Encode + Decode {
    const ID: PacketId;

    fn to_packet(&self) -> Packet {
        let mut packet = Packet::new(Self::ID);
        self.encode(&mut packet.payload);
        packet
    }

    /// Decode from the packet's unread payload. The id is not checked; routing
    /// already selected this message type.
    fn from_packet(packet: &mut Packet) -> Result<Self> {
        Self::decode(&mut packet.payload)
    }
}
