//! # Core Protocol Components
//!
//! Wire primitives, packet framing, and the stream codec.
//!
//! ## Components
//! - **Buffer**: read/write for every wire primitive (VarInt, String, UUID, ...)
//! - **Packet**: `{id, payload}` with frame/unframe
//! - **Codec**: Tokio codec for framing over byte streams
//!
//! ## Wire Format
//! ```text
//! [VarInt length] [PacketId(1)] [Payload(length - 1)]
//! ```
//!
//! ## Limits
//! - Maximum frame length: 2 097 151 bytes (largest 3-byte VarInt)
//! - Length validated before the frame is buffered

pub mod buffer;
pub mod codec;
pub mod packet;
