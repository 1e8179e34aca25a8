//! # Wire Primitive Codec
//!
//! A growable byte buffer with an independent read cursor, and the read/write pair
//! for every primitive the protocol puts on the wire.
//!
//! ## Primitives
//! | Type | Encoding |
//! |------|----------|
//! | Byte | 1 raw byte |
//! | VarInt / VarLong | 7 bits per byte, low group first, bit 7 = continuation |
//! | String | VarInt byte length + UTF-8 bytes |
//! | UShort / Short / Int / Long | big-endian, 2 / 2 / 4 / 8 bytes |
//! | Double | big-endian IEEE-754 bit pattern |
//! | Bool | exactly `0x01` or `0x00` |
//! | UUID | 16 raw bytes, RFC-4122 order |
//!
//! Reads never return consumed bytes. A read past the end fails with
//! [`ProtocolError::Underrun`]; an over-long VarInt/VarLong fails with
//! [`ProtocolError::TooBig`]. Writers never fail.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use uuid::Uuid;

use crate::error::{constants, ProtocolError, Result};

/// Low seven bits of a VarInt group
const SEGMENT_BITS: u8 = 0x7F;

/// Set when another group follows
const CONTINUE_BIT: u8 = 0x80;

/// Longest legal VarInt encoding in bytes
pub const MAX_VAR_INT_LEN: usize = 5;

/// Longest legal VarLong encoding in bytes
pub const MAX_VAR_LONG_LEN: usize = 10;

/// Byte buffer with append-only writes and a forward-only read cursor.
#[derive(Clone, Default)]
pub struct Buffer {
    data: BytesMut,
    pos: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            pos: 0,
        }
    }

    /// Wrap already-received bytes for reading.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
            pos: 0,
        }
    }

    /// Number of bytes not yet consumed by a read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread portion of the buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Freeze the unread portion into an immutable byte handle.
    pub fn freeze(mut self) -> Bytes {
        let _ = self.data.split_to(self.pos);
        self.data.freeze()
    }

    fn take(&mut self, needed: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(ProtocolError::Underrun { needed, remaining });
        }
        let start = self.pos;
        self.pos += needed;
        Ok(&self.data[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    // ---- Byte ----

    pub fn write_byte(&mut self, value: u8) {
        self.data.put_u8(value);
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn write_signed_byte(&mut self, value: i8) {
        self.data.put_i8(value);
    }

    pub fn read_signed_byte(&mut self) -> Result<i8> {
        Ok(self.read_byte()? as i8)
    }

    // ---- Raw bytes ----

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.put_slice(bytes);
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    /// VarInt count followed by that many raw bytes.
    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_var_len(bytes.len());
        self.write_bytes(bytes);
    }

    pub fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let len = self.read_length()?;
        self.read_bytes(len)
    }

    // ---- VarInt / VarLong ----

    /// Encode the 32-bit pattern of `value`; negative values take five bytes.
    pub fn write_var_int(&mut self, value: i32) {
        let mut v = value as u32;
        loop {
            if v & !u32::from(SEGMENT_BITS) == 0 {
                self.write_byte(v as u8);
                return;
            }
            self.write_byte((v as u8 & SEGMENT_BITS) | CONTINUE_BIT);
            v >>= 7;
        }
    }

    /// Write a length prefix. Lengths are non-negative and fit in an `i32` by construction.
    pub fn write_var_len(&mut self, len: usize) {
        debug_assert!(len <= i32::MAX as usize, "length prefix {len} exceeds i32::MAX");
        self.write_var_int(len as i32);
    }

    pub fn read_var_int(&mut self) -> Result<i32> {
        let mut value: u32 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            value |= u32::from(byte & SEGMENT_BITS) << shift;
            if byte & CONTINUE_BIT == 0 {
                return Ok(value as i32);
            }
            shift += 7;
            if shift >= 32 {
                return Err(ProtocolError::TooBig(constants::ERR_VAR_INT_TOO_BIG));
            }
        }
    }

    pub fn write_var_long(&mut self, value: i64) {
        let mut v = value as u64;
        loop {
            if v & !u64::from(SEGMENT_BITS) == 0 {
                self.write_byte(v as u8);
                return;
            }
            self.write_byte((v as u8 & SEGMENT_BITS) | CONTINUE_BIT);
            v >>= 7;
        }
    }

    pub fn read_var_long(&mut self) -> Result<i64> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            value |= u64::from(byte & SEGMENT_BITS) << shift;
            if byte & CONTINUE_BIT == 0 {
                return Ok(value as i64);
            }
            shift += 7;
            if shift >= 64 {
                return Err(ProtocolError::TooBig(constants::ERR_VAR_LONG_TOO_BIG));
            }
        }
    }

    fn read_length(&mut self) -> Result<usize> {
        let len = self.read_var_int()?;
        usize::try_from(len).map_err(|_| ProtocolError::InvalidLength(i64::from(len)))
    }

    // ---- String ----

    pub fn write_string(&mut self, value: &str) {
        self.write_var_len(value.len());
        self.write_bytes(value.as_bytes());
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length()?;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8(bytes)?)
    }

    // ---- Fixed-width integers ----

    pub fn write_ushort(&mut self, value: u16) {
        self.data.put_u16(value);
    }

    pub fn read_ushort(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn write_short(&mut self, value: i16) {
        self.data.put_i16(value);
    }

    pub fn read_short(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn write_int(&mut self, value: i32) {
        self.data.put_i32(value);
    }

    pub fn read_int(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn write_long(&mut self, value: i64) {
        self.data.put_i64(value);
    }

    pub fn read_long(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    // ---- Double ----

    pub fn write_double(&mut self, value: f64) {
        self.data.put_u64(value.to_bits());
    }

    pub fn read_double(&mut self) -> Result<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(self.take_array()?)))
    }

    // ---- Bool ----

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(if value { 0x01 } else { 0x00 });
    }

    /// True only for exactly `0x01`; every other byte reads as false.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? == 0x01)
    }

    // ---- UUID ----

    pub fn write_uuid(&mut self, value: &Uuid) {
        self.write_bytes(value.as_bytes());
    }

    pub fn read_uuid(&mut self) -> Result<Uuid> {
        Ok(Uuid::from_bytes(self.take_array()?))
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Buffer {}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("remaining", &self.remaining())
            .field("bytes", &self.as_slice())
            .finish()
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            data: BytesMut::from(&bytes[..]),
            pos: 0,
        }
    }
}

impl From<BytesMut> for Buffer {
    fn from(data: BytesMut) -> Self {
        Self { data, pos: 0 }
    }
}

/// Number of bytes `value` occupies as a VarInt.
pub fn var_int_len(value: i32) -> usize {
    let v = value as u32;
    match v {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// Decode a VarInt from the front of `src` without consuming it.
///
/// Returns `Ok(None)` when `src` ends mid-VarInt, otherwise the value and the
/// number of bytes it occupied.
pub fn peek_var_int(src: &[u8]) -> Result<Option<(i32, usize)>> {
    let mut value: u32 = 0;
    for (i, &byte) in src.iter().take(MAX_VAR_INT_LEN).enumerate() {
        value |= u32::from(byte & SEGMENT_BITS) << (7 * i as u32);
        if byte & CONTINUE_BIT == 0 {
            return Ok(Some((value as i32, i + 1)));
        }
    }
    if src.len() >= MAX_VAR_INT_LEN {
        return Err(ProtocolError::TooBig(constants::ERR_VAR_INT_TOO_BIG));
    }
    Ok(None)
}
