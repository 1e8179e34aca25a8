//! Property-based tests using proptest
//!
//! Codec and framing invariants over randomly generated values.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use mcprotocol::core::buffer::{var_int_len, Buffer};
use mcprotocol::core::codec::PacketCodec;
use mcprotocol::core::packet::Packet;
use mcprotocol::error::ProtocolError;
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

// Property: every i32 survives VarInt encoding in at most 5 bytes
proptest! {
    #[test]
    fn prop_var_int_roundtrip(value in any::<i32>()) {
        let mut buf = Buffer::new();
        buf.write_var_int(value);
        prop_assert_eq!(buf.remaining(), var_int_len(value));
        prop_assert!(buf.remaining() <= 5);
        prop_assert_eq!(buf.read_var_int().unwrap(), value);
        prop_assert!(buf.is_empty());
    }
}

// Property: every i64 survives VarLong encoding; negatives always take 10 bytes
proptest! {
    #[test]
    fn prop_var_long_roundtrip(value in any::<i64>()) {
        let mut buf = Buffer::new();
        buf.write_var_long(value);
        prop_assert!(buf.remaining() <= 10);
        if value < 0 {
            prop_assert_eq!(buf.remaining(), 10);
        }
        prop_assert_eq!(buf.read_var_long().unwrap(), value);
    }
}

// Property: strings keep their content and carry their UTF-8 byte length
proptest! {
    #[test]
    fn prop_string_roundtrip(s in ".{0,200}") {
        let mut buf = Buffer::new();
        buf.write_string(&s);

        let mut prefix = Buffer::from_slice(buf.as_slice());
        prop_assert_eq!(prefix.read_var_int().unwrap() as usize, s.len());
        prop_assert_eq!(buf.read_string().unwrap(), s);
    }
}

// Property: any truncation of a written string reads as an underrun, never a panic
proptest! {
    #[test]
    fn prop_truncated_string_underruns(s in "[a-z]{1,64}", cut in 1usize..64) {
        let mut full = Buffer::new();
        full.write_string(&s);
        let bytes = full.as_slice();
        let keep = bytes.len().saturating_sub(cut.min(s.len()));

        let mut truncated = Buffer::from_slice(&bytes[..keep]);
        let is_underrun = matches!(
            truncated.read_string(),
            Err(ProtocolError::Underrun { .. })
        );
        prop_assert!(is_underrun);
    }
}

// Property: frame round-trip for any id and payload
proptest! {
    #[test]
    fn prop_frame_roundtrip(id in any::<u8>(), payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        let packet = Packet::with_payload(id, Buffer::from(payload.clone()));
        let bytes = packet.to_bytes();
        prop_assert_eq!(bytes.len(), packet.frame_len());

        let decoded = Packet::from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded.id, id);
        prop_assert_eq!(decoded.payload.as_slice(), &payload[..]);
    }
}

// Property: a frame with a trailing or missing byte is rejected as a length mismatch
proptest! {
    #[test]
    fn prop_frame_length_mismatch(id in any::<u8>(), payload in prop::collection::vec(any::<u8>(), 1..512)) {
        let mut bytes = Packet::with_payload(id, Buffer::from(payload)).to_bytes();

        let mut longer = bytes.clone();
        longer.push(0);
        let longer_rejected = matches!(
            Packet::from_bytes(&longer),
            Err(ProtocolError::FrameLengthMismatch { .. })
        );
        prop_assert!(longer_rejected);

        bytes.pop();
        let shorter_rejected = matches!(
            Packet::from_bytes(&bytes),
            Err(ProtocolError::FrameLengthMismatch { .. })
        );
        prop_assert!(shorter_rejected);
    }
}

// Property: the stream codec yields the same packets however the bytes are split
proptest! {
    #[test]
    fn prop_codec_any_segmentation(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 1..8),
        chunk in 1usize..64,
    ) {
        let mut codec = PacketCodec::default();
        let mut wire = BytesMut::new();
        for (i, payload) in payloads.iter().enumerate() {
            let packet = Packet::with_payload(i as u8, Buffer::from(payload.clone()));
            codec.encode(packet, &mut wire).unwrap();
        }

        let mut src = BytesMut::new();
        let mut decoded = Vec::new();
        for piece in wire.chunks(chunk) {
            src.extend_from_slice(piece);
            while let Some(packet) = codec.decode(&mut src).unwrap() {
                decoded.push(packet);
            }
        }

        prop_assert!(src.is_empty());
        prop_assert_eq!(decoded.len(), payloads.len());
        for (i, (packet, payload)) in decoded.iter().zip(&payloads).enumerate() {
            prop_assert_eq!(packet.id, i as u8);
            prop_assert_eq!(packet.payload.as_slice(), &payload[..]);
        }
    }
}

// Property: reading arbitrary bytes as a VarInt never panics
proptest! {
    #[test]
    fn prop_var_int_decode_total(bytes in prop::collection::vec(any::<u8>(), 0..12)) {
        let mut buf = Buffer::from_slice(&bytes);
        let _ = buf.read_var_int();
    }
}
