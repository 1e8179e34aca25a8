//! # Error Types
//!
//! Error handling for the protocol server.
//!
//! This module defines every error variant that can occur while decoding wire
//! primitives, framing packets, driving the connection state machine or running
//! the listener.
//!
//! ## Error Categories
//! - **Codec Errors**: buffer underruns, oversized VarInts, bad lengths or UTF-8
//! - **Framing Errors**: declared frame length disagreeing with the bytes present
//! - **State Errors**: transitions the state machine does not define
//! - **I/O Errors**: socket failures, closed connections, read deadlines
//! - **Collaborator Errors**: JSON marshaling, RSA operations, configuration
//!
//! Codec, framing and state errors are fatal only to the session that produced them.
//!
//! ## Example Usage
//! ```rust
//! use mcprotocol::core::buffer::Buffer;
//! use mcprotocol::error::{ProtocolError, Result};
//!
//! fn next_state(buf: &mut Buffer) -> Result<i32> {
//!     buf.read_var_int()
//! }
//!
//! let mut empty = Buffer::new();
//! assert!(matches!(next_state(&mut empty), Err(ProtocolError::Underrun { .. })));
//! ```

use std::io;
use thiserror::Error;

use crate::protocol::state::ProtocolState;

/// Static error messages, borrowed instead of allocated on hot error paths.
pub mod constants {
    /// Codec errors
    pub const ERR_VAR_INT_TOO_BIG: &str = "VarInt exceeds 32 bits";
    pub const ERR_VAR_LONG_TOO_BIG: &str = "VarLong exceeds 64 bits";

    /// Collaborator errors
    pub const ERR_KEY_GENERATION: &str = "RSA key generation failed";
    pub const ERR_PUBLIC_KEY_ENCODING: &str = "RSA public key encoding failed";
}

// ProtocolError is the single error type for codec, framing, session and server operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    Underrun { needed: usize, remaining: usize },

    #[error("{0}")]
    TooBig(&'static str),

    #[error("Invalid length prefix: {0}")]
    InvalidLength(i64),

    #[error("String is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Frame length mismatch: declared {declared}, actual {actual}")]
    FrameLengthMismatch { declared: usize, actual: usize },

    #[error("Frame does not contain a packet id")]
    EmptyFrame,

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Illegal state transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: ProtocolState,
        to: ProtocolState,
    },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Whether this error means the peer is gone and the session must be torn down.
    ///
    /// Any other I/O error is treated as transient by the read loop.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::ConnectionClosed => true,
            ProtocolError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
