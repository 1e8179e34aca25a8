//! # Protocol
//!
//! Connection states, packet ids, typed messages and the handlers that turn an
//! inbound packet into replies and state changes.
//!
//! ## State Flow
//! ```text
//! Handshake --(next_state=1)--> Status
//! Handshake --(next_state=2)--> Login --(Login Start)--> Play
//! ```
//!
//! Packet ids are only meaningful together with the state: `0x00` is Handshake,
//! Status Request, Login Start or KeepAlive depending on where the connection is.

pub mod dispatcher;
pub mod handshake;
pub mod ids;
pub mod login;
pub mod message;
pub mod play;
pub mod player;
pub mod state;
pub mod status;

pub use dispatcher::Dispatcher;
pub use message::{Decode, Encode, Message};
pub use player::{Player, Position};
pub use state::ProtocolState;
