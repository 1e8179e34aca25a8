//! # mcprotocol
//!
//! Server side of the Minecraft Java Edition protocol, revision 5 (1.7.10).
//!
//! Accepts TCP connections, answers server-list pings, logs players in without
//! authentication and keeps them alive in the Play state.
//!
//! ## Layers
//! - [`core`]: wire primitives, packet framing and the stream codec
//! - [`protocol`]: connection states, typed messages and per-state handlers
//! - [`server`]: listener, session tasks, registry and KeepAlive broadcast
//! - [`utils`]: login cryptography, logging, metrics and deadlines
//!
//! ## Example
//! ```no_run
//! use mcprotocol::config::ServerSettings;
//! use mcprotocol::server::Server;
//!
//! # async fn run() -> mcprotocol::error::Result<()> {
//! let settings = ServerSettings::from_env()?;
//! settings.validate_strict()?;
//! Server::new(settings).start().await
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod server;
pub mod utils;

pub use crate::core::buffer::Buffer;
pub use crate::core::codec::PacketCodec;
pub use crate::core::packet::{Packet, PacketId};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::state::ProtocolState;
pub use crate::server::{Server, ServerContext};
