//! # Utility Modules
//!
//! Supporting utilities for login cryptography, logging, metrics and deadlines.
//!
//! ## Components
//! - **Crypto**: RSA key pair and session-server hash for the login handshake
//! - **Logging**: `tracing-subscriber` setup from configuration
//! - **Metrics**: Thread-safe observability counters
//! - **Timeout**: Default deadlines and async timeout wrappers

pub mod crypto;
pub mod logging;
pub mod metrics;
pub mod timeout;

pub use crypto::KeyPair;
pub use metrics::{Metrics, MetricsSnapshot};
