//! # Configuration Management
//!
//! Centralized configuration for the protocol server.
//!
//! This module provides structured configuration for the listener, the status
//! (server list) template, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`MCPROTOCOL_*`)
//!
//! ## Operational Considerations
//! - Every read carries a deadline (`read_timeout`) so silent peers cannot hold a task forever
//! - The keepalive interval must stay well below the read timeout or idle players get dropped

use crate::error::{ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Protocol revision spoken by this server (game version 1.7.10)
pub const PROTOCOL_VERSION: i32 = 5;

/// Game version advertised in the status response
pub const GAME_VERSION: &str = "1.7.10";

/// Largest frame body (id + payload) accepted: the biggest 3-byte VarInt
pub const MAX_PACKET_SIZE: usize = 2_097_151;

/// Default listen port
pub const DEFAULT_PORT: u16 = 25565;

/// Top-level server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerSettings {
    /// Listener and session configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Status response template
    #[serde(default)]
    pub status: StatusConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerSettings {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `MCPROTOCOL_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("MCPROTOCOL_ADDRESS") {
            self.server.address = addr;
        }

        if let Some(val) = env_parse::<usize>("MCPROTOCOL_MAX_CONNECTIONS") {
            self.server.max_connections = val;
        }

        if let Some(val) = env_parse::<u64>("MCPROTOCOL_READ_TIMEOUT_MS") {
            self.server.read_timeout = Duration::from_millis(val);
        }

        if let Some(val) = env_parse::<u64>("MCPROTOCOL_KEEPALIVE_INTERVAL_MS") {
            self.server.keepalive_interval = Duration::from_millis(val);
        }

        if let Ok(motd) = std::env::var("MCPROTOCOL_MOTD") {
            self.status.motd = motd;
        }

        if let Some(val) = env_parse::<u32>("MCPROTOCOL_MAX_PLAYERS") {
            self.status.max_players = val;
        }

        if let Some(level) = env_parse::<Level>("MCPROTOCOL_LOG_LEVEL") {
            self.logging.log_level = level;
        }
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.status.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Listener and session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:25565")
    pub address: String,

    /// Maximum number of concurrent sessions
    pub max_connections: usize,

    /// Deadline for each socket read; a silent peer is dropped after this
    #[serde(with = "duration_serde")]
    pub read_timeout: Duration,

    /// Interval between KeepAlive broadcasts to logged-in players
    #[serde(with = "duration_serde")]
    pub keepalive_interval: Duration,

    /// Timeout for graceful server shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,

    /// Largest frame body accepted from a client
    pub max_packet_size: usize,

    /// Outbound packets queued per session before senders wait
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: format!("0.0.0.0:{DEFAULT_PORT}"),
            max_connections: 1000,
            read_timeout: timeout::READ_TIMEOUT,
            keepalive_interval: timeout::KEEPALIVE_INTERVAL,
            shutdown_timeout: timeout::SHUTDOWN_TIMEOUT,
            max_packet_size: MAX_PACKET_SIZE,
            outbound_queue: 64,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:25565')",
                self.address
            ));
        }

        if self.max_connections == 0 {
            errors.push("Max connections must be greater than 0".to_string());
        }

        if self.read_timeout.as_millis() < 100 {
            errors.push("Read timeout too short (minimum: 100ms)".to_string());
        }

        if self.keepalive_interval.as_millis() < 100 {
            errors.push("Keepalive interval too short (minimum: 100ms)".to_string());
        } else if self.keepalive_interval >= self.read_timeout {
            errors.push(format!(
                "Keepalive interval ({}ms) must be shorter than the read timeout ({}ms)",
                self.keepalive_interval.as_millis(),
                self.read_timeout.as_millis()
            ));
        }

        if self.shutdown_timeout.as_secs() < 1 {
            errors.push("Shutdown timeout too short (minimum: 1s)".to_string());
        } else if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        if self.max_packet_size < 256 {
            errors.push("Max packet size too small (minimum: 256 bytes)".to_string());
        } else if self.max_packet_size > MAX_PACKET_SIZE {
            errors.push(format!(
                "Max packet size {} exceeds the protocol limit of {MAX_PACKET_SIZE}",
                self.max_packet_size
            ));
        }

        if self.outbound_queue == 0 {
            errors.push("Outbound queue must hold at least one packet".to_string());
        }

        errors
    }
}

/// Template for the server-list status response
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Version name shown to clients
    pub version_name: String,

    /// Protocol number advertised
    pub protocol_version: i32,

    /// Player slots advertised and sent in Join Game
    pub max_players: u32,

    /// Message of the day
    pub motd: String,

    /// Optional `data:image/png;base64,...` icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforces_secure_chat: Option<bool>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            version_name: GAME_VERSION.to_string(),
            protocol_version: PROTOCOL_VERSION,
            max_players: 20,
            motd: String::from("Hello, world!"),
            favicon: None,
            enforces_secure_chat: None,
        }
    }
}

impl StatusConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.version_name.is_empty() {
            errors.push("Status version name cannot be empty".to_string());
        }

        if self.max_players > u32::from(u8::MAX) {
            errors.push(format!(
                "Max players {} does not fit the Join Game field (maximum: 255)",
                self.max_players
            ));
        }

        if let Some(icon) = &self.favicon {
            if !icon.starts_with("data:image/png;base64,") {
                errors.push("Favicon must be a data:image/png;base64 URI".to_string());
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("mcprotocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
