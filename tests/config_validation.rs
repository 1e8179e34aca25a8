//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use mcprotocol::config::{ServerSettings, MAX_PACKET_SIZE};
use mcprotocol::error::ProtocolError;
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = ServerSettings::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_defaults_match_vanilla() {
    let config = ServerSettings::default();
    assert_eq!(config.server.address, "0.0.0.0:25565");
    assert_eq!(config.server.read_timeout, Duration::from_secs(30));
    assert_eq!(config.server.keepalive_interval, Duration::from_secs(10));
    assert_eq!(config.server.max_packet_size, MAX_PACKET_SIZE);
    assert_eq!(config.status.version_name, "1.7.10");
    assert_eq!(config.status.protocol_version, 5);
    assert_eq!(config.status.max_players, 20);
    assert_eq!(config.status.motd, "Hello, world!");
}

#[test]
fn test_invalid_server_address() {
    let mut config = ServerSettings::default();
    config.server.address = "invalid_address".to_string();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Invalid server address")));
}

#[test]
fn test_empty_server_address() {
    let mut config = ServerSettings::default();
    config.server.address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_keepalive_must_undercut_read_timeout() {
    let mut config = ServerSettings::default();
    config.server.keepalive_interval = Duration::from_secs(30);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("must be shorter than the read timeout")));
}

#[test]
fn test_packet_size_bounded_by_protocol() {
    let mut config = ServerSettings::default();
    config.server.max_packet_size = MAX_PACKET_SIZE + 1;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("exceeds the protocol limit")));

    config.server.max_packet_size = 16;
    assert!(config.validate().iter().any(|e| e.contains("too small")));
}

#[test]
fn test_max_players_fits_join_game() {
    let mut config = ServerSettings::default();
    config.status.max_players = 256;
    assert!(config.validate().iter().any(|e| e.contains("maximum: 255")));
}

#[test]
fn test_favicon_must_be_data_uri() {
    let mut config = ServerSettings::default();
    config.status.favicon = Some("http://example.com/icon.png".to_string());
    assert!(config.validate().iter().any(|e| e.contains("Favicon")));
}

#[test]
fn test_multiple_errors_reported_together() {
    let mut config = ServerSettings::default();
    config.server.address = String::new();
    config.server.max_connections = 0;
    config.server.outbound_queue = 0;

    assert!(config.validate().len() >= 3);
}

#[test]
fn test_validate_strict_wraps_errors() {
    let mut config = ServerSettings::default();
    config.server.max_connections = 0;

    match config.validate_strict() {
        Err(ProtocolError::ConfigError(msg)) => {
            assert!(msg.contains("Max connections must be greater than 0"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let toml = r#"
        [server]
        address = "127.0.0.1:25570"
        read_timeout = 20000

        [status]
        motd = "A test server"

        [logging]
        log_level = "debug"
    "#;

    let config = ServerSettings::from_toml(toml).unwrap();
    assert_eq!(config.server.address, "127.0.0.1:25570");
    assert_eq!(config.server.read_timeout, Duration::from_secs(20));
    assert_eq!(config.server.keepalive_interval, Duration::from_secs(10));
    assert_eq!(config.status.motd, "A test server");
    assert_eq!(config.status.max_players, 20);
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.validate().is_empty());
}

#[test]
fn test_bad_toml_is_config_error() {
    let result = ServerSettings::from_toml("[server]\naddress = 5");
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_example_config_parses_back() {
    let example = ServerSettings::example_config();
    let parsed = ServerSettings::from_toml(&example).unwrap();
    assert_eq!(parsed.server.address, "0.0.0.0:25565");
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_default_with_overrides() {
    let config = ServerSettings::default_with_overrides(|c| {
        c.status.motd = "override".to_string();
        c.server.max_connections = 10;
    });
    assert_eq!(config.status.motd, "override");
    assert_eq!(config.server.max_connections, 10);
}
