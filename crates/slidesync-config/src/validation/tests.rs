//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    let config = SlideSyncConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_port_zero() {
    let mut config = SlideSyncConfig::default();
    config.server.port = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.port"));
}

#[test]
fn catches_idle_timeout_too_short() {
    let mut config = SlideSyncConfig::default();
    config.server.idle_timeout_secs = 1;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.idle_timeout_secs"));
}

#[test]
fn catches_empty_outbound_buffer() {
    let mut config = SlideSyncConfig::default();
    config.server.outbound_buffer = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.outbound_buffer"));
}

#[test]
fn catches_bad_autoplay_entry() {
    let mut config = SlideSyncConfig::default();
    config.presentation.autoplay.push("9-4".into());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("presentation.autoplay"));
    assert!(err.contains("9-4"));
}

#[test]
fn empty_autoplay_is_valid() {
    let mut config = SlideSyncConfig::default();
    config.presentation.autoplay.clear();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_http_client_url() {
    let mut config = SlideSyncConfig::default();
    config.client.url = "http://localhost:3000".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("client.url"));
}

#[test]
fn catches_max_delay_below_base() {
    let mut config = SlideSyncConfig::default();
    config.client.reconnect_delay_ms = 2_000;
    config.client.max_reconnect_delay_ms = 1_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("client.max_reconnect_delay_ms"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = SlideSyncConfig::default();
    config.server.port = 0;
    config.client.heartbeat_interval_secs = 0;
    config.client.connect_timeout_secs = 500;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("server.port"));
    assert!(err.contains("client.heartbeat_interval_secs"));
    assert!(err.contains("client.connect_timeout_secs"));
    assert_eq!(err.matches("; ").count(), 2);
}

#[test]
fn heartbeat_must_outpace_idle_timeout() {
    let mut config = SlideSyncConfig::default();
    config.client.heartbeat_interval_secs = 300;
    config.server.idle_timeout_secs = 60;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("must be below server.idle_timeout_secs = 60"), "{err}");

    config.client.heartbeat_interval_secs = 60;
    assert!(validate(&config).is_err());

    config.client.heartbeat_interval_secs = 59;
    assert!(validate(&config).is_ok());
}
