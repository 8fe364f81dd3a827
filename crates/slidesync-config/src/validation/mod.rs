//! Full configuration validation.
//!
//! Checks numeric ranges, the client URL scheme, the autoplay ranges and
//! that client heartbeats outpace the server idle timeout. Every problem is
//! collected into a single `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use crate::schema::SlideSyncConfig;
use slidesync_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &SlideSyncConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_presentation(&mut errors, config);
    validate_client(&mut errors, config);
    validate_liveness(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &SlideSyncConfig) {
    let server = &config.server;
    if server.host.trim().is_empty() {
        errors.push("server.host must not be empty".into());
    }
    validate_range(errors, "server.port", u64::from(server.port), 1, 65535);
    validate_range(
        errors,
        "server.idle_timeout_secs",
        server.idle_timeout_secs,
        5,
        3600,
    );
    validate_range(
        errors,
        "server.outbound_buffer",
        server.outbound_buffer as u64,
        1,
        4096,
    );
}

fn validate_presentation(errors: &mut Vec<String>, config: &SlideSyncConfig) {
    if let Err(e) = config.presentation.autoplay_ranges() {
        errors.push(format!("presentation.autoplay: {e}"));
    }
}

fn validate_client(errors: &mut Vec<String>, config: &SlideSyncConfig) {
    let client = &config.client;
    if !(client.url.starts_with("ws://") || client.url.starts_with("wss://")) {
        errors.push(format!(
            "client.url = {:?} must start with ws:// or wss://",
            client.url
        ));
    }
    validate_range(
        errors,
        "client.heartbeat_interval_secs",
        client.heartbeat_interval_secs,
        1,
        300,
    );
    validate_range(
        errors,
        "client.connect_timeout_secs",
        client.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "client.reconnect_delay_ms",
        client.reconnect_delay_ms,
        10,
        60_000,
    );
    validate_range(
        errors,
        "client.max_reconnect_delay_ms",
        client.max_reconnect_delay_ms,
        client.reconnect_delay_ms,
        600_000,
    );
}

/// A client that pings less often than the server's idle timeout gets
/// dropped whenever its user pauses.
fn validate_liveness(errors: &mut Vec<String>, config: &SlideSyncConfig) {
    let heartbeat = config.client.heartbeat_interval_secs;
    let idle = config.server.idle_timeout_secs;
    if heartbeat >= idle {
        errors.push(format!(
            "client.heartbeat_interval_secs = {heartbeat} must be below server.idle_timeout_secs = {idle}"
        ));
    }
}
