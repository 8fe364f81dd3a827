use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for controller and display clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket URL of the sync server.
    pub url: String,
    /// Ping interval in seconds (valid range: 1-300).
    pub heartbeat_interval_secs: u64,
    /// Give up on a connect attempt after this many seconds (valid range: 1-120).
    pub connect_timeout_secs: u64,
    /// First reconnect delay in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Cap on the reconnect delay in milliseconds.
    pub max_reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3000".into(),
            heartbeat_interval_secs: 25,
            connect_timeout_secs: 10,
            reconnect_delay_ms: 500,
            max_reconnect_delay_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }
}
