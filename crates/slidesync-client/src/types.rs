//! Settings and event types for the sync clients.

use std::time::Duration;

use slidesync_common::{PageControlFrame, PresentationState};
use slidesync_config::ClientConfig;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Transport settings for one client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// WebSocket URL of the sync server, e.g. `ws://127.0.0.1:3000`.
    pub url: String,
    /// Interval between WebSocket pings while connected.
    pub heartbeat_interval: Duration,
    /// A connect attempt that takes longer than this counts as failed.
    pub connect_timeout: Duration,
}

impl ClientSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_config(&ClientConfig {
            url: url.into(),
            ..ClientConfig::default()
        })
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            url: config.url.clone(),
            heartbeat_interval: config.heartbeat_interval(),
            connect_timeout: config.connect_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by a running client for the application to consume.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The transport is open and the role has been announced.
    Connected { generation: u64 },
    Disconnected,
    /// The local cache changed after a server push. Carries the merged state.
    StateChanged(PresentationState),
    /// A page-control command relayed to this display, payload as the
    /// controller sent it.
    PageControl(PageControlFrame),
    Error(String),
}
