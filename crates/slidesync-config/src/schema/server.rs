use serde::{Deserialize, Serialize};

/// Sync server listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Close a connection that sends nothing for this long (valid range: 5-3600).
    pub idle_timeout_secs: u64,
    /// Per-connection outbound queue length (valid range: 1-4096).
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            idle_timeout_secs: 60,
            outbound_buffer: 64,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
