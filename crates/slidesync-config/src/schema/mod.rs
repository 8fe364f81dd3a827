//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work.

mod client;
mod presentation;
mod server;
mod system;

pub use client::*;
pub use presentation::*;
pub use server::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the server binary and clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideSyncConfig {
    pub server: ServerConfig,
    pub presentation: PresentationConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}
