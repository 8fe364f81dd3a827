//! slidesync configuration.
//!
//! TOML-based configuration for the sync server and its clients. Every
//! section uses serde defaults, so a partial file (or none at all) works.
//!
//! ```rust,no_run
//! use slidesync_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("listening on {}", config.server.bind_addr());
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ClientConfig, LogLevel, LoggingConfig, PresentationConfig, ServerConfig, SlideRange,
    SlideSyncConfig,
};
pub use toml_loader::{load_default, load_from_path};

use slidesync_common::ConfigError;

/// Load config from the platform default path, creating it if missing,
/// and validate the result.
pub fn load_config() -> Result<SlideSyncConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}
