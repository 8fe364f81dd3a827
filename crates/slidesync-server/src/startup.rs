//! Config resolution at process start.

use std::path::Path;

use slidesync_common::ConfigError;
use slidesync_config::{load_config, load_from_path, validation, SlideSyncConfig};

/// Config to run with, and the problem that forced built-in defaults, if
/// any.
#[derive(Debug)]
pub struct StartupConfig {
    pub config: SlideSyncConfig,
    pub fallback: Option<ConfigError>,
}

/// A file named on the command line must exist and validate. Without one,
/// the platform default file is used, and any problem with it falls back
/// to built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<StartupConfig, ConfigError> {
    match explicit {
        Some(path) => {
            let config = load_from_path(path)?;
            validation::validate(&config)?;
            Ok(StartupConfig {
                config,
                fallback: None,
            })
        }
        None => Ok(match load_config() {
            Ok(config) => StartupConfig {
                config,
                fallback: None,
            },
            Err(e) => StartupConfig {
                config: SlideSyncConfig::default(),
                fallback: Some(e),
            },
        }),
    }
}
