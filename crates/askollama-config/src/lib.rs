use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::host::HostConfig;
use self::log::LogConfig;
use self::overlay::OverlayConfig;

pub mod host;
pub mod log;
pub mod overlay;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: HostConfig,
    pub overlay: OverlayConfig,
    pub log: LogConfig,
}

impl Config {
    /// Build a config from environment variables, falling back to defaults
    pub fn new() -> Self {
        Config {
            host: HostConfig::new(),
            overlay: OverlayConfig::default(),
            log: LogConfig::new(),
        }
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }
}
