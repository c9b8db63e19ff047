//! Typed configuration tree with TOML load/save and init-time validation.
//!
//! Every knob is a fixed struct field validated in [`EngineConfig::validate`];
//! there are no name-based lookups. Validation failures are fatal at init.

pub mod ocean;
pub mod physics;
pub mod streaming;
pub mod world;

pub use ocean::{OceanConfig, WaveComponentConfig};
pub use physics::PhysicsConfig;
pub use streaming::StreamingConfig;
pub use world::WorldConfig;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub streaming: StreamingConfig,
    pub physics: PhysicsConfig,
    pub ocean: OceanConfig,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;
        self.streaming.validate()?;
        self.physics.validate()?;
        self.ocean.validate()?;
        if self.streaming.keep_radius_chunks < self.streaming.load_radius_chunks {
            return Err(ConfigError::Invalid(format!(
                "keep radius {} is smaller than load radius {}",
                self.streaming.keep_radius_chunks, self.streaming.load_radius_chunks
            )));
        }
        Ok(())
    }
}
