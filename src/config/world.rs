use super::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub name: String,
    pub seed: u64,
    /// Horizontal chunk dimension. The storage and meshing paths are built
    /// for 16 and nothing else.
    pub chunk_size: u32,
    pub chunk_height: u32,
    pub sea_level: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_string(),
            seed: 0,
            chunk_size: 16,
            chunk_height: 256,
            sea_level: 64,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size != 16 {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be 16, got {}",
                self.chunk_size
            )));
        }
        if self.chunk_height != 256 {
            return Err(ConfigError::Invalid(format!(
                "chunk_height must be 256, got {}",
                self.chunk_height
            )));
        }
        if self.sea_level < 1 || self.sea_level >= self.chunk_height as i32 {
            return Err(ConfigError::Invalid(format!(
                "sea_level {} outside the world column",
                self.sea_level
            )));
        }
        Ok(())
    }
}
