use crate::ship::ShipId;
use crate::world::ChunkCoord;
use thiserror::Error;

/// Errors surfaced across the simulation core.
///
/// Recoverable conditions (palette growth, projectile expiry, streaming
/// overload) are handled internally and never appear here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("coordinate out of range: ({x}, {y}, {z})")]
    CoordinateOutOfRange { x: i32, y: i32, z: i32 },

    #[error("generation failed for chunk {coord:?}: {reason}")]
    GenerationFailure { coord: ChunkCoord, reason: String },

    #[error("simulation instability on ship {0:?}")]
    SimulationInstability(ShipId),

    #[error("unknown ship {0:?}")]
    UnknownShip(ShipId),
}

impl From<crate::config::ConfigError> for EngineError {
    fn from(err: crate::config::ConfigError) -> Self {
        EngineError::ConfigInvalid(err.to_string())
    }
}
