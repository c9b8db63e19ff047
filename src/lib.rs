//! Brinevox: world simulation core for a voxel open-world sailing game.
//!
//! The crate owns procedural terrain generation, chunk storage and mesh
//! extraction, the ocean wave field, and ship rigid-body dynamics. Rendering,
//! UI, and gameplay bookkeeping live in host crates and talk to the core
//! through the renderer feed ([`mesh`]), the physics client ([`ship`]), the
//! world query surface ([`query`]), and an injected [`sim::Clock`].

pub mod config;
pub mod engine;
pub mod mesh;
pub mod noisefield;
pub mod ocean;
pub mod query;
pub mod ship;
pub mod sim;
pub mod streaming;
pub mod utils;
pub mod world;

/// Engine prelude
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::Engine;
    pub use crate::mesh::{ChunkMeshes, MeshVertex};
    pub use crate::ocean::OceanField;
    pub use crate::query::RaycastHit;
    pub use crate::ship::{ShipBody, ShipId};
    pub use crate::sim::{Clock, ManualClock};
    pub use crate::utils::error::EngineError;
    pub use crate::world::{Block, BlockCatalog, BlockId, Chunk, ChunkCoord, World};

    // Commonly used external types
    pub use glam::{IVec3, Quat, Vec2, Vec3};
}

/// Current engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
