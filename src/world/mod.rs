pub mod block;
pub mod catalog;
pub mod chunk;
pub mod chunk_coord;
pub mod core;
pub mod generator;
pub mod light;
pub mod palette;

pub use block::{Block, BlockId, Opacity};
pub use catalog::{blocks, BlockCatalog, BlockDef};
pub use chunk::{Chunk, DirtyFlags, Stage, CHUNK_AREA, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME};
pub use chunk_coord::ChunkCoord;
pub use self::core::{ChunkSlot, World};
pub use generator::{Biome, BiomeProfile, BlockEdit, TerrainGenerator};
pub use palette::PackedIndices;

/// Descriptive world metadata carried alongside the simulation state.
#[derive(Debug, Clone)]
pub struct WorldMeta {
    pub name: String,
    pub seed: u64,
}
