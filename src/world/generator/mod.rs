pub mod biome;
pub mod decoration;
pub mod terrain;

pub use biome::{classify, Biome, BiomeProfile};
pub use decoration::{BlockEdit, DecorationSet};
pub use terrain::{chunk_seed, TerrainGenerator};
