use super::chunk::CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// 2D chunk coordinate; chunks are full-height columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing the given world-space block column.
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE as i32),
            z: z.div_euclid(CHUNK_SIZE as i32),
        }
    }

    /// World-space block coordinates of this chunk's (0, 0) corner.
    pub fn base(&self) -> (i32, i32) {
        (self.x * CHUNK_SIZE as i32, self.z * CHUNK_SIZE as i32)
    }

    /// Chebyshev distance in chunks; the streaming radii use this metric.
    pub fn chebyshev(&self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    pub fn distance_sq(&self, other: ChunkCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    /// The four cardinal neighbors.
    pub fn cardinal_neighbors(&self) -> [ChunkCoord; 4] {
        [
            Self::new(self.x + 1, self.z),
            Self::new(self.x - 1, self.z),
            Self::new(self.x, self.z + 1),
            Self::new(self.x, self.z - 1),
        ]
    }

    /// All eight surrounding chunks.
    pub fn ring_neighbors(&self) -> [ChunkCoord; 8] {
        [
            Self::new(self.x - 1, self.z - 1),
            Self::new(self.x, self.z - 1),
            Self::new(self.x + 1, self.z - 1),
            Self::new(self.x - 1, self.z),
            Self::new(self.x + 1, self.z),
            Self::new(self.x - 1, self.z + 1),
            Self::new(self.x, self.z + 1),
            Self::new(self.x + 1, self.z + 1),
        ]
    }
}
