//! Palette-compressed voxel storage for one streamed chunk column.

use super::block::{Block, BlockId};
use super::catalog::BlockCatalog;
use super::chunk_coord::ChunkCoord;
use crate::mesh::ChunkMeshes;
use bitflags::bitflags;
use std::sync::Arc;

pub const CHUNK_SIZE: u32 = 16;
pub const CHUNK_HEIGHT: u32 = 256;
pub const CHUNK_AREA: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_HEIGHT as usize;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        /// Blocks changed since the last generation-stage commit.
        const CONTENT = 1 << 0;
        /// Committed meshes are stale; still safe to render until replaced.
        const MESH = 1 << 1;
        /// Light array is stale and is recomputed before the next remesh.
        const LIGHT = 1 << 2;
    }
}

/// Generation pipeline stage. A chunk never advances a stage without its
/// predecessor completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Empty,
    Terrain,
    Features,
    Lit,
    Meshed,
    /// Generation failed twice; the chunk renders as air.
    Failed,
}

impl Stage {
    /// The stage whose job produces this one, if any.
    pub fn predecessor(self) -> Option<Stage> {
        match self {
            Stage::Empty | Stage::Failed => None,
            Stage::Terrain => Some(Stage::Empty),
            Stage::Features => Some(Stage::Terrain),
            Stage::Lit => Some(Stage::Features),
            Stage::Meshed => Some(Stage::Lit),
        }
    }
}

use super::palette::PackedIndices;

pub struct Chunk {
    coord: ChunkCoord,
    /// Distinct block ids present; index 0 is always air.
    palette: Vec<BlockId>,
    indices: PackedIndices,
    /// Per-voxel light, sky nibble high / emitted nibble low.
    light: Vec<u8>,
    dirty: DirtyFlags,
    stage: Stage,
    meshes: Option<Arc<ChunkMeshes>>,
    /// Bumped on every mesh commit; the renderer compares and rebinds.
    mesh_generation: u64,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            palette: vec![BlockId::AIR],
            indices: PackedIndices::new(CHUNK_VOLUME, 1),
            light: vec![0; CHUNK_VOLUME],
            dirty: DirtyFlags::empty(),
            stage: Stage::Empty,
            meshes: None,
            mesh_generation: 0,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    #[inline]
    fn index(x: u32, y: u32, z: u32) -> usize {
        assert!(
            x < CHUNK_SIZE && y < CHUNK_HEIGHT && z < CHUNK_SIZE,
            "chunk-local coordinate out of range: ({x}, {y}, {z})"
        );
        (y as usize * CHUNK_AREA) + (z as usize * CHUNK_SIZE as usize) + x as usize
    }

    pub fn block_id(&self, x: u32, y: u32, z: u32) -> BlockId {
        self.palette[self.indices.get(Self::index(x, y, z))]
    }

    pub fn get(&self, x: u32, y: u32, z: u32) -> Block {
        let i = Self::index(x, y, z);
        Block {
            id: self.palette[self.indices.get(i)],
            light: self.light[i],
        }
    }

    /// Write a block, growing the palette if the id is new. Returns the
    /// previous id. The index array is re-encoded one bit wider whenever the
    /// palette outgrows the current width.
    pub fn set(&mut self, x: u32, y: u32, z: u32, id: BlockId) -> BlockId {
        let i = Self::index(x, y, z);
        let prev = self.palette[self.indices.get(i)];
        let palette_index = self.palette_index_for(id);
        self.indices.set(i, palette_index);
        if prev != id {
            self.dirty |= DirtyFlags::CONTENT | DirtyFlags::MESH | DirtyFlags::LIGHT;
        }
        prev
    }

    fn palette_index_for(&mut self, id: BlockId) -> usize {
        // The palette stays small (tens of entries); a scan beats a map.
        if let Some(i) = self.palette.iter().position(|&p| p == id) {
            return i;
        }
        if self.palette.len() == self.indices.capacity() {
            self.indices = self.indices.widened(self.indices.bits() + 1);
        }
        self.palette.push(id);
        self.palette.len() - 1
    }

    pub fn light(&self, x: u32, y: u32, z: u32) -> u8 {
        self.light[Self::index(x, y, z)]
    }

    pub fn set_light(&mut self, x: u32, y: u32, z: u32, sky: u8, emitted: u8) {
        self.light[Self::index(x, y, z)] = (sky.min(15) << 4) | emitted.min(15);
    }

    /// Highest solid-collider block in the column, if any.
    pub fn highest_solid(&self, x: u32, z: u32, catalog: &BlockCatalog) -> Option<i32> {
        for y in (0..CHUNK_HEIGHT).rev() {
            let id = self.block_id(x, y, z);
            if !id.is_air() && catalog.is_solid_collider(id) {
                return Some(y as i32);
            }
        }
        None
    }

    pub fn mark_mesh_dirty(&mut self) {
        self.dirty |= DirtyFlags::MESH;
    }

    pub fn clear_dirty(&mut self, flags: DirtyFlags) {
        self.dirty &= !flags;
    }

    /// Advance to the next pipeline stage. Skipping a stage is a scheduler
    /// bug, so it asserts.
    pub fn advance_stage(&mut self, to: Stage) {
        assert_eq!(
            to.predecessor(),
            Some(self.stage),
            "stage jump {:?} -> {to:?} at {:?}",
            self.stage,
            self.coord
        );
        self.stage = to;
    }

    pub fn mark_failed(&mut self) {
        self.stage = Stage::Failed;
    }

    /// Swap in freshly built meshes, returning the replaced set so the
    /// caller can park it on the deferred-free list. The MESH dirty bit is
    /// cleared when the build snapshot is taken, not here; a write that
    /// lands mid-build re-marks the chunk and triggers another pass.
    pub fn commit_meshes(&mut self, meshes: Arc<ChunkMeshes>) -> Option<Arc<ChunkMeshes>> {
        self.mesh_generation += 1;
        self.meshes.replace(meshes)
    }

    pub fn meshes(&self) -> Option<&Arc<ChunkMeshes>> {
        self.meshes.as_ref()
    }

    pub fn take_meshes(&mut self) -> Option<Arc<ChunkMeshes>> {
        self.meshes.take()
    }

    pub fn mesh_generation(&self) -> u64 {
        self.mesh_generation
    }

    /// Raw palette-index view of the block array, used by determinism tests
    /// and content comparison.
    pub fn content_eq(&self, other: &Chunk) -> bool {
        (0..CHUNK_VOLUME).all(|i| {
            self.palette[self.indices.get(i)] == other.palette[other.indices.get(i)]
        })
    }
}
