//! The world: chunk map, ocean handle, and the ship/projectile registries.
//!
//! Chunks are created by the streaming engine and owned here; lookups
//! dominate, so the map sits behind a reader-biased lock with one lock per
//! chunk slot for content. Ships and projectiles are id-keyed registries;
//! nothing in the core holds back-pointers between them.

use super::block::{Block, BlockId};
use super::catalog::BlockCatalog;
use super::chunk::{Chunk, DirtyFlags, Stage, CHUNK_HEIGHT, CHUNK_SIZE};
use super::chunk_coord::ChunkCoord;
use super::generator::BlockEdit;
use crate::config::WorldConfig;
use crate::ocean::OceanField;
use crate::ship::{Projectile, ProjectileId, ShipBody, ShipId};
use crate::utils::error::EngineError;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// One chunk plus its streaming bookkeeping. Workers lock `chunk` for the
/// duration of a stage; unload flips `cancelled` so in-flight jobs discard
/// their results instead of committing.
pub struct ChunkSlot {
    chunk: RwLock<Chunk>,
    cancelled: AtomicBool,
}

impl ChunkSlot {
    pub fn new(chunk: Chunk) -> Self {
        Self {
            chunk: RwLock::new(chunk),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Chunk> {
        self.chunk.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Chunk> {
        self.chunk.write()
    }

    /// Non-blocking write attempt, for paths that must not wait on a worker
    /// holding the chunk through a stage.
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, Chunk>> {
        self.chunk.try_write()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

pub struct World {
    config: WorldConfig,
    catalog: Arc<BlockCatalog>,
    chunks: RwLock<HashMap<ChunkCoord, Arc<ChunkSlot>>>,
    ocean: RwLock<Arc<OceanField>>,
    /// Decoration edits waiting for their target chunk to reach Features.
    deferred_edits: Mutex<HashMap<ChunkCoord, Vec<BlockEdit>>>,
    ships: RwLock<HashMap<ShipId, ShipBody>>,
    projectiles: RwLock<HashMap<ProjectileId, Projectile>>,
    next_ship_id: AtomicU64,
    next_projectile_id: AtomicU64,
}

impl World {
    pub fn new(config: WorldConfig, catalog: Arc<BlockCatalog>, ocean: OceanField) -> Self {
        Self {
            config,
            catalog,
            chunks: RwLock::new(HashMap::new()),
            ocean: RwLock::new(Arc::new(ocean)),
            deferred_edits: Mutex::new(HashMap::new()),
            ships: RwLock::new(HashMap::new()),
            projectiles: RwLock::new(HashMap::new()),
            next_ship_id: AtomicU64::new(1),
            next_projectile_id: AtomicU64::new(1),
        }
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn meta(&self) -> super::WorldMeta {
        super::WorldMeta {
            name: self.config.name.clone(),
            seed: self.config.seed,
        }
    }

    pub fn sea_level(&self) -> i32 {
        self.config.sea_level
    }

    pub fn catalog(&self) -> &Arc<BlockCatalog> {
        &self.catalog
    }

    /// The ocean state shared by the current tick. Read-only during a tick;
    /// parameter changes swap the whole field.
    pub fn ocean(&self) -> Arc<OceanField> {
        self.ocean.read().clone()
    }

    pub fn set_ocean(&self, ocean: OceanField) {
        *self.ocean.write() = Arc::new(ocean);
    }

    // ---- chunk map ------------------------------------------------------

    pub fn slot(&self, coord: ChunkCoord) -> Option<Arc<ChunkSlot>> {
        self.chunks.read().get(&coord).cloned()
    }

    /// Fetch or create the slot for a coordinate. New chunks start Empty.
    pub fn slot_or_insert(&self, coord: ChunkCoord) -> Arc<ChunkSlot> {
        if let Some(slot) = self.slot(coord) {
            return slot;
        }
        let mut chunks = self.chunks.write();
        chunks
            .entry(coord)
            .or_insert_with(|| Arc::new(ChunkSlot::new(Chunk::new(coord))))
            .clone()
    }

    /// Drop a chunk from the map, cancelling any in-flight work against it.
    /// Returns the removed slot so the caller can retire its meshes.
    pub fn remove_slot(&self, coord: ChunkCoord) -> Option<Arc<ChunkSlot>> {
        let slot = self.chunks.write().remove(&coord);
        if let Some(slot) = &slot {
            slot.cancel();
        }
        slot
    }

    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        self.chunks.read().keys().copied().collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.read().len()
    }

    pub fn stage_of(&self, coord: ChunkCoord) -> Option<Stage> {
        self.slot(coord).map(|slot| slot.read().stage())
    }

    // ---- block access ---------------------------------------------------

    fn split_coords(x: i32, y: i32, z: i32) -> Result<(ChunkCoord, u32, u32, u32), EngineError> {
        if y < 0 || y >= CHUNK_HEIGHT as i32 {
            return Err(EngineError::CoordinateOutOfRange { x, y, z });
        }
        let coord = ChunkCoord::from_block(x, z);
        let (bx, bz) = coord.base();
        Ok((coord, (x - bx) as u32, y as u32, (z - bz) as u32))
    }

    /// Read a block at world coordinates. Out-of-column heights and chunks
    /// that have not reached Terrain fail loudly rather than reading as air;
    /// chunks marked Failed render as air by contract.
    pub fn block(&self, x: i32, y: i32, z: i32) -> Result<Block, EngineError> {
        let (coord, lx, ly, lz) = Self::split_coords(x, y, z)?;
        let slot = self
            .slot(coord)
            .ok_or(EngineError::CoordinateOutOfRange { x, y, z })?;
        let chunk = slot.read();
        match chunk.stage() {
            Stage::Empty => Err(EngineError::CoordinateOutOfRange { x, y, z }),
            Stage::Failed => Ok(Block::AIR),
            _ => Ok(chunk.get(lx, ly, lz)),
        }
    }

    /// Resolve a block relative to a chunk, crossing chunk borders when the
    /// local offsets walk outside [0, 16).
    pub fn neighbor_block(
        &self,
        coord: ChunkCoord,
        x: i32,
        y: i32,
        z: i32,
    ) -> Result<Block, EngineError> {
        let (bx, bz) = coord.base();
        self.block(bx + x, y, bz + z)
    }

    /// Lenient sampler for meshing and physics probes: anything unloaded or
    /// out of range reads as air.
    pub fn sample_block(&self, x: i32, y: i32, z: i32) -> Block {
        self.block(x, y, z).unwrap_or(Block::AIR)
    }

    pub fn is_solid_at(&self, x: i32, y: i32, z: i32) -> bool {
        self.catalog.is_solid_collider(self.sample_block(x, y, z).id)
    }

    /// Write a block through the main-thread gameplay path. Marks the chunk
    /// content/mesh/light dirty and propagates mesh dirt to the cardinal
    /// neighbor when the write sits on a shared border.
    pub fn set_block(&self, x: i32, y: i32, z: i32, id: BlockId) -> Result<BlockId, EngineError> {
        let (coord, lx, ly, lz) = Self::split_coords(x, y, z)?;
        let slot = self
            .slot(coord)
            .ok_or(EngineError::CoordinateOutOfRange { x, y, z })?;

        let prev = {
            let mut chunk = slot.write();
            // Failed chunks read as air by contract; accepting writes into
            // them would silently disagree with those reads.
            if chunk.stage() < Stage::Terrain || chunk.stage() == Stage::Failed {
                return Err(EngineError::CoordinateOutOfRange { x, y, z });
            }
            chunk.set(lx, ly, lz, id)
        };

        if prev != id {
            let mut border_neighbors = Vec::new();
            if lx == 0 {
                border_neighbors.push(ChunkCoord::new(coord.x - 1, coord.z));
            }
            if lx == CHUNK_SIZE - 1 {
                border_neighbors.push(ChunkCoord::new(coord.x + 1, coord.z));
            }
            if lz == 0 {
                border_neighbors.push(ChunkCoord::new(coord.x, coord.z - 1));
            }
            if lz == CHUNK_SIZE - 1 {
                border_neighbors.push(ChunkCoord::new(coord.x, coord.z + 1));
            }
            for neighbor in border_neighbors {
                if let Some(slot) = self.slot(neighbor) {
                    slot.write().mark_mesh_dirty();
                }
            }
        }
        Ok(prev)
    }

    // ---- deferred decoration edits --------------------------------------

    /// Queue cross-chunk decoration edits. If the target chunk has already
    /// passed Features the edits apply immediately; otherwise they wait for
    /// its Features commit, which drains the queue after advancing stage.
    ///
    /// The pending map and chunk locks are never held together; that keeps
    /// this path deadlock-free against worker commits.
    pub fn queue_deferred_edits(&self, edits: Vec<(ChunkCoord, BlockEdit)>) {
        let mut targets = Vec::new();
        {
            let mut pending = self.deferred_edits.lock();
            for (target, edit) in edits {
                pending.entry(target).or_default().push(edit);
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }

        for target in targets {
            let Some(slot) = self.slot(target) else {
                continue;
            };
            let stage = slot.read().stage();
            if stage >= Stage::Features && stage != Stage::Failed {
                self.apply_deferred_edits(&slot, target);
            }
        }
    }

    /// Drain and apply pending edits for a chunk at or past Features.
    pub fn apply_deferred_edits(&self, slot: &ChunkSlot, coord: ChunkCoord) {
        let edits = self.take_deferred_edits(coord);
        if edits.is_empty() {
            return;
        }
        let mut chunk = slot.write();
        for edit in edits {
            apply_edit(&mut chunk, edit);
        }
    }

    /// Take the pending edits for a chunk about to commit Features.
    pub fn take_deferred_edits(&self, coord: ChunkCoord) -> Vec<BlockEdit> {
        self.deferred_edits.lock().remove(&coord).unwrap_or_default()
    }

    // ---- ship registry --------------------------------------------------

    pub fn spawn_ship(&self, build: impl FnOnce(ShipId) -> ShipBody) -> ShipId {
        let id = ShipId(self.next_ship_id.fetch_add(1, Ordering::Relaxed));
        let body = build(id);
        self.ships.write().insert(id, body);
        id
    }

    pub fn despawn_ship(&self, id: ShipId) -> bool {
        self.ships.write().remove(&id).is_some()
    }

    pub fn ship_count(&self) -> usize {
        self.ships.read().len()
    }

    pub fn with_ship<R>(&self, id: ShipId, f: impl FnOnce(&ShipBody) -> R) -> Option<R> {
        self.ships.read().get(&id).map(f)
    }

    pub fn with_ship_mut<R>(&self, id: ShipId, f: impl FnOnce(&mut ShipBody) -> R) -> Option<R> {
        self.ships.write().get_mut(&id).map(f)
    }

    pub fn with_ships<R>(&self, f: impl FnOnce(&HashMap<ShipId, ShipBody>) -> R) -> R {
        f(&self.ships.read())
    }

    pub fn with_ships_mut<R>(&self, f: impl FnOnce(&mut HashMap<ShipId, ShipBody>) -> R) -> R {
        f(&mut self.ships.write())
    }

    // ---- projectile registry --------------------------------------------

    pub fn insert_projectile(
        &self,
        build: impl FnOnce(ProjectileId) -> Projectile,
    ) -> ProjectileId {
        let id = ProjectileId(self.next_projectile_id.fetch_add(1, Ordering::Relaxed));
        self.projectiles.write().insert(id, build(id));
        id
    }

    pub fn remove_projectile(&self, id: ProjectileId) -> Option<Projectile> {
        self.projectiles.write().remove(&id)
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.read().len()
    }

    pub fn with_projectiles_mut<R>(
        &self,
        f: impl FnOnce(&mut HashMap<ProjectileId, Projectile>) -> R,
    ) -> R {
        f(&mut self.projectiles.write())
    }
}

/// Deferred edits only ever add foliage, so they never clobber terrain or a
/// neighbor's own decorations: writes land in air voxels only.
pub(crate) fn apply_edit(chunk: &mut Chunk, edit: BlockEdit) {
    let (bx, bz) = chunk.coord().base();
    let lx = (edit.x - bx) as u32;
    let lz = (edit.z - bz) as u32;
    if edit.y < 0 || edit.y >= CHUNK_HEIGHT as i32 {
        return;
    }
    if chunk.block_id(lx, edit.y as u32, lz).is_air() {
        chunk.set(lx, edit.y as u32, lz, edit.id);
        chunk.clear_dirty(DirtyFlags::CONTENT);
    }
}
