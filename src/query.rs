//! World query surface for gameplay collaborators.
//!
//! Reads hit committed chunk state; writes go through [`World::set_block`]
//! on the main thread, which marks the affected chunks dirty so the
//! streaming engine re-meshes them. Ship and projectile lookups are
//! id-based through the registries.

use crate::ship::{Projectile, ProjectileId, ProjectileKind, ShipId, ShipSnapshot};
use crate::utils::error::EngineError;
use crate::utils::ray::Ray;
use crate::world::{Block, BlockId, World, CHUNK_HEIGHT};
use glam::{IVec3, Vec3};

/// Result of a voxel raycast.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    pub voxel: IVec3,
    pub block: Block,
    pub distance: f32,
    /// Face normal the ray entered through; zero when the ray started
    /// inside the hit voxel.
    pub normal: IVec3,
}

impl World {
    /// Committed block at world coordinates.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Result<Block, EngineError> {
        self.block(x, y, z)
    }

    /// Highest solid block of the column, if the chunk is loaded and any
    /// solid block exists.
    pub fn height_at(&self, x: i32, z: i32) -> Result<Option<i32>, EngineError> {
        let coord = crate::world::ChunkCoord::from_block(x, z);
        let slot = self.slot(coord).ok_or(EngineError::CoordinateOutOfRange {
            x,
            y: 0,
            z,
        })?;
        let chunk = slot.read();
        if chunk.stage() < crate::world::Stage::Terrain {
            return Err(EngineError::CoordinateOutOfRange { x, y: 0, z });
        }
        let (bx, bz) = coord.base();
        Ok(chunk.highest_solid((x - bx) as u32, (z - bz) as u32, self.catalog()))
    }

    /// Instantaneous water surface height at (x, z): sea level plus tide
    /// plus waves.
    pub fn water_height_at(&self, x: f32, z: f32, t: f32) -> f32 {
        self.ocean().sample_height(x, z, t)
    }

    /// Walk the voxel grid from `origin` along `direction` and return the
    /// first block the predicate accepts. Unloaded space reads as air.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        predicate: impl Fn(Block) -> bool,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(origin, direction);
        let mut hit_block = Block::AIR;
        let (voxel, distance, normal) = ray.walk_voxels(max_distance, |v| {
            if v.y < 0 || v.y >= CHUNK_HEIGHT as i32 {
                return false;
            }
            let block = self.sample_block(v.x, v.y, v.z);
            if !block.id.is_air() && predicate(block) {
                hit_block = block;
                true
            } else {
                false
            }
        })?;
        Some(RaycastHit {
            voxel,
            block: hit_block,
            distance,
            normal,
        })
    }

    /// Convenience raycast against solid colliders.
    pub fn raycast_solid(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        self.raycast(origin, direction, max_distance, |block| {
            self.catalog().is_solid_collider(block.id)
        })
    }

    // ---- ship queries ----------------------------------------------------

    pub fn ship_snapshot(&self, id: ShipId) -> Option<ShipSnapshot> {
        self.with_ship(id, |body| body.snapshot())
    }

    /// Closest ship to a point, by hull center.
    pub fn nearest_ship(&self, position: Vec3) -> Option<ShipId> {
        self.with_ships(|ships| {
            ships
                .values()
                .map(|body| (body.id(), body.position.distance_squared(position)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        })
    }

    pub fn ships_in_radius(&self, position: Vec3, radius: f32) -> Vec<ShipId> {
        let radius_sq = radius * radius;
        self.with_ships(|ships| {
            ships
                .values()
                .filter(|body| body.position.distance_squared(position) <= radius_sq)
                .map(|body| body.id())
                .collect()
        })
    }

    // ---- projectiles -----------------------------------------------------

    /// Register a cannon round fired by `owner`. Lifetime bookkeeping is
    /// derived from the launch state.
    pub fn add_projectile(
        &self,
        kind: ProjectileKind,
        owner: ShipId,
        position: Vec3,
        velocity: Vec3,
        max_range: f32,
        gravity: f32,
    ) -> ProjectileId {
        let water = self.sea_level() as f32;
        self.insert_projectile(|id| {
            Projectile::new(id, kind, owner, position, velocity, max_range, water, gravity)
        })
    }

    pub fn delete_projectile(&self, id: ProjectileId) -> bool {
        self.remove_projectile(id).is_some()
    }
}

/// Query-level block write with the standard result alias.
pub fn set_block(world: &World, x: i32, y: i32, z: i32, id: BlockId) -> Result<BlockId, EngineError> {
    world.set_block(x, y, z, id)
}
