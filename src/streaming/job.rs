//! Stage jobs executed on the worker pool.
//!
//! A job carries its target stage and the chunk slot it works against.
//! Workers own the chunk exclusively for the duration of a stage (the
//! slot's write lock), commit atomically, and bail out without committing
//! when the slot was cancelled underneath them. Panics inside a stage are
//! caught and reported as failures so one bad chunk cannot take a worker
//! down.

use crate::mesh::{ChunkMeshes, MeshBuilder};
use crate::world::light::relight_chunk;
use crate::world::{Chunk, ChunkCoord, ChunkSlot, DirtyFlags, Stage, TerrainGenerator, World};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub(crate) struct StageJob {
    pub coord: ChunkCoord,
    pub target: Stage,
    pub slot: Arc<ChunkSlot>,
}

#[derive(Debug)]
pub(crate) enum StageError {
    /// The chunk left the keep radius while the job was in flight.
    Cancelled,
    Failed(String),
}

pub(crate) struct StageResult {
    pub coord: ChunkCoord,
    pub target: Stage,
    pub outcome: Result<(), StageError>,
}

/// Everything a worker needs, shared across the pool.
pub(crate) struct WorkerContext {
    pub world: Arc<World>,
    pub generator: Arc<TerrainGenerator>,
    pub retired_meshes: Arc<Mutex<Vec<Arc<ChunkMeshes>>>>,
}

pub(crate) fn run_stage(ctx: &WorkerContext, job: &StageJob) -> Result<(), StageError> {
    if job.slot.is_cancelled() {
        return Err(StageError::Cancelled);
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| execute(ctx, job)));
    match outcome {
        Ok(result) => result,
        Err(payload) => Err(StageError::Failed(panic_message(&payload))),
    }
}

fn execute(ctx: &WorkerContext, job: &StageJob) -> Result<(), StageError> {
    match job.target {
        Stage::Terrain => terrain_stage(ctx, job),
        Stage::Features => features_stage(ctx, job),
        Stage::Lit => lit_stage(ctx, job),
        Stage::Meshed => mesh_stage(ctx, job),
        Stage::Empty | Stage::Failed => {
            Err(StageError::Failed(format!("unschedulable target {:?}", job.target)))
        }
    }
}

/// Generate into a fresh chunk off-lock, then swap it in under a short
/// critical section.
fn terrain_stage(ctx: &WorkerContext, job: &StageJob) -> Result<(), StageError> {
    let mut fresh = Chunk::new(job.coord);
    ctx.generator.generate_terrain(&mut fresh);
    fresh.clear_dirty(DirtyFlags::all());
    fresh.advance_stage(Stage::Terrain);

    if job.slot.is_cancelled() {
        return Err(StageError::Cancelled);
    }
    let mut chunk = job.slot.write();
    if chunk.stage() != Stage::Empty {
        return Err(StageError::Failed(format!(
            "terrain commit found stage {:?}",
            chunk.stage()
        )));
    }
    *chunk = fresh;
    Ok(())
}

/// Decorations are computed from a read snapshot, then applied under the
/// write lock. The pending cross-chunk queue is drained only after the
/// stage advance so late-queued edits from neighbors cannot strand.
fn features_stage(ctx: &WorkerContext, job: &StageJob) -> Result<(), StageError> {
    let decorations = {
        let chunk = job.slot.read();
        ctx.generator.decorations_for(&chunk)
    };

    if job.slot.is_cancelled() {
        return Err(StageError::Cancelled);
    }
    {
        let mut chunk = job.slot.write();
        for edit in decorations.local {
            crate::world::core::apply_edit(&mut chunk, edit);
        }
        chunk.advance_stage(Stage::Features);
    }

    ctx.world.queue_deferred_edits(decorations.deferred);
    ctx.world.apply_deferred_edits(&job.slot, job.coord);
    Ok(())
}

fn lit_stage(ctx: &WorkerContext, job: &StageJob) -> Result<(), StageError> {
    if job.slot.is_cancelled() {
        return Err(StageError::Cancelled);
    }
    let mut chunk = job.slot.write();
    relight_chunk(&mut chunk, ctx.world.catalog());
    chunk.advance_stage(Stage::Lit);
    Ok(())
}

/// Build the three streams from a read snapshot, resolving border voxels
/// through the world, then commit the swap and park the replaced meshes on
/// the deferred-free list.
fn mesh_stage(ctx: &WorkerContext, job: &StageJob) -> Result<(), StageError> {
    {
        // A block write may have staled the light since the Lit commit.
        // Clearing MESH here rather than at commit means a write racing the
        // build below re-marks the chunk instead of going stale.
        let mut chunk = job.slot.write();
        if chunk.dirty().contains(DirtyFlags::LIGHT) {
            relight_chunk(&mut chunk, ctx.world.catalog());
        }
        chunk.clear_dirty(DirtyFlags::MESH);
    }

    let meshes = {
        let chunk = job.slot.read();
        let world = &ctx.world;
        MeshBuilder::new(ctx.world.catalog())
            .build(&chunk, |x, y, z| world.sample_block(x, y, z))
    };

    if job.slot.is_cancelled() {
        return Err(StageError::Cancelled);
    }
    let replaced = {
        let mut chunk = job.slot.write();
        if chunk.stage() == Stage::Lit {
            chunk.advance_stage(Stage::Meshed);
        } else if chunk.stage() != Stage::Meshed {
            return Err(StageError::Failed(format!(
                "mesh commit found stage {:?}",
                chunk.stage()
            )));
        }
        chunk.commit_meshes(Arc::new(meshes))
    };

    if let Some(old) = replaced {
        ctx.retired_meshes.lock().push(old);
    }
    Ok(())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker stage panicked".to_string()
    }
}
