//! Chunk streaming: load/unload around a focus chunk, stage scheduling on a
//! worker pool, atomic commits, cooperative cancellation, and backpressure.
//!
//! The main thread never blocks on workers: [`StreamingEngine::pump`] drains
//! completions, unloads what left the keep radius, and issues whatever jobs
//! the dependency rules allow, most-urgent first. At most one job per
//! (chunk, stage) is ever in flight; duplicates coalesce in the bookkeeping
//! here.

mod job;

use crate::config::StreamingConfig;
use crate::mesh::ChunkMeshes;
use crate::utils::error::EngineError;
use crate::world::{ChunkCoord, DirtyFlags, Stage, TerrainGenerator, World};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use job::{run_stage, StageError, StageJob, StageResult, WorkerContext};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counters for diagnostics overlays.
#[derive(Debug, Default)]
pub struct StreamingStats {
    pub chunks_generated: AtomicU64,
    pub chunks_meshed: AtomicU64,
    pub jobs_dropped: AtomicU64,
    pub jobs_cancelled: AtomicU64,
    pub stage_retries: AtomicU64,
    pub chunks_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingStatsSnapshot {
    pub chunks_generated: u64,
    pub chunks_meshed: u64,
    pub jobs_dropped: u64,
    pub jobs_cancelled: u64,
    pub stage_retries: u64,
    pub chunks_failed: u64,
}

impl StreamingStats {
    pub fn snapshot(&self) -> StreamingStatsSnapshot {
        StreamingStatsSnapshot {
            chunks_generated: self.chunks_generated.load(Ordering::Relaxed),
            chunks_meshed: self.chunks_meshed.load(Ordering::Relaxed),
            jobs_dropped: self.jobs_dropped.load(Ordering::Relaxed),
            jobs_cancelled: self.jobs_cancelled.load(Ordering::Relaxed),
            stage_retries: self.stage_retries.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
        }
    }
}

pub struct StreamingEngine {
    config: StreamingConfig,
    world: Arc<World>,
    // Declared before the pool so the channel closes first on drop and the
    // worker loops run off their queues and exit.
    jobs_tx: Sender<StageJob>,
    results_rx: Receiver<StageResult>,
    _pool: ThreadPool,
    in_flight: HashSet<(ChunkCoord, Stage)>,
    retry_counts: HashMap<ChunkCoord, u32>,
    /// Unloaded slots whose meshes could not be stripped yet because a
    /// worker still held the chunk lock.
    pending_retire: Vec<Arc<crate::world::ChunkSlot>>,
    retired_meshes: Arc<Mutex<Vec<Arc<ChunkMeshes>>>>,
    stats: Arc<StreamingStats>,
}

impl StreamingEngine {
    pub fn new(
        config: StreamingConfig,
        world: Arc<World>,
        generator: Arc<TerrainGenerator>,
    ) -> Result<Self, EngineError> {
        let workers = config.effective_worker_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("chunk-worker-{i}"))
            .build()
            .map_err(|e| EngineError::ConfigInvalid(format!("worker pool: {e}")))?;

        let (jobs_tx, jobs_rx) = bounded::<StageJob>(config.max_jobs_in_flight);
        let (results_tx, results_rx) = unbounded::<StageResult>();
        let retired_meshes = Arc::new(Mutex::new(Vec::new()));

        let context = Arc::new(WorkerContext {
            world: world.clone(),
            generator,
            retired_meshes: retired_meshes.clone(),
        });

        for _ in 0..workers {
            let context = context.clone();
            let jobs_rx = jobs_rx.clone();
            let results_tx = results_tx.clone();
            pool.spawn(move || {
                for stage_job in jobs_rx.iter() {
                    let outcome = run_stage(&context, &stage_job);
                    let _ = results_tx.send(StageResult {
                        coord: stage_job.coord,
                        target: stage_job.target,
                        outcome,
                    });
                }
            });
        }

        Ok(Self {
            config,
            world,
            jobs_tx,
            results_rx,
            _pool: pool,
            in_flight: HashSet::new(),
            retry_counts: HashMap::new(),
            pending_retire: Vec::new(),
            retired_meshes,
            stats: Arc::new(StreamingStats::default()),
        })
    }

    pub fn stats(&self) -> StreamingStatsSnapshot {
        self.stats.snapshot()
    }

    /// True when no stage job is outstanding.
    pub fn idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Once-per-frame streaming progress: drain completions, unload beyond
    /// the keep radius, issue jobs inside the load radius.
    pub fn pump(&mut self, focus: ChunkCoord) {
        self.drain_results();
        self.unload_pass(focus);
        self.load_pass(focus);
    }

    /// Hand the replaced/unloaded mesh buffers to the caller. Hosts call
    /// this after their render fence so a mesh is never destroyed while a
    /// frame still references it.
    pub fn drain_retired_meshes(&self) -> Vec<Arc<ChunkMeshes>> {
        std::mem::take(&mut *self.retired_meshes.lock())
    }

    fn drain_results(&mut self) {
        for result in self.results_rx.try_iter() {
            self.in_flight.remove(&(result.coord, result.target));
            match result.outcome {
                Ok(()) => {
                    self.retry_counts.remove(&result.coord);
                    match result.target {
                        Stage::Terrain => {
                            self.stats.chunks_generated.fetch_add(1, Ordering::Relaxed);
                        }
                        Stage::Meshed => {
                            self.stats.chunks_meshed.fetch_add(1, Ordering::Relaxed);
                        }
                        _ => {}
                    }
                }
                Err(StageError::Cancelled) => {
                    self.stats.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
                }
                Err(StageError::Failed(reason)) => {
                    let attempts = self.retry_counts.entry(result.coord).or_insert(0);
                    *attempts += 1;
                    if *attempts == 1 {
                        // One retry; the load pass re-issues it.
                        log::warn!(
                            "stage {:?} failed at {:?}, retrying: {reason}",
                            result.target,
                            result.coord
                        );
                        self.stats.stage_retries.fetch_add(1, Ordering::Relaxed);
                    } else {
                        log::error!(
                            "stage {:?} failed twice at {:?}, marking chunk failed: {reason}",
                            result.target,
                            result.coord
                        );
                        self.stats.chunks_failed.fetch_add(1, Ordering::Relaxed);
                        if let Some(slot) = self.world.slot(result.coord) {
                            slot.write().mark_failed();
                        }
                    }
                }
            }
        }
    }

    fn unload_pass(&mut self, focus: ChunkCoord) {
        for coord in self.world.loaded_coords() {
            if coord.chebyshev(focus) <= self.config.keep_radius_chunks {
                continue;
            }
            // Cancellation is cooperative: the slot flag flips here and any
            // in-flight job discards instead of committing.
            if let Some(slot) = self.world.remove_slot(coord) {
                self.pending_retire.push(slot);
            }
        }

        // Strip meshes off unloaded slots without waiting on a worker that
        // still holds one through a stage; contended slots retry next pump.
        self.pending_retire.retain(|slot| {
            let Some(mut chunk) = slot.try_write() else {
                return true;
            };
            if let Some(meshes) = chunk.take_meshes() {
                self.retired_meshes.lock().push(meshes);
            }
            false
        });
    }

    fn load_pass(&mut self, focus: ChunkCoord) {
        let radius = self.config.load_radius_chunks;
        let mut wanted = Vec::with_capacity(((radius * 2 + 1) * (radius * 2 + 1)) as usize);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                wanted.push(ChunkCoord::new(focus.x + dx, focus.z + dz));
            }
        }
        wanted.sort_by_key(|c| c.distance_sq(focus));

        for coord in wanted {
            let slot = self.world.slot_or_insert(coord);
            let (stage, mesh_dirty) = {
                let chunk = slot.read();
                (chunk.stage(), chunk.dirty().contains(DirtyFlags::MESH))
            };

            let target = match stage {
                Stage::Empty => Stage::Terrain,
                Stage::Terrain => Stage::Features,
                Stage::Features => Stage::Lit,
                Stage::Lit => Stage::Meshed,
                Stage::Meshed if mesh_dirty => Stage::Meshed,
                Stage::Meshed | Stage::Failed => continue,
            };

            if self.in_flight.contains(&(coord, target)) {
                continue;
            }
            if !self.dependencies_ready(coord, target) {
                continue;
            }

            match self.jobs_tx.try_send(StageJob {
                coord,
                target,
                slot,
            }) {
                Ok(()) => {
                    self.in_flight.insert((coord, target));
                }
                Err(TrySendError::Full(_)) => {
                    // Backpressure: everything farther out than this chunk
                    // is lower priority; drop the rest and re-issue next
                    // tick.
                    self.stats.jobs_dropped.fetch_add(1, Ordering::Relaxed);
                    break;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Stage dependency rules: Features needs all eight neighbors at
    /// Terrain (cross-border decoration), Meshed needs the four cardinal
    /// neighbors at Lit (border faces and their light).
    fn dependencies_ready(&self, coord: ChunkCoord, target: Stage) -> bool {
        let at_least = |neighbor: ChunkCoord, stage: Stage| {
            matches!(self.world.stage_of(neighbor), Some(s) if s >= stage && s != Stage::Failed)
        };
        match target {
            Stage::Terrain | Stage::Lit => true,
            Stage::Features => coord
                .ring_neighbors()
                .iter()
                .all(|&n| at_least(n, Stage::Terrain)),
            Stage::Meshed => coord
                .cardinal_neighbors()
                .iter()
                .all(|&n| at_least(n, Stage::Lit)),
            Stage::Empty | Stage::Failed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OceanConfig, WorldConfig};
    use crate::ocean::OceanField;
    use crate::world::BlockCatalog;
    use std::time::{Duration, Instant};

    fn make_world(seed: u64) -> Arc<World> {
        let config = WorldConfig {
            seed,
            ..WorldConfig::default()
        };
        let catalog = Arc::new(BlockCatalog::builtin());
        let ocean =
            OceanField::from_config(seed, config.sea_level as f32, &OceanConfig::default()).unwrap();
        Arc::new(World::new(config, catalog, ocean))
    }

    fn make_engine(world: &Arc<World>, load: i32, keep: i32) -> StreamingEngine {
        let generator = Arc::new(TerrainGenerator::new(
            world.seed(),
            world.sea_level(),
            world.catalog().clone(),
        ));
        let config = StreamingConfig {
            load_radius_chunks: load,
            keep_radius_chunks: keep,
            worker_threads: 2,
            max_jobs_in_flight: 64,
        };
        StreamingEngine::new(config, world.clone(), generator).unwrap()
    }

    fn pump_until(
        engine: &mut StreamingEngine,
        focus: ChunkCoord,
        timeout: Duration,
        mut done: impl FnMut(&StreamingEngine) -> bool,
    ) -> bool {
        let start = Instant::now();
        loop {
            engine.pump(focus);
            if done(engine) && engine.idle() {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_interior_chunks_reach_meshed() {
        let world = make_world(0xC0FFEE);
        let mut engine = make_engine(&world, 3, 5);
        let focus = ChunkCoord::new(0, 0);

        let ok = pump_until(&mut engine, focus, Duration::from_secs(60), |_| {
            matches!(
                world.stage_of(ChunkCoord::new(0, 0)),
                Some(Stage::Meshed)
            )
        });
        assert!(ok, "focus chunk never reached Meshed");

        let slot = world.slot(focus).unwrap();
        let chunk = slot.read();
        assert!(chunk.meshes().is_some());
        assert!(chunk.meshes().unwrap().vertex_count() > 0);
    }

    #[test]
    fn test_rim_chunks_hold_at_terrain() {
        let world = make_world(0xC0FFEE);
        let mut engine = make_engine(&world, 2, 4);
        let focus = ChunkCoord::new(0, 0);

        pump_until(&mut engine, focus, Duration::from_secs(60), |_| {
            matches!(world.stage_of(ChunkCoord::new(0, 0)), Some(Stage::Meshed))
        });

        // The outermost ring has no generated outer neighbors, so it cannot
        // legally pass Terrain.
        let rim = world.stage_of(ChunkCoord::new(2, 2)).unwrap();
        assert!(rim >= Stage::Terrain);
        assert!(rim < Stage::Lit, "rim advanced without its dependencies");
    }

    #[test]
    fn test_teleport_unloads_everything_beyond_keep_radius() {
        let world = make_world(0xC0FFEE);
        let mut engine = make_engine(&world, 4, 6);
        let origin = ChunkCoord::new(0, 0);

        let ok = pump_until(&mut engine, origin, Duration::from_secs(90), |_| {
            matches!(world.stage_of(origin), Some(Stage::Meshed))
        });
        assert!(ok);

        // Hold a render handle across the teleport.
        let held = {
            let slot = world.slot(origin).unwrap();
            let chunk = slot.read();
            chunk.meshes().unwrap().clone()
        };
        let held_vertices = held.vertex_count();

        // 10,000 blocks away: every old chunk is far outside keep radius.
        let far = ChunkCoord::from_block(10_000, 10_000);
        engine.pump(far);

        for coord in world.loaded_coords() {
            assert!(
                coord.chebyshev(far) <= 6,
                "chunk {coord:?} survived the teleport"
            );
        }

        // The held mesh stays intact until the host releases it.
        assert_eq!(held.vertex_count(), held_vertices);
        let retired = engine.drain_retired_meshes();
        assert!(
            retired.iter().any(|m| Arc::ptr_eq(m, &held)),
            "replaced mesh should land on the deferred-free list"
        );

        // Let in-flight work drain so cancellations are accounted.
        pump_until(&mut engine, far, Duration::from_secs(30), |e| e.idle());
    }

    #[test]
    fn test_remesh_after_block_write() {
        let world = make_world(0xC0FFEE);
        let mut engine = make_engine(&world, 2, 4);
        let focus = ChunkCoord::new(0, 0);

        let ok = pump_until(&mut engine, focus, Duration::from_secs(60), |_| {
            matches!(world.stage_of(focus), Some(Stage::Meshed))
        });
        assert!(ok);

        let generation_before = world.slot(focus).unwrap().read().mesh_generation();
        world
            .set_block(4, 80, 4, crate::world::blocks::STONE)
            .unwrap();
        assert!(world
            .slot(focus)
            .unwrap()
            .read()
            .dirty()
            .contains(DirtyFlags::MESH));

        let ok = pump_until(&mut engine, focus, Duration::from_secs(60), |_| {
            world.slot(focus).unwrap().read().mesh_generation() > generation_before
        });
        assert!(ok, "dirty chunk was never remeshed");
        assert!(!world
            .slot(focus)
            .unwrap()
            .read()
            .dirty()
            .contains(DirtyFlags::MESH));
    }

    #[test]
    fn test_duplicate_requests_coalesce() {
        let world = make_world(0xC0FFEE);
        let mut engine = make_engine(&world, 1, 2);
        let focus = ChunkCoord::new(0, 0);

        // Hammer the scheduler without waiting for completions. If a
        // (chunk, stage) pair were ever issued twice, the second commit
        // would find the wrong stage and show up as a retry or failure.
        for _ in 0..50 {
            engine.pump(focus);
        }
        let ok = pump_until(&mut engine, focus, Duration::from_secs(30), |e| e.idle());
        assert!(ok);

        let stats = engine.stats();
        assert_eq!(stats.stage_retries, 0);
        assert_eq!(stats.chunks_failed, 0);
        // 3x3 chunks around the focus, generated exactly once each.
        assert_eq!(stats.chunks_generated, 9);
    }
}
