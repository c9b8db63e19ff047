//! Engine front-end: owns the world, the generator, the streaming engine,
//! and the fixed-step scheduler, and exposes the renderer feed and physics
//! client surfaces. Hosts construct it with an injected clock and call
//! [`Engine::update`] once per frame.

use crate::config::EngineConfig;
use crate::mesh::ChunkMeshes;
use crate::ocean::OceanField;
use crate::ship::{self, ShipBody, ShipComponent, ShipId, ShipSnapshot};
use crate::sim::{Clock, TickScheduler};
use crate::streaming::{StreamingEngine, StreamingStatsSnapshot};
use crate::utils::error::EngineError;
use crate::utils::math::{Aabb, Frustum};
use crate::world::{BlockCatalog, ChunkCoord, TerrainGenerator, World, CHUNK_HEIGHT, CHUNK_SIZE};
use glam::Vec3;
use std::sync::Arc;

/// A committed chunk mesh as handed to the renderer. The generation counter
/// tells the renderer when to rebind.
pub struct MeshHandle {
    pub coord: ChunkCoord,
    pub generation: u64,
    pub meshes: Arc<ChunkMeshes>,
}

pub struct Engine {
    config: EngineConfig,
    world: Arc<World>,
    streaming: StreamingEngine,
    scheduler: TickScheduler,
    clock: Box<dyn Clock>,
    focus: Vec3,
}

impl Engine {
    pub fn new(config: EngineConfig, clock: Box<dyn Clock>) -> Result<Self, EngineError> {
        config.validate()?;

        let catalog = Arc::new(BlockCatalog::builtin());
        let ocean = OceanField::from_config(
            config.world.seed,
            config.world.sea_level as f32,
            &config.ocean,
        )?;
        let world = Arc::new(World::new(config.world.clone(), catalog.clone(), ocean));
        let generator = Arc::new(TerrainGenerator::new(
            config.world.seed,
            config.world.sea_level,
            catalog,
        ));
        let streaming = StreamingEngine::new(config.streaming.clone(), world.clone(), generator)?;
        let scheduler = TickScheduler::new(&config.physics);

        Ok(Self {
            config,
            world,
            streaming,
            scheduler,
            clock,
            focus: Vec3::new(0.0, 0.0, 0.0),
        })
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Streaming follows this point; usually the primary ship or player.
    pub fn set_focus(&mut self, focus: Vec3) {
        self.focus = focus;
    }

    /// Simulation time the ocean field is being sampled at.
    pub fn sim_time(&self) -> f64 {
        self.scheduler.sim_time()
    }

    /// Interpolation alpha for the renderer, in [0, 1].
    pub fn alpha(&self) -> f32 {
        self.scheduler.alpha()
    }

    pub fn streaming_stats(&self) -> StreamingStatsSnapshot {
        self.streaming.stats()
    }

    /// One host frame: run 0..max_substeps fixed physics steps, then one
    /// streaming pass.
    pub fn update(&mut self) {
        let now = self.clock.now();
        let steps = self.scheduler.begin_frame(now);
        let dt = self.scheduler.fixed_dt();

        for _ in 0..steps {
            let time = self.scheduler.sim_time() as f32;
            ship::step_ships(&self.world, dt, time, &self.config.physics);
            ship::projectile::step_projectiles(&self.world, dt, time, &self.config.physics);
            self.scheduler.consume_step();
        }

        let focus_chunk = ChunkCoord::from_block(self.focus.x.floor() as i32, self.focus.z.floor() as i32);
        self.streaming.pump(focus_chunk);
    }

    // ---- renderer feed ---------------------------------------------------

    /// Committed meshes of chunks whose bounds intersect the frustum.
    pub fn visible_chunks(&self, frustum: &Frustum) -> Vec<MeshHandle> {
        let mut handles = Vec::new();
        for coord in self.world.loaded_coords() {
            let Some(slot) = self.world.slot(coord) else {
                continue;
            };
            let chunk = slot.read();
            let Some(meshes) = chunk.meshes() else {
                continue;
            };
            let (bx, bz) = coord.base();
            let bounds = Aabb::new(
                Vec3::new(bx as f32, 0.0, bz as f32),
                Vec3::new(
                    (bx + CHUNK_SIZE as i32) as f32,
                    CHUNK_HEIGHT as f32,
                    (bz + CHUNK_SIZE as i32) as f32,
                ),
            );
            if frustum.intersects_aabb(&bounds) {
                handles.push(MeshHandle {
                    coord,
                    generation: chunk.mesh_generation(),
                    meshes: meshes.clone(),
                });
            }
        }
        handles
    }

    /// Mesh buffers replaced since the last drain. Call after the render
    /// fence; dropping the returned handles frees the buffers.
    pub fn drain_retired_meshes(&self) -> Vec<Arc<ChunkMeshes>> {
        self.streaming.drain_retired_meshes()
    }

    // ---- physics client --------------------------------------------------

    pub fn spawn_ship(
        &self,
        position: Vec3,
        half_extents: Vec3,
        components: Vec<ShipComponent>,
    ) -> ShipId {
        self.world
            .spawn_ship(|id| ShipBody::new(id, position, half_extents, components))
    }

    pub fn despawn_ship(&self, id: ShipId) -> bool {
        self.world.despawn_ship(id)
    }

    pub fn ship_snapshot(&self, id: ShipId) -> Option<ShipSnapshot> {
        self.world.ship_snapshot(id)
    }

    /// Inject a point impulse (cannonball impact, collision response) into
    /// a ship. Takes effect immediately on the velocity state.
    pub fn apply_impulse(
        &self,
        id: ShipId,
        impulse: Vec3,
        world_point: Vec3,
    ) -> Result<(), EngineError> {
        self.world
            .with_ship_mut(id, |body| body.apply_impulse(impulse, world_point))
            .ok_or(EngineError::UnknownShip(id))
    }

    /// Component-level damage hook; force effects propagate on the next
    /// tick.
    pub fn damage_ship_component(
        &self,
        id: ShipId,
        component_index: usize,
        amount: f32,
    ) -> Result<bool, EngineError> {
        self.world
            .with_ship_mut(id, |body| body.damage_component(component_index, amount))
            .ok_or(EngineError::UnknownShip(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveComponentConfig;
    use crate::sim::ManualClock;
    use glam::Mat4;
    use std::time::{Duration, Instant};

    fn test_config(load: i32, keep: i32) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.world.seed = 0xC0FFEE;
        config.streaming.load_radius_chunks = load;
        config.streaming.keep_radius_chunks = keep;
        config.streaming.worker_threads = 2;
        config
    }

    fn engine_with_clock(load: i32, keep: i32) -> (Engine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let handle = clock.clone();
        struct Shared(Arc<ManualClock>);
        impl Clock for Shared {
            fn now(&self) -> f64 {
                self.0.now()
            }
        }
        let engine = Engine::new(test_config(load, keep), Box::new(Shared(clock))).unwrap();
        (engine, handle)
    }

    #[test]
    fn test_invalid_config_fails_at_init() {
        let mut config = test_config(2, 3);
        config.ocean.wave_components.clear();
        let result = Engine::new(config, Box::new(ManualClock::new()));
        assert!(matches!(result, Err(EngineError::ConfigInvalid(_))));
    }

    #[test]
    fn test_fixed_steps_follow_injected_clock() {
        let (mut engine, clock) = engine_with_clock(1, 2);
        engine.update();
        assert_eq!(engine.sim_time(), 0.0);

        clock.advance(0.1);
        engine.update();
        // 0.1 s drains in whole fixed steps; anything left stays in the
        // accumulator for the next frame.
        let dt = engine.config().physics.fixed_dt as f64;
        let t = engine.sim_time();
        assert!(t > 0.1 - dt - 1e-9 && t <= 0.1 + 1e-9, "sim time {t}");
        assert!((t / dt).fract().abs() < 1e-6 || (1.0 - (t / dt).fract()).abs() < 1e-6);
    }

    #[test]
    fn test_ship_physics_runs_inside_update() {
        let (mut engine, clock) = engine_with_clock(1, 2);
        let ship = engine.spawn_ship(
            Vec3::new(0.0, 120.0, 0.0),
            Vec3::ONE,
            vec![crate::ship::ShipComponent::hull(Vec3::ZERO, 1000.0, 1.0)],
        );

        engine.update();
        for _ in 0..30 {
            clock.advance(1.0 / 60.0);
            engine.update();
        }
        let snapshot = engine.ship_snapshot(ship).unwrap();
        // Free fall above the water: gravity had half a second to act.
        assert!(snapshot.linear_velocity.y < -1.0);
        assert!(snapshot.position.y < 120.0);
    }

    #[test]
    fn test_impulse_injection_changes_snapshot() {
        let (engine, _clock) = engine_with_clock(1, 2);
        let ship = engine.spawn_ship(
            Vec3::new(0.0, 64.0, 0.0),
            Vec3::ONE,
            vec![crate::ship::ShipComponent::hull(Vec3::ZERO, 1000.0, 1.0)],
        );
        engine
            .apply_impulse(ship, Vec3::new(2000.0, 0.0, 0.0), Vec3::new(0.0, 64.0, 0.0))
            .unwrap();
        let snapshot = engine.ship_snapshot(ship).unwrap();
        assert!((snapshot.linear_velocity.x - 2.0).abs() < 1e-4);

        assert!(matches!(
            engine.apply_impulse(ShipId(999), Vec3::X, Vec3::ZERO),
            Err(EngineError::UnknownShip(_))
        ));
    }

    #[test]
    fn test_visible_chunks_deliver_mesh_handles() {
        let (mut engine, clock) = engine_with_clock(2, 3);
        engine.set_focus(Vec3::new(8.0, 70.0, 8.0));

        // Pump until the focus chunk is meshed.
        let start = Instant::now();
        loop {
            clock.advance(1.0 / 60.0);
            engine.update();
            if matches!(
                engine.world().stage_of(ChunkCoord::new(0, 0)),
                Some(crate::world::Stage::Meshed)
            ) {
                break;
            }
            assert!(start.elapsed() < Duration::from_secs(60), "streaming stalled");
            std::thread::sleep(Duration::from_millis(2));
        }

        let view = Mat4::look_at_rh(Vec3::new(8.0, 90.0, 40.0), Vec3::new(8.0, 64.0, 8.0), Vec3::Y);
        let proj = Mat4::perspective_rh(70f32.to_radians(), 16.0 / 9.0, 0.1, 2000.0);
        let frustum = Frustum::from_view_projection(&(proj * view));

        let handles = engine.visible_chunks(&frustum);
        assert!(!handles.is_empty());
        assert!(handles.iter().any(|h| h.coord == ChunkCoord::new(0, 0)));
        for handle in &handles {
            assert!(handle.generation >= 1);
        }
    }

    #[test]
    fn test_tide_moves_water_over_sim_time() {
        let mut config = test_config(1, 2);
        config.ocean.wave_components = vec![WaveComponentConfig {
            amplitude: 0.0,
            wavelength: 20.0,
            direction_deg: 0.0,
            speed: 4.0,
            phase: 0.0,
        }];
        let engine = Engine::new(config, Box::new(ManualClock::new())).unwrap();

        let low = engine.world().water_height_at(0.0, 0.0, 0.0);
        let high = engine.world().water_height_at(0.0, 0.0, 600.0);
        let swing = (high - low).abs();
        let expected = engine.config().ocean.tide_amplitude;
        assert!((swing - expected).abs() <= expected * 0.05);
    }
}
