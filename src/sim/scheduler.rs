//! Fixed-step simulation clock.
//!
//! Wall-clock frames accumulate elapsed time and drain it in fixed `dt`
//! physics steps, capped per frame so a long stall degrades instead of
//! spiraling. Between steps the scheduler exposes an interpolation alpha so
//! the renderer can blend ship poses.

use crate::config::PhysicsConfig;

pub struct TickScheduler {
    fixed_dt: f32,
    max_substeps: u32,
    accumulator: f64,
    last_now: Option<f64>,
    /// Simulation-time seconds; the ocean field samples at this time.
    sim_time: f64,
    steps_total: u64,
}

impl TickScheduler {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            fixed_dt: config.fixed_dt,
            max_substeps: config.max_substeps,
            accumulator: 0.0,
            last_now: None,
            sim_time: 0.0,
            steps_total: 0,
        }
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Current simulation time, advanced by `fixed_dt` per executed step.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn steps_total(&self) -> u64 {
        self.steps_total
    }

    /// Account a new frame at wall-clock `now` and return how many fixed
    /// steps to run. Excess backlog beyond the substep ceiling is dropped.
    pub fn begin_frame(&mut self, now: f64) -> u32 {
        let elapsed = match self.last_now {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last_now = Some(now);
        self.accumulator += elapsed;

        let mut steps = (self.accumulator / self.fixed_dt as f64) as u32;
        if steps > self.max_substeps {
            steps = self.max_substeps;
            // Spiral-of-death guard: drop the time we will never simulate.
            self.accumulator = self.fixed_dt as f64 * steps as f64;
        }
        steps
    }

    /// Consume one fixed step's worth of accumulated time.
    pub fn consume_step(&mut self) {
        self.accumulator -= self.fixed_dt as f64;
        self.sim_time += self.fixed_dt as f64;
        self.steps_total += 1;
    }

    /// Interpolation factor in [0, 1]: how far the render frame sits between
    /// the last and the next physics step.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.fixed_dt as f64).clamp(0.0, 1.0) as f32
    }
}
