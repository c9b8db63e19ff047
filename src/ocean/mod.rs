//! The shared ocean state: a small directional wave spectrum, a slowly
//! evolving wind, a coarse current field, and the tide.
//!
//! Every sampler is a pure function of position and time; the field carries
//! no per-call state, so physics and meshing can read it from any thread
//! while a tick is in flight. Parameter changes swap the whole field
//! between ticks.

use crate::config::{ConfigError, OceanConfig};
use crate::noisefield::{NoiseField, CHANNEL_CURRENT, CHANNEL_WIND};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone)]
pub struct WaveComponent {
    pub amplitude: f32,
    /// Spatial frequency, 2π / wavelength.
    pub wavenumber: f32,
    /// Unit travel direction in the horizontal plane.
    pub direction: Vec2,
    /// Temporal frequency, wavenumber · phase speed.
    pub angular_speed: f32,
    pub phase: f32,
}

pub struct OceanField {
    sea_level: f32,
    components: Vec<WaveComponent>,
    tide_period: f32,
    tide_amplitude: f32,
    wind_noise: NoiseField,
    current_noise: NoiseField,
    wind_scale: f64,
    current_scale: f64,
    current_cell: f32,
}

impl OceanField {
    pub fn from_config(seed: u64, sea_level: f32, config: &OceanConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let components = config
            .wave_components
            .iter()
            .map(|w| {
                let k = std::f32::consts::TAU / w.wavelength;
                let theta = w.direction_deg.to_radians();
                WaveComponent {
                    amplitude: w.amplitude,
                    wavenumber: k,
                    direction: Vec2::new(theta.cos(), theta.sin()),
                    angular_speed: k * w.speed,
                    phase: w.phase,
                }
            })
            .collect();

        Ok(Self {
            sea_level,
            components,
            tide_period: config.tide_period_seconds,
            tide_amplitude: config.tide_amplitude,
            wind_noise: NoiseField::channel(seed, CHANNEL_WIND),
            current_noise: NoiseField::channel(seed, CHANNEL_CURRENT),
            wind_scale: config.wind_noise_scale as f64,
            current_scale: config.current_noise_scale as f64,
            current_cell: config.current_cell_size,
        })
    }

    pub fn sea_level(&self) -> f32 {
        self.sea_level
    }

    /// Wave displacement above/below mean water at (x, z).
    pub fn wave_offset(&self, x: f32, z: f32, t: f32) -> f32 {
        let mut h = 0.0;
        for wave in &self.components {
            let along = x * wave.direction.x + z * wave.direction.y;
            h += wave.amplitude
                * (wave.wavenumber * along - wave.angular_speed * t + wave.phase).sin();
        }
        h
    }

    /// Absolute water-surface height: sea level + tide + waves.
    pub fn sample_height(&self, x: f32, z: f32, t: f32) -> f32 {
        self.sea_level + self.tide_offset(t) + self.wave_offset(x, z, t)
    }

    /// Surface normal by central finite difference of the height field.
    pub fn sample_normal(&self, x: f32, z: f32, t: f32) -> Vec3 {
        const H: f32 = 0.25;
        let dx = self.sample_height(x + H, z, t) - self.sample_height(x - H, z, t);
        let dz = self.sample_height(x, z + H, t) - self.sample_height(x, z - H, t);
        Vec3::new(-dx / (2.0 * H), 1.0, -dz / (2.0 * H)).normalize()
    }

    /// Triangle wave over the tidal period: 0 at slack low, 1 at slack high.
    pub fn tidal_phase(&self, t: f32) -> f32 {
        let p = (t / self.tide_period).rem_euclid(1.0);
        1.0 - (2.0 * p - 1.0).abs()
    }

    /// Mean-sea-level displacement from the tide, centered on zero.
    pub fn tide_offset(&self, t: f32) -> f32 {
        self.tide_amplitude * (self.tidal_phase(t) - 0.5)
    }

    /// Process-wide wind vector: direction times strength in [0, 1].
    pub fn wind(&self, t: f32) -> Vec2 {
        let t = t as f64 * self.wind_scale;
        let angle = self.wind_noise.fractal2(t, 17.31, 3, 0.5, 2.0) * std::f64::consts::PI * 2.0;
        let strength = 0.5 + 0.5 * self.wind_noise.fractal2(t, -4.87, 3, 0.5, 2.0);
        Vec2::new(angle.cos() as f32, angle.sin() as f32) * (strength.clamp(0.0, 1.0) as f32)
    }

    /// Surface current at (x, z), sampled on a coarse grid so neighboring
    /// queries inside one cell agree.
    pub fn current(&self, x: f32, z: f32, t: f32) -> Vec2 {
        let cx = (x / self.current_cell).floor() as f64 * self.current_scale * 64.0;
        let cz = (z / self.current_cell).floor() as f64 * self.current_scale * 64.0;
        let t = t as f64 * 0.003;
        let u = self.current_noise.fractal3(cx, cz, t, 3, 0.5, 2.0);
        let v = self.current_noise.fractal3(cx + 101.7, cz - 33.2, t, 3, 0.5, 2.0);
        Vec2::new(u as f32, v as f32)
    }

    /// Hard bounds on the surface height, used by tests and by callers that
    /// want conservative envelopes.
    pub fn height_bounds(&self) -> (f32, f32) {
        let wave_sum: f32 = self.components.iter().map(|w| w.amplitude).sum();
        let half_tide = self.tide_amplitude * 0.5;
        (
            self.sea_level - half_tide - wave_sum,
            self.sea_level + half_tide + wave_sum,
        )
    }
}
