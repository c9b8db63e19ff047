use super::ConfigError;
use serde::{Deserialize, Serialize};

/// One directional sine component of the wave spectrum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveComponentConfig {
    /// Peak height above mean water, meters.
    pub amplitude: f32,
    /// Crest-to-crest distance, meters.
    pub wavelength: f32,
    /// Travel direction, degrees clockwise from +X.
    pub direction_deg: f32,
    /// Phase speed, m/s.
    pub speed: f32,
    /// Initial phase offset, radians.
    pub phase: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OceanConfig {
    pub wave_components: Vec<WaveComponentConfig>,
    /// Full tidal cycle, seconds. Trough-to-crest takes half of it.
    pub tide_period_seconds: f32,
    /// Trough-to-crest tidal range, meters.
    pub tide_amplitude: f32,
    /// Spatial/temporal scale of the wind noise channel.
    pub wind_noise_scale: f32,
    /// Spatial scale of the current vector field.
    pub current_noise_scale: f32,
    /// Edge length of the coarse grid the current field is sampled on.
    pub current_cell_size: f32,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            wave_components: vec![
                WaveComponentConfig {
                    amplitude: 0.55,
                    wavelength: 42.0,
                    direction_deg: 15.0,
                    speed: 7.2,
                    phase: 0.0,
                },
                WaveComponentConfig {
                    amplitude: 0.30,
                    wavelength: 23.0,
                    direction_deg: 68.0,
                    speed: 5.1,
                    phase: 1.3,
                },
                WaveComponentConfig {
                    amplitude: 0.18,
                    wavelength: 11.0,
                    direction_deg: 204.0,
                    speed: 3.4,
                    phase: 4.1,
                },
                WaveComponentConfig {
                    amplitude: 0.09,
                    wavelength: 5.5,
                    direction_deg: 131.0,
                    speed: 2.2,
                    phase: 2.6,
                },
            ],
            tide_period_seconds: 1200.0,
            tide_amplitude: 1.2,
            wind_noise_scale: 0.011,
            current_noise_scale: 0.0017,
            current_cell_size: 64.0,
        }
    }
}

impl OceanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wave_components.is_empty() {
            return Err(ConfigError::Invalid(
                "ocean needs at least one wave component".into(),
            ));
        }
        for (i, wave) in self.wave_components.iter().enumerate() {
            if wave.wavelength <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "wave component {i} has non-positive wavelength"
                )));
            }
            if wave.amplitude < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "wave component {i} has negative amplitude"
                )));
            }
        }
        if self.tide_period_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "tide_period_seconds must be positive".into(),
            ));
        }
        if self.current_cell_size <= 0.0 {
            return Err(ConfigError::Invalid(
                "current_cell_size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Worst-case wave contribution above/below mean water.
    pub fn wave_height_bound(&self) -> f32 {
        self.wave_components.iter().map(|w| w.amplitude).sum()
    }
}
