use super::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Fixed simulation step in seconds.
    pub fixed_dt: f32,
    /// Ceiling on physics steps per frame so a long stall cannot spiral.
    pub max_substeps: u32,
    /// Gravitational acceleration, m/s².
    pub gravity: f32,
    /// Sea-water density, kg/m³.
    pub water_density: f32,
    /// Air density, kg/m³, for sail forces.
    pub air_density: f32,
    /// Linear drag per m³ of submerged volume, kg/s.
    pub linear_drag_submerged: f32,
    /// Quadratic drag per m³ of submerged volume, kg/m.
    pub quadratic_drag_submerged: f32,
    /// Quadratic drag applied to airborne hull area, kg/m.
    pub quadratic_drag_airborne: f32,
    /// Quadratic angular drag, N·m·s².
    pub angular_drag: f32,
    /// Instability guard bounds; exceeding them twice in a row clamps.
    pub max_linear_speed: f32,
    pub max_angular_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_substeps: 8,
            gravity: 9.81,
            water_density: 1025.0,
            air_density: 1.225,
            linear_drag_submerged: 300.0,
            quadratic_drag_submerged: 180.0,
            quadratic_drag_airborne: 4.0,
            angular_drag: 2500.0,
            max_linear_speed: 80.0,
            max_angular_speed: 8.0,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_dt <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_dt must be positive, got {}",
                self.fixed_dt
            )));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid(
                "max_substeps must be at least 1".into(),
            ));
        }
        if self.max_linear_speed <= 0.0 || self.max_angular_speed <= 0.0 {
            return Err(ConfigError::Invalid(
                "instability speed bounds must be positive".into(),
            ));
        }
        Ok(())
    }
}
