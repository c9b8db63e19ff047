//! Ship component samples.
//!
//! Components are tagged variants stored contiguously on the ship body; a
//! single force pass dispatches per tag. They carry no simulation state of
//! their own beyond the engine's internals; shared state (velocity,
//! orientation, accumulators) lives on the body.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Running,
    OverheatShutdown,
    OverpressureShutdown,
    OutOfFuel,
}

/// Temperature above which the engine shuts down hard.
pub const OVERHEAT_LIMIT_C: f32 = 140.0;
/// Derating starts here; output falls off linearly up to the limit.
pub const DERATE_START_C: f32 = 100.0;
/// Boiler pressure shutdown threshold, kPa.
pub const OVERPRESSURE_LIMIT_KPA: f32 = 260.0;
/// Thrust lost at full wear.
pub const WEAR_PENALTY: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct EngineState {
    /// Commanded power in [0, 1].
    pub power_command: f32,
    /// Remaining fuel, kg.
    pub fuel: f32,
    /// Fuel burn at full power, kg/s.
    pub burn_rate: f32,
    pub fuel_efficiency: f32,
    pub crew_efficiency: f32,
    /// Accumulated wear in [0, 1].
    pub wear: f32,
    pub temperature: f32,
    pub boiler_pressure: f32,
    pub status: EngineStatus,
    /// Thrust at nominal full output, newtons.
    pub max_thrust: f32,
}

impl EngineState {
    pub fn new(max_thrust: f32, fuel: f32) -> Self {
        Self {
            power_command: 0.0,
            fuel,
            burn_rate: 0.12,
            fuel_efficiency: 0.95,
            crew_efficiency: 1.0,
            wear: 0.0,
            temperature: 20.0,
            boiler_pressure: 100.0,
            status: EngineStatus::Running,
            max_thrust,
        }
    }

    /// Advance thermal/fuel state and re-evaluate catastrophic shutdowns.
    pub fn update(&mut self, dt: f32) {
        if self.status == EngineStatus::Running {
            let load = self.power_command.clamp(0.0, 1.0);
            self.fuel = (self.fuel - load * self.burn_rate * dt).max(0.0);
            // Heats toward a load-dependent setpoint, cools toward ambient.
            let setpoint = 20.0 + 115.0 * load;
            let rate = if setpoint > self.temperature { 2.4 } else { 1.1 };
            self.temperature += (setpoint - self.temperature) * (rate * dt).min(1.0);
            self.boiler_pressure = 100.0 + 100.0 * load + (self.temperature - 20.0) * 0.25;
        } else {
            self.temperature += (20.0 - self.temperature) * (0.6 * dt).min(1.0);
            self.boiler_pressure += (100.0 - self.boiler_pressure) * (0.6 * dt).min(1.0);
        }

        // Catastrophic states kill thrust immediately.
        if self.temperature >= OVERHEAT_LIMIT_C {
            self.status = EngineStatus::OverheatShutdown;
        } else if self.boiler_pressure >= OVERPRESSURE_LIMIT_KPA {
            self.status = EngineStatus::OverpressureShutdown;
        } else if self.fuel <= 0.0 {
            self.status = EngineStatus::OutOfFuel;
        }
    }

    /// Current thrust in newtons. Zero for any shutdown status.
    pub fn thrust(&self) -> f32 {
        if self.status != EngineStatus::Running {
            return 0.0;
        }
        let derate = if self.temperature <= DERATE_START_C {
            1.0
        } else {
            let over = (self.temperature - DERATE_START_C) / (OVERHEAT_LIMIT_C - DERATE_START_C);
            (1.0 - 0.6 * over).max(0.0)
        };
        self.max_thrust
            * self.power_command.clamp(0.0, 1.0)
            * self.fuel_efficiency
            * self.crew_efficiency
            * (1.0 - self.wear * WEAR_PENALTY)
            * derate
    }

    /// Manual restart after the fault is cleared.
    pub fn try_restart(&mut self) -> bool {
        let clear = self.temperature < OVERHEAT_LIMIT_C * 0.9
            && self.boiler_pressure < OVERPRESSURE_LIMIT_KPA * 0.9
            && self.fuel > 0.0;
        if clear {
            self.status = EngineStatus::Running;
        }
        clear
    }
}

/// Capability tag of a component sample.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    /// Displaces water; `volume` is the sample's displaced volume in m³
    /// when fully submerged.
    Hull { volume: f32 },
    /// Catches wind over `area` m²; `normal` is the sail facing in ship
    /// space and encodes the current trim.
    Sail { area: f32, normal: Vec3 },
    Engine(EngineState),
    /// Mount point used by combat gameplay; contributes mass and drag only.
    CannonMount,
}

/// A point-mass sample at which buoyancy, drag, wind, and thrust are
/// evaluated.
#[derive(Debug, Clone)]
pub struct ShipComponent {
    /// Position in ship-local space, meters from the hull origin.
    pub local_position: Vec3,
    pub mass: f32,
    pub health: f32,
    pub kind: ComponentKind,
}

impl ShipComponent {
    pub fn hull(local_position: Vec3, mass: f32, volume: f32) -> Self {
        Self {
            local_position,
            mass,
            health: 100.0,
            kind: ComponentKind::Hull { volume },
        }
    }

    pub fn sail(local_position: Vec3, mass: f32, area: f32, normal: Vec3) -> Self {
        Self {
            local_position,
            mass,
            health: 100.0,
            kind: ComponentKind::Sail {
                area,
                normal: normal.normalize(),
            },
        }
    }

    pub fn engine(local_position: Vec3, mass: f32, state: EngineState) -> Self {
        Self {
            local_position,
            mass,
            health: 100.0,
            kind: ComponentKind::Engine(state),
        }
    }

    pub fn cannon_mount(local_position: Vec3, mass: f32) -> Self {
        Self {
            local_position,
            mass,
            health: 100.0,
            kind: ComponentKind::CannonMount,
        }
    }

    /// Destroyed components contribute zero force, never NaN.
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    pub fn apply_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}
