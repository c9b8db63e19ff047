//! Ship rigid-body dynamics driven by the ocean field.
//!
//! Forces are evaluated at component samples (buoyancy, drag, wind, thrust),
//! integrated semi-implicitly at the fixed physics step, with a quaternion
//! orientation update and an instability guard that clamps runaway
//! velocities instead of letting NaNs spread.

pub mod collision;
pub mod component;
pub mod projectile;

pub use component::{ComponentKind, EngineState, EngineStatus, ShipComponent};
pub use projectile::{Projectile, ProjectileId, ProjectileKind};

use crate::config::PhysicsConfig;
use crate::ocean::OceanField;
use crate::utils::error::EngineError;
use crate::utils::math::Obb;
use crate::world::World;
use glam::{Quat, Vec3};

/// Stable ship identifier; combat and projectiles reference ships by id,
/// never by pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShipId(pub u64);

/// Wind strength 1.0 from the ocean field corresponds to this airspeed.
const WIND_SPEED_SCALE: f32 = 18.0;
/// Extra linear angular damping as a fraction of submerged linear drag.
const ANGULAR_LINEAR_DRAG: f32 = 0.2;

/// State snapshot handed to the physics client each tick.
#[derive(Debug, Clone, Copy)]
pub struct ShipSnapshot {
    pub id: ShipId,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

pub struct ShipBody {
    id: ShipId,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    components: Vec<ShipComponent>,
    mass: f32,
    inv_mass: f32,
    /// Diagonal inertia approximation in body space.
    inertia: Vec3,
    inv_inertia: Vec3,
    /// Center of mass in ship-local space, aggregated from components.
    center_of_mass: Vec3,
    half_extents: Vec3,
    force_accum: Vec3,
    torque_accum: Vec3,
    over_speed_strikes: u8,
}

impl ShipBody {
    pub fn new(
        id: ShipId,
        position: Vec3,
        half_extents: Vec3,
        components: Vec<ShipComponent>,
    ) -> Self {
        let mass: f32 = components.iter().map(|c| c.mass).sum::<f32>().max(1.0);
        let center_of_mass = components
            .iter()
            .map(|c| c.local_position * c.mass)
            .sum::<Vec3>()
            / mass;

        // Solid-box inertia around the principal axes.
        let d = half_extents * 2.0;
        let inertia = Vec3::new(
            mass / 12.0 * (d.y * d.y + d.z * d.z),
            mass / 12.0 * (d.x * d.x + d.z * d.z),
            mass / 12.0 * (d.x * d.x + d.y * d.y),
        );

        Self {
            id,
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            components,
            mass,
            inv_mass: 1.0 / mass,
            inertia,
            inv_inertia: Vec3::new(1.0 / inertia.x, 1.0 / inertia.y, 1.0 / inertia.z),
            center_of_mass,
            half_extents,
            force_accum: Vec3::ZERO,
            torque_accum: Vec3::ZERO,
            over_speed_strikes: 0,
        }
    }

    pub fn id(&self) -> ShipId {
        self.id
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Diagonal body-space inertia tensor approximation.
    pub fn inertia(&self) -> Vec3 {
        self.inertia
    }

    pub fn components(&self) -> &[ShipComponent] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [ShipComponent] {
        &mut self.components
    }

    /// Forward direction; hulls face -Z in local space.
    pub fn heading(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn center_of_mass_world(&self) -> Vec3 {
        self.position + self.orientation * self.center_of_mass
    }

    pub fn component_world_position(&self, component: &ShipComponent) -> Vec3 {
        self.position + self.orientation * component.local_position
    }

    pub fn obb(&self) -> Obb {
        Obb::new(self.position, self.half_extents, self.orientation)
    }

    pub fn snapshot(&self) -> ShipSnapshot {
        ShipSnapshot {
            id: self.id,
            position: self.position,
            orientation: self.orientation,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
        }
    }

    /// Component-level damage hook for the physics client. Effects propagate
    /// into the force pass on the next tick.
    pub fn damage_component(&mut self, index: usize, amount: f32) -> bool {
        match self.components.get_mut(index) {
            Some(component) => {
                component.apply_damage(amount);
                true
            }
            None => false,
        }
    }

    /// Continuous force applied at a world-space point for the rest of the
    /// current step.
    pub fn apply_force_at(&mut self, force: Vec3, world_point: Vec3) {
        self.force_accum += force;
        self.torque_accum += (world_point - self.center_of_mass_world()).cross(force);
    }

    /// Instantaneous impulse (e.g. a cannonball impact) at a world point.
    pub fn apply_impulse(&mut self, impulse: Vec3, world_point: Vec3) {
        self.linear_velocity += impulse * self.inv_mass;
        let r = world_point - self.center_of_mass_world();
        let angular_impulse = r.cross(impulse);
        let body = self.orientation.inverse() * angular_impulse;
        self.angular_velocity += self.orientation * (body * self.inv_inertia);
    }

    /// Total submerged displaced volume given the instantaneous water
    /// surface, m³.
    pub fn submerged_volume(&self, ocean: &OceanField, time: f32) -> f32 {
        self.components
            .iter()
            .filter(|c| !c.is_destroyed())
            .map(|c| {
                if let ComponentKind::Hull { volume } = &c.kind {
                    let p = self.component_world_position(c);
                    let water = ocean.sample_height(p.x, p.z, time);
                    volume * submerged_fraction(p.y, water)
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// Run the per-step force pass: gravity, buoyancy, drag, wind, thrust.
    fn accumulate_forces(&mut self, ocean: &OceanField, config: &PhysicsConfig, time: f32) {
        let com_world = self.center_of_mass_world();
        self.force_accum += Vec3::new(0.0, -config.gravity * self.mass, 0.0);

        let wind2 = ocean.wind(time) * WIND_SPEED_SCALE;
        let wind = Vec3::new(wind2.x, 0.0, wind2.y);
        let current2 = ocean.current(self.position.x, self.position.z, time);
        let water_velocity = Vec3::new(current2.x, 0.0, current2.y);

        let mut submerged = 0.0f32;
        let mut airborne_area = 0.0f32;
        let heading = self.heading();

        // Split borrows: forces are pushed into locals and folded in below so
        // the component iteration can stay immutable.
        let mut pending: Vec<(Vec3, Vec3)> = Vec::with_capacity(self.components.len());

        for component in &self.components {
            if component.is_destroyed() {
                continue;
            }
            let world_pos = self.position + self.orientation * component.local_position;

            match &component.kind {
                ComponentKind::Hull { volume } => {
                    let water = ocean.sample_height(world_pos.x, world_pos.z, time);
                    let fraction = submerged_fraction(world_pos.y, water);
                    submerged += volume * fraction;
                    if fraction < 1.0 {
                        airborne_area += (1.0 - fraction) * volume.cbrt().powi(2);
                    }
                    if fraction > 0.0 {
                        let lift = config.water_density * config.gravity * volume * fraction;
                        pending.push((Vec3::new(0.0, lift, 0.0), world_pos));
                    }
                }
                ComponentKind::Sail { area, normal } => {
                    let apparent = wind - self.linear_velocity;
                    let speed = apparent.length();
                    if speed > 1e-3 {
                        let normal_world = self.orientation * *normal;
                        // Trim: force scales with how squarely the sail
                        // faces the apparent wind.
                        let facing = normal_world.dot(apparent / speed).abs();
                        let force =
                            apparent * (0.5 * config.air_density * area * facing * speed);
                        pending.push((force, world_pos));
                    }
                }
                ComponentKind::Engine(engine) => {
                    let thrust = engine.thrust();
                    if thrust > 0.0 {
                        pending.push((heading * thrust, world_pos));
                    }
                }
                ComponentKind::CannonMount => {}
            }
        }

        for (force, at) in pending {
            self.force_accum += force;
            self.torque_accum += (at - com_world).cross(force);
        }

        // Hydrodynamic drag against the local water motion, plus a smaller
        // quadratic term for the airborne part of the hull.
        let rel = self.linear_velocity - water_velocity;
        let rel_speed = rel.length();
        self.force_accum -= rel
            * (config.linear_drag_submerged * submerged
                + config.quadratic_drag_submerged * submerged * rel_speed);
        self.force_accum -=
            self.linear_velocity * (config.quadratic_drag_airborne * airborne_area * self.linear_velocity.length());

        let spin = self.angular_velocity.length();
        self.torque_accum -= self.angular_velocity
            * (config.angular_drag * spin
                + ANGULAR_LINEAR_DRAG * config.linear_drag_submerged * submerged);
    }

    fn integrate(&mut self, dt: f32, config: &PhysicsConfig) -> Result<(), EngineError> {
        let prev_position = self.position;
        let prev_orientation = self.orientation;

        self.linear_velocity += self.force_accum * self.inv_mass * dt;
        let torque_body = self.orientation.inverse() * self.torque_accum;
        let mut omega_body = self.orientation.inverse() * self.angular_velocity;
        omega_body += torque_body * self.inv_inertia * dt;
        self.angular_velocity = self.orientation * omega_body;

        self.position += self.linear_velocity * dt;
        let spin = Quat::from_xyzw(
            self.angular_velocity.x,
            self.angular_velocity.y,
            self.angular_velocity.z,
            0.0,
        );
        self.orientation = (self.orientation + spin * self.orientation * (0.5 * dt)).normalize();

        self.force_accum = Vec3::ZERO;
        self.torque_accum = Vec3::ZERO;

        // NaN/Inf anywhere: zero velocities, keep the last good pose, and
        // surface a recoverable error.
        if !self.position.is_finite()
            || !self.orientation.is_finite()
            || !self.linear_velocity.is_finite()
            || !self.angular_velocity.is_finite()
        {
            self.position = prev_position;
            self.orientation = prev_orientation;
            self.linear_velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
            self.over_speed_strikes = 0;
            return Err(EngineError::SimulationInstability(self.id));
        }

        self.guard_speed(config);
        Ok(())
    }

    fn guard_speed(&mut self, config: &PhysicsConfig) {
        let linear = self.linear_velocity.length();
        let angular = self.angular_velocity.length();
        if linear > config.max_linear_speed || angular > config.max_angular_speed {
            if linear > config.max_linear_speed {
                self.linear_velocity *= config.max_linear_speed / linear;
            }
            if angular > config.max_angular_speed {
                self.angular_velocity *= config.max_angular_speed / angular;
            }
            self.over_speed_strikes = self.over_speed_strikes.saturating_add(1);
            if self.over_speed_strikes >= 2 {
                log::warn!("ship {:?} exceeded speed bounds twice, clamped", self.id);
            }
        } else {
            self.over_speed_strikes = 0;
        }
    }

    /// One fixed physics step. `world` enables hull-vs-terrain collision;
    /// headless tests pass `None`.
    pub fn step(
        &mut self,
        dt: f32,
        time: f32,
        ocean: &OceanField,
        world: Option<&World>,
        config: &PhysicsConfig,
    ) -> Result<(), EngineError> {
        for component in &mut self.components {
            if let ComponentKind::Engine(engine) = &mut component.kind {
                engine.update(dt);
            }
        }

        self.accumulate_forces(ocean, config, time);
        self.integrate(dt, config)?;

        if let Some(world) = world {
            self.resolve_terrain_contact(world);
        }
        Ok(())
    }

    /// Keel-line capsule test against solid voxels; grounding pushes the
    /// hull out and kills the velocity component into the contact.
    fn resolve_terrain_contact(&mut self, world: &World) {
        let keel_drop = self.half_extents.y;
        let bow = self.position + self.orientation * Vec3::new(0.0, -keel_drop, -self.half_extents.z);
        let stern = self.position + self.orientation * Vec3::new(0.0, -keel_drop, self.half_extents.z);

        if let Some(push) = collision::capsule_push_out(world, bow, stern, self.half_extents.x.min(1.5))
        {
            self.position += push;
            let normal = push.normalize_or_zero();
            let into = self.linear_velocity.dot(normal);
            if into < 0.0 {
                self.linear_velocity -= normal * into;
            }
        }
    }
}

fn submerged_fraction(sample_y: f32, water_y: f32) -> f32 {
    // Component samples stand in for 1 m³ of hull centered on the sample.
    (water_y - (sample_y - 0.5)).clamp(0.0, 1.0)
}

/// Step every ship against the shared ocean. Instability is recovered
/// locally and logged; the step never aborts the tick.
pub fn step_ships(world: &World, dt: f32, time: f32, config: &PhysicsConfig) {
    let ocean = world.ocean();
    world.with_ships_mut(|ships| {
        for body in ships.values_mut() {
            if let Err(err) = body.step(dt, time, &ocean, Some(world), config) {
                log::warn!("{err}");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OceanConfig, WaveComponentConfig};

    fn calm_ocean() -> OceanField {
        let config = OceanConfig {
            wave_components: vec![WaveComponentConfig {
                amplitude: 0.0,
                wavelength: 30.0,
                direction_deg: 0.0,
                speed: 5.0,
                phase: 0.0,
            }],
            tide_amplitude: 0.0,
            ..OceanConfig::default()
        };
        OceanField::from_config(0xC0FFEE, 64.0, &config).unwrap()
    }

    fn hull_grid(mass_total: f32) -> Vec<ShipComponent> {
        // 12 hull samples of 1 m³ in a 6x2 keel grid.
        let mut components = Vec::new();
        let per = mass_total / 12.0;
        for i in 0..6 {
            for j in 0..2 {
                let x = (j as f32 - 0.5) * 2.0;
                let z = (i as f32 - 2.5) * 2.0;
                components.push(ShipComponent::hull(Vec3::new(x, -1.0, z), per, 1.0));
            }
        }
        components
    }

    fn test_ship() -> ShipBody {
        ShipBody::new(
            ShipId(1),
            Vec3::new(0.0, 64.0, 0.0),
            Vec3::new(2.0, 2.5, 7.0),
            hull_grid(10_000.0),
        )
    }

    #[test]
    fn test_buoyant_ship_settles_near_waterline() {
        let ocean = calm_ocean();
        let config = PhysicsConfig::default();
        let mut ship = test_ship();

        let dt = config.fixed_dt;
        for step in 0..(30.0 / dt) as u32 {
            ship.step(dt, step as f32 * dt, &ocean, None, &config).unwrap();
        }

        assert!(
            ship.linear_velocity.y.abs() < 0.05,
            "still bobbing at {} m/s",
            ship.linear_velocity.y
        );
        assert!(
            (62.0..=66.0).contains(&ship.position.y),
            "settled at y = {}",
            ship.position.y
        );
    }

    #[test]
    fn test_free_body_drifts_by_velocity_only() {
        // With no waves and no submerged samples, one step changes position
        // by at most |v| * dt (plus gravity's dt² sliver).
        let ocean = calm_ocean();
        let config = PhysicsConfig::default();
        let mut ship = ShipBody::new(
            ShipId(2),
            Vec3::new(0.0, 200.0, 0.0),
            Vec3::ONE,
            vec![ShipComponent::hull(Vec3::ZERO, 1000.0, 1.0)],
        );
        ship.linear_velocity = Vec3::new(3.0, 0.0, 0.0);
        let before = ship.position;
        let v = ship.linear_velocity.length();

        ship.step(config.fixed_dt, 0.0, &ocean, None, &config).unwrap();

        let moved = (ship.position - before).length();
        let bound = v * config.fixed_dt + config.gravity * config.fixed_dt * config.fixed_dt + 1e-4;
        assert!(moved <= bound, "moved {moved}, bound {bound}");
        assert_eq!(ship.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_engine_thrust_accelerates_forward() {
        let ocean = calm_ocean();
        let config = PhysicsConfig::default();
        let mut components = hull_grid(10_000.0);
        let mut engine = EngineState::new(60_000.0, 1_000.0);
        engine.power_command = 1.0;
        components.push(ShipComponent::engine(Vec3::new(0.0, -0.5, 5.0), 400.0, engine));

        let mut ship = ShipBody::new(
            ShipId(3),
            Vec3::new(0.0, 64.5, 0.0),
            Vec3::new(2.0, 2.5, 7.0),
            components,
        );
        for step in 0..600 {
            ship.step(config.fixed_dt, step as f32 * config.fixed_dt, &ocean, None, &config)
                .unwrap();
        }
        let forward_speed = ship.linear_velocity.dot(ship.heading());
        assert!(forward_speed > 1.0, "forward speed {forward_speed}");
    }

    #[test]
    fn test_overheated_engine_produces_no_thrust() {
        let ocean = calm_ocean();
        let config = PhysicsConfig::default();

        let mut overheated = hull_grid(10_000.0);
        let mut engine = EngineState::new(60_000.0, 1_000.0);
        engine.power_command = 1.0;
        engine.temperature = 145.0;
        overheated.push(ShipComponent::engine(Vec3::new(0.0, -0.5, 5.0), 400.0, engine));

        // Control ship carries the same mass layout but no thrust source, so
        // any drift (current drag, tide) matches between the two.
        let mut inert = hull_grid(10_000.0);
        inert.push(ShipComponent::cannon_mount(Vec3::new(0.0, -0.5, 5.0), 400.0));

        let extents = Vec3::new(2.0, 2.5, 7.0);
        let mut ship = ShipBody::new(ShipId(4), Vec3::new(0.0, 64.5, 0.0), extents, overheated);
        let mut control = ShipBody::new(ShipId(5), Vec3::new(0.0, 64.5, 0.0), extents, inert);

        for step in 0..600 {
            let t = step as f32 * config.fixed_dt;
            ship.step(config.fixed_dt, t, &ocean, None, &config).unwrap();
            control.step(config.fixed_dt, t, &ocean, None, &config).unwrap();
        }

        // Zero thrust: the overheated ship moves exactly like the inert one.
        let diff = (ship.linear_velocity - control.linear_velocity).length();
        assert!(diff < 1e-3, "phantom thrust: velocity diff {diff}");
    }

    #[test]
    fn test_destroyed_sail_contributes_nothing() {
        let ocean = calm_ocean();
        let config = PhysicsConfig::default();

        let mut rigged = hull_grid(10_000.0);
        rigged.push(ShipComponent::sail(Vec3::new(0.0, 6.0, 0.0), 150.0, 80.0, Vec3::Z));
        let sail_index = rigged.len() - 1;

        let mut bare = hull_grid(10_000.0);
        bare.push(ShipComponent::cannon_mount(Vec3::new(0.0, 6.0, 0.0), 150.0));

        let extents = Vec3::new(2.0, 2.5, 7.0);
        let mut with_sail = ShipBody::new(ShipId(6), Vec3::new(0.0, 64.5, 0.0), extents, rigged);
        let mut without = ShipBody::new(ShipId(7), Vec3::new(0.0, 64.5, 0.0), extents, bare);
        with_sail.damage_component(sail_index, 1_000.0);

        for step in 0..240 {
            let t = step as f32 * config.fixed_dt;
            with_sail.step(config.fixed_dt, t, &ocean, None, &config).unwrap();
            without.step(config.fixed_dt, t, &ocean, None, &config).unwrap();
        }

        let diff = (with_sail.linear_velocity - without.linear_velocity).length();
        assert!(diff < 1e-4, "destroyed sail still pushed the ship: {diff}");
    }

    #[test]
    fn test_nan_velocity_recovers_with_error() {
        let ocean = calm_ocean();
        let config = PhysicsConfig::default();
        let mut ship = test_ship();
        ship.linear_velocity = Vec3::new(f32::NAN, 0.0, 0.0);
        let before = ship.position;

        let result = ship.step(config.fixed_dt, 0.0, &ocean, None, &config);
        assert!(matches!(result, Err(EngineError::SimulationInstability(_))));
        assert_eq!(ship.position, before);
        assert_eq!(ship.linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_speed_clamped_to_bounds() {
        let ocean = calm_ocean();
        let config = PhysicsConfig::default();
        let mut ship = test_ship();
        ship.linear_velocity = Vec3::new(500.0, 0.0, 0.0);

        ship.step(config.fixed_dt, 0.0, &ocean, None, &config).unwrap();
        assert!(ship.linear_velocity.length() <= config.max_linear_speed + 1e-3);
    }

    #[test]
    fn test_impulse_spins_off_center_hits() {
        let mut ship = test_ship();
        ship.apply_impulse(Vec3::new(0.0, 0.0, -5_000.0), Vec3::new(2.0, 64.0, 0.0));
        assert!(ship.linear_velocity.z < 0.0);
        assert!(ship.angular_velocity.length() > 0.0);
    }
}
