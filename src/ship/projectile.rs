//! Projectile simulation for the ship layer's cannons.
//!
//! Projectiles carry their owning ship's id, never a pointer; impacts are
//! resolved against the ship registry through the world. Expiry by range or
//! lifetime is the expected outcome of most shots and is silently removed.

use crate::config::PhysicsConfig;
use crate::ocean::OceanField;
use crate::ship::ShipId;
use crate::utils::math::Aabb;
use crate::world::World;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectileId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Ballistic,
    /// Chain shot skips once off the water before sinking.
    Chain,
    Grape,
    /// Detonates on any impact, shoving nearby hulls.
    Explosive,
}

impl ProjectileKind {
    pub fn mass(self) -> f32 {
        match self {
            ProjectileKind::Ballistic => 12.0,
            ProjectileKind::Chain => 8.0,
            ProjectileKind::Grape => 4.0,
            ProjectileKind::Explosive => 14.0,
        }
    }

    fn half_extent(self) -> f32 {
        match self {
            ProjectileKind::Grape => 0.35,
            _ => 0.2,
        }
    }
}

/// Blast radius for explosive rounds, meters.
const EXPLOSION_RADIUS: f32 = 6.0;
/// Impulse the blast delivers at zero distance, N·s.
const EXPLOSION_IMPULSE: f32 = 9_000.0;
/// Lifetime allowance over the ideal ballistic flight time.
const LIFETIME_MARGIN: f32 = 1.5;

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub kind: ProjectileKind,
    pub owner: ShipId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub time_alive: f32,
    max_lifetime: f32,
    max_range: f32,
    origin: Vec3,
    bounced: bool,
}

impl Projectile {
    pub fn new(
        id: ProjectileId,
        kind: ProjectileKind,
        owner: ShipId,
        position: Vec3,
        velocity: Vec3,
        max_range: f32,
        water_level: f32,
        gravity: f32,
    ) -> Self {
        let height = (position.y - water_level).max(0.0);
        Self {
            id,
            kind,
            owner,
            position,
            velocity,
            time_alive: 0.0,
            max_lifetime: LIFETIME_MARGIN * ballistic_flight_time(velocity.y, height, gravity),
            max_range,
            origin: position,
            bounced: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.position, Vec3::splat(self.kind.half_extent()))
    }

    pub fn range_travelled(&self) -> f32 {
        (self.position - self.origin).length()
    }
}

/// Time for a ballistic arc launched at `vy` from `height` above the water
/// to splash down.
fn ballistic_flight_time(vy: f32, height: f32, gravity: f32) -> f32 {
    if gravity <= 0.0 {
        return 30.0;
    }
    (vy + (vy * vy + 2.0 * gravity * height).sqrt()) / gravity
}

/// Why a projectile left the simulation this step.
#[derive(Debug)]
enum Fate {
    ShipHit { ship: ShipId, point: Vec3, impulse: Vec3 },
    Detonated { at: Vec3 },
    Splashed,
    Expired,
}

/// Advance all projectiles one step: integrate, collide against ship OBBs
/// and the water surface, expire by range and lifetime.
pub fn step_projectiles(world: &World, dt: f32, time: f32, config: &PhysicsConfig) {
    let ocean = world.ocean();
    let mut finished: Vec<(ProjectileId, Fate)> = Vec::new();

    world.with_projectiles_mut(|projectiles| {
        for projectile in projectiles.values_mut() {
            projectile.velocity.y -= config.gravity * dt;
            projectile.position += projectile.velocity * dt;
            projectile.time_alive += dt;

            if let Some(fate) = resolve_fate(world, &ocean, projectile, time) {
                finished.push((projectile.id, fate));
            }
        }
        for (id, _) in &finished {
            projectiles.remove(id);
        }
    });

    for (_, fate) in finished {
        match fate {
            Fate::ShipHit { ship, point, impulse } => {
                world.with_ship_mut(ship, |body| body.apply_impulse(impulse, point));
            }
            Fate::Detonated { at } => {
                detonate(world, at);
            }
            // Expected end of most shots; nothing to report.
            Fate::Splashed | Fate::Expired => {}
        }
    }
}

fn resolve_fate(
    world: &World,
    ocean: &OceanField,
    projectile: &mut Projectile,
    time: f32,
) -> Option<Fate> {
    // Ship impact ends every kind on first contact.
    let hit = world.with_ships(|ships| {
        ships
            .values()
            .filter(|body| body.id() != projectile.owner)
            .find(|body| body.obb().intersects_aabb(&projectile.bounds()))
            .map(|body| body.id())
    });
    if let Some(ship) = hit {
        return Some(if projectile.kind == ProjectileKind::Explosive {
            Fate::Detonated {
                at: projectile.position,
            }
        } else {
            Fate::ShipHit {
                ship,
                point: projectile.position,
                impulse: projectile.velocity * projectile.kind.mass(),
            }
        });
    }

    // Water impact, kind-specific.
    let water = ocean.sample_height(projectile.position.x, projectile.position.z, time);
    if projectile.position.y <= water {
        return match projectile.kind {
            ProjectileKind::Chain if !projectile.bounced => {
                // Scripted single skip: no restitution model, just a damped
                // reflection off the surface.
                projectile.bounced = true;
                projectile.position.y = water + 0.05;
                projectile.velocity.y = -projectile.velocity.y * 0.4;
                projectile.velocity.x *= 0.8;
                projectile.velocity.z *= 0.8;
                None
            }
            ProjectileKind::Explosive => Some(Fate::Detonated {
                at: projectile.position,
            }),
            _ => Some(Fate::Splashed),
        };
    }

    if projectile.range_travelled() > projectile.max_range
        || projectile.time_alive > projectile.max_lifetime
    {
        return Some(Fate::Expired);
    }
    None
}

fn detonate(world: &World, at: Vec3) {
    world.with_ships_mut(|ships| {
        for body in ships.values_mut() {
            let offset = body.position - at;
            let distance = offset.length();
            if distance > EXPLOSION_RADIUS {
                continue;
            }
            let falloff = 1.0 - distance / EXPLOSION_RADIUS;
            let direction = if distance > 1e-3 {
                offset / distance
            } else {
                Vec3::Y
            };
            body.apply_impulse(direction * EXPLOSION_IMPULSE * falloff, at);
        }
    });
}
