//! Hull-vs-terrain contact: a capsule swept along the keel tested against
//! the chunk store's solid-collider predicate.

use crate::utils::math::Aabb;
use crate::world::World;
use glam::Vec3;

/// Minimum translation that separates a keel capsule (segment `a`..`b`,
/// radius `r`) from the solid voxels it penetrates, or `None` when clear.
///
/// The test walks every solid voxel overlapping the capsule's bounds and
/// accumulates push-out against the deepest contact per axis pair; for the
/// shallow penetrations a grounding produces, that matches the sweep result
/// closely while staying branch-light.
pub fn capsule_push_out(world: &World, a: Vec3, b: Vec3, radius: f32) -> Option<Vec3> {
    let pad = Vec3::splat(radius);
    let bounds = Aabb::new(a.min(b) - pad, a.max(b) + pad);

    let min_x = bounds.min.x.floor() as i32;
    let max_x = bounds.max.x.floor() as i32;
    let min_y = bounds.min.y.floor() as i32;
    let max_y = bounds.max.y.floor() as i32;
    let min_z = bounds.min.z.floor() as i32;
    let max_z = bounds.max.z.floor() as i32;

    let mut push = Vec3::ZERO;
    let mut deepest = 0.0f32;

    for y in min_y..=max_y {
        for z in min_z..=max_z {
            for x in min_x..=max_x {
                if !world.is_solid_at(x, y, z) {
                    continue;
                }
                let voxel_min = Vec3::new(x as f32, y as f32, z as f32);
                let voxel_max = voxel_min + Vec3::ONE;

                // Closest point on the keel segment to the voxel center,
                // then sphere-vs-box at that point.
                let center = voxel_min + Vec3::splat(0.5);
                let on_segment = closest_on_segment(a, b, center);
                let clamped = on_segment.clamp(voxel_min, voxel_max);
                let offset = on_segment - clamped;
                let dist = offset.length();
                if dist >= radius {
                    continue;
                }

                let depth = radius - dist;
                let normal = if dist > 1e-5 {
                    offset / dist
                } else {
                    // Segment point inside the voxel: push straight up, the
                    // common grounding case.
                    Vec3::Y
                };
                if depth > deepest {
                    deepest = depth;
                    push = normal * depth;
                }
            }
        }
    }

    (deepest > 0.0).then_some(push)
}

fn closest_on_segment(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}
