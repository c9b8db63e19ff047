use glam::{IVec3, Vec3};

#[derive(Debug, Clone)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for i in 0..3 {
            let t1 = (min[i] - self.origin[i]) / self.direction[i];
            let t2 = (max[i] - self.origin[i]) / self.direction[i];

            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmax >= tmin && tmax > 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Walk the voxel grid the ray passes through, visiting cells in order
    /// (Amanatides–Woo traversal). The visitor returns `true` to stop at the
    /// current voxel; the entry distance and the face normal stepped through
    /// are handed back to the caller.
    pub fn walk_voxels<F>(&self, max_distance: f32, mut visit: F) -> Option<(IVec3, f32, IVec3)>
    where
        F: FnMut(IVec3) -> bool,
    {
        let mut voxel = IVec3::new(
            self.origin.x.floor() as i32,
            self.origin.y.floor() as i32,
            self.origin.z.floor() as i32,
        );

        let step = IVec3::new(
            if self.direction.x > 0.0 { 1 } else { -1 },
            if self.direction.y > 0.0 { 1 } else { -1 },
            if self.direction.z > 0.0 { 1 } else { -1 },
        );

        // Distance along the ray to the first boundary crossing per axis, and
        // the per-cell increment. Zero direction components never advance.
        let mut t_max = Vec3::ZERO;
        let mut t_delta = Vec3::ZERO;
        for i in 0..3 {
            if self.direction[i].abs() < 1e-8 {
                t_max[i] = f32::INFINITY;
                t_delta[i] = f32::INFINITY;
            } else {
                let boundary = if self.direction[i] > 0.0 {
                    voxel[i] as f32 + 1.0
                } else {
                    voxel[i] as f32
                };
                t_max[i] = (boundary - self.origin[i]) / self.direction[i];
                t_delta[i] = 1.0 / self.direction[i].abs();
            }
        }

        let mut t = 0.0f32;
        let mut entered_through = IVec3::ZERO;
        loop {
            if visit(voxel) {
                return Some((voxel, t, entered_through));
            }

            // Advance along the axis with the nearest boundary.
            let axis = if t_max.x <= t_max.y && t_max.x <= t_max.z {
                0
            } else if t_max.y <= t_max.z {
                1
            } else {
                2
            };

            t = t_max[axis];
            if t > max_distance {
                return None;
            }
            t_max[axis] += t_delta[axis];
            let mut v = voxel;
            v[axis] += step[axis];
            voxel = v;
            entered_through = IVec3::ZERO;
            entered_through[axis] = -step[axis];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::X);
        let t = ray.intersects_aabb(Vec3::ZERO, Vec3::ONE).unwrap();
        assert!((t - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let ray = Ray::new(Vec3::new(-5.0, 3.0, 0.5), Vec3::X);
        assert!(ray.intersects_aabb(Vec3::ZERO, Vec3::ONE).is_none());
    }

    #[test]
    fn test_walk_visits_cells_in_order() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::X);
        let mut visited = Vec::new();
        let hit = ray.walk_voxels(10.0, |v| {
            visited.push(v);
            v.x == 3
        });
        assert!(hit.is_some());
        assert_eq!(
            visited,
            vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(2, 0, 0),
                IVec3::new(3, 0, 0),
            ]
        );
        let (voxel, _, normal) = hit.unwrap();
        assert_eq!(voxel, IVec3::new(3, 0, 0));
        assert_eq!(normal, IVec3::new(-1, 0, 0));
    }

    #[test]
    fn test_walk_respects_max_distance() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::X);
        assert!(ray.walk_voxels(2.0, |v| v.x == 100).is_none());
    }
}
