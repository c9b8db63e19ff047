//! Geometric primitives shared by meshing, streaming, and ship physics.

use glam::{Mat4, Quat, Vec3, Vec4};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Oriented bounding box, used for projectile-vs-ship tests.
#[derive(Debug, Clone, Copy)]
pub struct Obb {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub orientation: Quat,
}

impl Obb {
    pub fn new(center: Vec3, half_extents: Vec3, orientation: Quat) -> Self {
        Self {
            center,
            half_extents,
            orientation,
        }
    }

    /// The box's three local axes in world space.
    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.orientation * Vec3::X,
            self.orientation * Vec3::Y,
            self.orientation * Vec3::Z,
        ]
    }

    /// Separating-axis test against an axis-aligned box. Fifteen candidate
    /// axes: three world axes, three box axes, and the nine cross products.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let a_half = aabb.half_extents();
        let b_axes = self.axes();
        let delta = self.center - aabb.center();

        let mut axes = [Vec3::ZERO; 15];
        axes[0] = Vec3::X;
        axes[1] = Vec3::Y;
        axes[2] = Vec3::Z;
        axes[3] = b_axes[0];
        axes[4] = b_axes[1];
        axes[5] = b_axes[2];
        let mut n = 6;
        for wa in [Vec3::X, Vec3::Y, Vec3::Z] {
            for ba in b_axes {
                axes[n] = wa.cross(ba);
                n += 1;
            }
        }

        for axis in axes {
            // Cross products of near-parallel axes degenerate; skip them.
            if axis.length_squared() < 1e-6 {
                continue;
            }
            let ra = a_half.x * axis.x.abs() + a_half.y * axis.y.abs() + a_half.z * axis.z.abs();
            let rb = self.half_extents.x * b_axes[0].dot(axis).abs()
                + self.half_extents.y * b_axes[1].dot(axis).abs()
                + self.half_extents.z * b_axes[2].dot(axis).abs();
            if delta.dot(axis).abs() > ra + rb {
                return false;
            }
        }
        true
    }
}

/// Geometric plane in normal/distance form.
#[derive(Default, Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    fn from_vec4(v: Vec4) -> Self {
        let normal = Vec3::new(v.x, v.y, v.z);
        let length = normal.length();
        Self {
            normal: normal / length,
            distance: v.w / length,
        }
    }
}

/// View frustum used by the renderer feed to select visible chunks.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract the six clip planes from a view-projection matrix.
    pub fn from_view_projection(view_proj: &Mat4) -> Self {
        let m = view_proj.to_cols_array_2d();
        let row = |i: usize| Vec4::new(m[0][i], m[1][i], m[2][i], m[3][i]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_vec4(r3 + r0), // left
                Plane::from_vec4(r3 - r0), // right
                Plane::from_vec4(r3 + r1), // bottom
                Plane::from_vec4(r3 - r1), // top
                Plane::from_vec4(r3 + r2), // near
                Plane::from_vec4(r3 - r2), // far
            ],
        }
    }

    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // Farthest corner along the plane normal.
            let mut farthest = aabb.min;
            if plane.normal.x > 0.0 {
                farthest.x = aabb.max.x;
            }
            if plane.normal.y > 0.0 {
                farthest.y = aabb.max.y;
            }
            if plane.normal.z > 0.0 {
                farthest.z = aabb.max.z;
            }
            if plane.normal.dot(farthest) + plane.distance < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let c = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_obb_axis_aligned_matches_aabb() {
        let obb = Obb::new(Vec3::ZERO, Vec3::ONE, Quat::IDENTITY);
        let hit = Aabb::from_center_half_extents(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let miss = Aabb::from_center_half_extents(Vec3::new(3.5, 0.0, 0.0), Vec3::ONE);
        assert!(obb.intersects_aabb(&hit));
        assert!(!obb.intersects_aabb(&miss));
    }

    #[test]
    fn test_obb_rotation_narrows_gap() {
        // A box rotated 45 degrees around Y reaches sqrt(2) along X.
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let obb = Obb::new(Vec3::ZERO, Vec3::ONE, rot);
        let probe = Aabb::from_center_half_extents(Vec3::new(2.3, 0.0, 0.0), Vec3::splat(0.95));
        assert!(obb.intersects_aabb(&probe));
    }

    #[test]
    fn test_frustum_culls_behind_camera() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 500.0);
        let frustum = Frustum::from_view_projection(&(proj * view));

        let ahead = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let behind = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, 40.0), Vec3::ONE);
        assert!(frustum.intersects_aabb(&ahead));
        assert!(!frustum.intersects_aabb(&behind));
    }
}
