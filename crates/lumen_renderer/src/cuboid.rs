//! Axis-aligned box primitive (in its local space).

use crate::hittable::{Hittable, LocalHit};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// A box centered at the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    half_extents: Vec3,
}

impl Cuboid {
    /// Create a box with the given full size along each axis.
    pub fn new(size: Vec3) -> Self {
        Self {
            half_extents: (size * 0.5).abs(),
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Outward normal, texture coordinate and `(dP/du, dP/dv)` of a point on
    /// the surface.
    ///
    /// The face is the one whose axis has the largest `|p / half_extent|`.
    fn surface_at(&self, p: Vec3) -> (Vec3, Vec2, (Vec3, Vec3)) {
        let scaled = p / self.half_extents.max(Vec3::splat(f32::MIN_POSITIVE));
        let magnitude = scaled.abs();

        let axis = if magnitude.x >= magnitude.y && magnitude.x >= magnitude.z {
            0
        } else if magnitude.y >= magnitude.z {
            1
        } else {
            2
        };

        let mut normal = Vec3::ZERO;
        normal[axis] = scaled[axis].signum();

        // Face axes carrying u and v
        let (u_axis, v_axis) = match axis {
            0 => (2, 1),
            1 => (0, 2),
            _ => (0, 1),
        };
        let uv = Vec2::new((scaled[u_axis] + 1.0) * 0.5, (scaled[v_axis] + 1.0) * 0.5);

        // u spans the full face width, so dP/du is twice the half extent
        let mut dpdu = Vec3::ZERO;
        dpdu[u_axis] = 2.0 * self.half_extents[u_axis];
        let mut dpdv = Vec3::ZERO;
        dpdv[v_axis] = 2.0 * self.half_extents[v_axis];

        (normal, uv, (dpdu, dpdv))
    }
}

impl Default for Cuboid {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}

impl Hittable for Cuboid {
    type Hit = LocalHit;

    /// Slab test across the three axis pairs.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let half = self.half_extents[axis];

            if direction == 0.0 {
                if origin < -half || origin > half {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let t0 = (-half - origin) * inv;
            let t1 = (half - origin) * inv;
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
            if t_near > t_far {
                return None;
            }
        }

        let t = if ray_t.surrounds(t_near) {
            t_near
        } else if ray_t.surrounds(t_far) {
            t_far
        } else {
            return None;
        };

        let (normal, uv, (dpdu, dpdv)) = self.surface_at(ray.at(t));
        Some(LocalHit {
            t,
            normal,
            uv,
            dpdu,
            dpdv,
            triangle: None,
        })
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::from_points(-self.half_extents, self.half_extents)
    }
}
