//! Ground-plane style primitive.

use crate::hittable::{Hittable, LocalHit};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Half extent of a plane in its local X and Z directions.
///
/// Planes are conceptually infinite; bounding them keeps the BVH proxy box
/// exact, and object scale can enlarge them further.
pub const PLANE_HALF_EXTENT: f32 = 1000.0;

/// The local plane `y = 0` with outward normal `+Y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    half_extent: f32,
}

impl Plane {
    pub fn new() -> Self {
        Self {
            half_extent: PLANE_HALF_EXTENT,
        }
    }

    /// A plane limited to `|x|, |z| <= half_extent`.
    pub fn with_half_extent(half_extent: f32) -> Self {
        Self {
            half_extent: half_extent.abs(),
        }
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::new()
    }
}

impl Hittable for Plane {
    type Hit = LocalHit;

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
        // t = -dot(O, N) / dot(D, N) with N = +Y
        let denom = ray.direction().y;
        if denom.abs() < 1e-12 {
            return None;
        }

        let t = -ray.origin().y / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let p = ray.at(t);
        if p.x.abs() > self.half_extent || p.z.abs() > self.half_extent {
            return None;
        }

        Some(LocalHit {
            t,
            normal: Vec3::Y,
            uv: Vec2::new(p.x, p.z),
            dpdu: Vec3::X,
            dpdv: Vec3::Z,
            triangle: None,
        })
    }

    fn bounding_box(&self) -> Aabb {
        let h = self.half_extent;
        Aabb::from_points(Vec3::new(-h, 0.0, -h), Vec3::new(h, 0.0, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_hit_from_above_and_below() {
        let plane = Plane::new();

        let down = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = plane.hit(&down, Interval::POSITIVE).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-6);
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.uv, Vec2::new(1.0, 3.0));

        let up = Ray::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        let hit = plane.hit(&up, Interval::POSITIVE).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_plane_parallel_and_receding_rays_miss() {
        let plane = Plane::new();

        let parallel = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(plane.hit(&parallel, Interval::POSITIVE).is_none());

        let away = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert!(plane.hit(&away, Interval::POSITIVE).is_none());
    }

    #[test]
    fn test_plane_is_bounded_by_its_proxy() {
        let plane = Plane::with_half_extent(2.0);
        let outside = Ray::new(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(plane.hit(&outside, Interval::POSITIVE).is_none());

        let bbox = plane.bounding_box();
        assert_eq!(bbox.x.max, 2.0);
        assert!(bbox.y.size() > 0.0);
    }
}
