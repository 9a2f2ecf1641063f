//! Sphere primitive for ray tracing.

use crate::hittable::{Hittable, LocalHit};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};
use std::f32::consts::PI;

/// A sphere centered at the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(0.0),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> Vec2 {
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        Vec2::new(phi / (2.0 * PI), theta / PI)
    }

    /// `(dP/du, dP/dv)` at unit normal `n` for the mapping of [`Self::get_sphere_uv`].
    ///
    /// Both are zero at the poles, where `u` is undefined.
    fn sphere_derivatives(&self, n: Vec3) -> (Vec3, Vec3) {
        let ring = (n.x * n.x + n.z * n.z).sqrt();
        if ring < 1e-6 {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let dpdu = 2.0 * PI * self.radius * Vec3::new(n.z, 0.0, -n.x);
        let dpdv = PI * self.radius * Vec3::new(-n.x * n.y / ring, ring, -n.y * n.z / ring);
        (dpdu, dpdv)
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Roots of `|O + tD - C|^2 = r^2`, smaller first.
pub(crate) fn sphere_roots(ray: &Ray, center: Vec3, radius: f32) -> Option<(f32, f32)> {
    let oc = center - ray.origin();
    let a = ray.direction().length_squared();
    if a == 0.0 {
        return None;
    }
    let h = ray.direction().dot(oc);
    let c = oc.length_squared() - radius * radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();
    Some(((h - sqrtd) / a, (h + sqrtd) / a))
}

/// Nearest root of a sphere equation that lies strictly inside `ray_t`.
pub(crate) fn nearest_sphere_root(ray: &Ray, center: Vec3, radius: f32, ray_t: Interval) -> Option<f32> {
    let (near, far) = sphere_roots(ray, center, radius)?;

    // Fall back to the far root when the origin is inside the sphere
    if ray_t.surrounds(near) {
        Some(near)
    } else if ray_t.surrounds(far) {
        Some(far)
    } else {
        None
    }
}

impl Hittable for Sphere {
    type Hit = LocalHit;

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
        let t = nearest_sphere_root(ray, Vec3::ZERO, self.radius, ray_t)?;

        let normal = (ray.at(t) / self.radius).normalize_or_zero();
        let (dpdu, dpdv) = self.sphere_derivatives(normal);
        Some(LocalHit {
            t,
            normal,
            uv: Self::get_sphere_uv(normal),
            dpdu,
            dpdv,
            triangle: None,
        })
    }

    fn bounding_box(&self) -> Aabb {
        let rvec = Vec3::splat(self.radius);
        Aabb::from_points(-rvec, rvec)
    }
}
