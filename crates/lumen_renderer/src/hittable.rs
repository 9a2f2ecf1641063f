//! Hittable trait and hit records for ray-object intersection.

use crate::Object;
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Anything that reports the ray parameter of an intersection.
pub trait HitDistance {
    fn distance(&self) -> f32;
}

/// Trait for objects that can be hit by rays.
///
/// The BVH is generic over this trait, so the same tree type serves scene
/// objects (world space) and mesh triangles (object space).
pub trait Hittable: Send + Sync {
    type Hit: HitDistance;

    /// Test if a ray hits this object strictly inside the given interval.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Self::Hit>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Point used to partition the object during BVH construction.
    fn centroid(&self) -> Vec3 {
        self.bounding_box().centroid()
    }
}

/// Intersection expressed in the local space of a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    /// Ray parameter; identical in world and local space
    pub t: f32,
    /// Outward surface normal in local space (unit length)
    pub normal: Vec3,
    /// Texture coordinate
    pub uv: Vec2,
    /// Surface derivatives `dP/du` and `dP/dv` in local space (not normalized)
    pub dpdu: Vec3,
    pub dpdv: Vec3,
    /// Index of the mesh triangle that was hit, if any
    pub triangle: Option<usize>,
}

impl HitDistance for LocalHit {
    fn distance(&self) -> f32 {
        self.t
    }
}

/// Record of a world-space ray-object intersection.
#[derive(Clone, Copy)]
pub struct Hit<'a> {
    pub object: &'a Object,
    pub triangle: Option<usize>,
    /// Point of intersection
    pub point: Vec3,
    /// Outward surface normal (unit length)
    pub normal: Vec3,
    pub uv: Vec2,
    /// World-space `dP/du` and `dP/dv`; zero where the uv mapping is singular
    pub dpdu: Vec3,
    pub dpdv: Vec3,
    pub t: f32,
}

impl Hit<'_> {
    /// Whether the ray arrived from the side the outward normal points to.
    pub fn front_face(&self, ray: &Ray) -> bool {
        ray.direction().dot(self.normal) < 0.0
    }

    /// The normal flipped, if needed, to point against the ray.
    pub fn facing_normal(&self, ray: &Ray) -> Vec3 {
        face_forward(self.normal, ray.direction())
    }
}

/// Flip `normal` so that it opposes `direction`.
#[inline]
pub fn face_forward(normal: Vec3, direction: Vec3) -> Vec3 {
    if direction.dot(normal) > 0.0 {
        -normal
    } else {
        normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_forward() {
        let n = Vec3::Y;
        assert_eq!(face_forward(n, Vec3::NEG_Y), Vec3::Y);
        assert_eq!(face_forward(n, Vec3::new(0.3, 1.0, 0.0)), Vec3::NEG_Y);
    }
}
