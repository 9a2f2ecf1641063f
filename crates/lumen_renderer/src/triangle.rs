//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::hittable::{HitDistance, Hittable, LocalHit};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// A triangle primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed edges from v0
    edge1: Vec3,
    edge2: Vec3,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    /// Per-vertex normals for smooth shading
    vertex_normals: Option<[Vec3; 3]>,
    /// Per-vertex texture coordinates
    uvs: Option<[Vec2; 3]>,
    /// Bounding box
    bbox: Aabb,
}

/// Intersection with a triangle: ray parameter plus barycentric weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    /// Weight of `v1`
    pub u: f32,
    /// Weight of `v2`
    pub v: f32,
}

impl HitDistance for TriangleHit {
    fn distance(&self) -> f32 {
        self.t
    }
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        // Calculate normal using cross product
        let normal = edge1.cross(edge2).normalize_or_zero();

        // Pads thin dimensions to avoid degenerate AABBs
        let bbox = Aabb::from_point_cloud([v0, v1, v2]);

        Self {
            v0,
            v1,
            v2,
            edge1,
            edge2,
            normal,
            vertex_normals: None,
            uvs: None,
            bbox,
        }
    }

    /// Attach per-vertex normals (for smooth shading).
    pub fn with_vertex_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.vertex_normals = Some(normals.map(|n| n.normalize_or_zero()));
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Face normal (unit length, zero for degenerate triangles).
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// True when the triangle has no area.
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::ZERO
    }

    /// Point at barycentric weights `(u, v)`.
    pub fn point_at(&self, u: f32, v: f32) -> Vec3 {
        self.v0 + u * self.edge1 + v * self.edge2
    }

    /// Shading normal at barycentric weights `(u, v)`.
    pub fn normal_at(&self, u: f32, v: f32) -> Vec3 {
        match self.vertex_normals {
            Some([n0, n1, n2]) => {
                let n = (1.0 - u - v) * n0 + u * n1 + v * n2;
                let n = n.normalize_or_zero();
                if n == Vec3::ZERO {
                    self.normal
                } else {
                    n
                }
            }
            None => self.normal,
        }
    }

    /// Texture coordinate at barycentric weights `(u, v)`.
    pub fn uv_at(&self, u: f32, v: f32) -> Vec2 {
        match self.uvs {
            Some([t0, t1, t2]) => (1.0 - u - v) * t0 + u * t1 + v * t2,
            None => Vec2::new(u, v),
        }
    }

    /// `(dP/du, dP/dv)` from the edges and their texture-space deltas.
    ///
    /// Without uvs the texture coordinate is the barycentric pair, so the
    /// derivatives are the edges themselves. Zero if the uvs are collinear.
    pub fn uv_derivatives(&self) -> (Vec3, Vec3) {
        let Some([t0, t1, t2]) = self.uvs else {
            return (self.edge1, self.edge2);
        };

        let duv1 = t1 - t0;
        let duv2 = t2 - t0;
        let det = duv1.x * duv2.y - duv1.y * duv2.x;
        if det.abs() < 1e-12 {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let inv = 1.0 / det;
        let dpdu = (duv2.y * self.edge1 - duv1.y * self.edge2) * inv;
        let dpdv = (duv1.x * self.edge2 - duv2.x * self.edge1) * inv;
        (dpdu, dpdv)
    }

    /// Shading data for a hit on this triangle.
    pub fn local_hit(&self, hit: &TriangleHit, index: usize) -> LocalHit {
        let (dpdu, dpdv) = self.uv_derivatives();
        LocalHit {
            t: hit.t,
            normal: self.normal_at(hit.u, hit.v),
            uv: self.uv_at(hit.u, hit.v),
            dpdu,
            dpdv,
            triangle: Some(index),
        }
    }
}

impl Hittable for Triangle {
    type Hit = TriangleHit;

    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<TriangleHit> {
        let h = ray.direction().cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-12 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);

        // Check if intersection is outside triangle (u parameter)
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction().dot(q);

        // Check if intersection is outside triangle (v parameter)
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        Some(TriangleHit { t, u, v })
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle() -> Triangle {
        // Triangle in XY plane at z=-1
        Triangle::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
        )
    }

    #[test]
    fn test_triangle_hit() {
        let tri = xy_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let hit = tri.hit(&ray, Interval::POSITIVE).unwrap();
        assert!((hit.t - 1.0).abs() < 0.001);
        // The barycentric point is the ray point
        assert!((tri.point_at(hit.u, hit.v) - ray.at(hit.t)).length() < 1e-5);
        assert!((tri.normal() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = xy_triangle();

        // Ray pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(tri.hit(&ray, Interval::POSITIVE).is_none());

        // Ray outside the edges
        let ray = Ray::new(Vec3::new(0.9, 0.9, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.hit(&ray, Interval::POSITIVE).is_none());

        // Ray parallel to the plane
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(tri.hit(&ray, Interval::POSITIVE).is_none());
    }

    #[test]
    fn test_triangle_smooth_normal_interpolation() {
        let tri = xy_triangle().with_vertex_normals([
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::Z,
        ]);

        // At a vertex the shading normal is that vertex's normal
        let n = tri.normal_at(1.0, 0.0);
        assert!((n - Vec3::new(1.0, 0.0, 1.0).normalize()).length() < 1e-5);

        // Halfway between v0 and v1 the X components cancel
        let n = tri.normal_at(0.5, 0.0);
        assert!((n - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_triangle_uv_interpolation() {
        let tri = xy_triangle().with_uvs([Vec2::ZERO, Vec2::X, Vec2::Y]);
        assert_eq!(tri.uv_at(0.25, 0.5), Vec2::new(0.25, 0.5));

        let local = tri.local_hit(&TriangleHit { t: 2.0, u: 0.25, v: 0.5 }, 7);
        assert_eq!(local.triangle, Some(7));
        assert_eq!(local.t, 2.0);
    }

    #[test]
    fn test_degenerate_triangle() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert!(tri.is_degenerate());
        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), Vec3::NEG_Z);
        assert!(tri.hit(&ray, Interval::POSITIVE).is_none());
    }

    #[test]
    fn test_triangle_uv_derivatives() {
        // Without uvs the barycentric pair is the texture coordinate
        let tri = xy_triangle();
        assert_eq!(tri.uv_derivatives(), (Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 0.0)));

        // uv = (x, y) mapped onto the triangle's plane
        let tri = xy_triangle().with_uvs([
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(0.0, 1.0),
        ]);
        let (dpdu, dpdv) = tri.uv_derivatives();
        assert!((dpdu - Vec3::X).length() < 1e-6);
        assert!((dpdv - Vec3::Y).length() < 1e-6);

        let local = tri.local_hit(&TriangleHit { t: 1.0, u: 0.2, v: 0.3 }, 0);
        assert_eq!((local.dpdu, local.dpdv), (dpdu, dpdv));
    }

    #[test]
    fn test_triangle_collinear_uvs_have_no_derivatives() {
        let tri = xy_triangle().with_uvs([Vec2::ZERO, Vec2::X, Vec2::X * 2.0]);
        assert_eq!(tri.uv_derivatives(), (Vec3::ZERO, Vec3::ZERO));
    }
}
