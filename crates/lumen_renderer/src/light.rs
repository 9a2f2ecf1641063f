//! Light emitters.
//!
//! Every light is both a sampleable emitter for shadow rays and a surface that
//! camera rays can hit, so lights show up in the image as emissive bodies.

use lumen_math::{Interval, Ray, Transform, TransformMatrices, Vec3};
use rand::RngCore;

use crate::hittable::Hittable;
use crate::sampling::{gen_f32, random_unit_vector};
use crate::sphere::nearest_sphere_root;
use crate::{Color, Triangle};

/// Radius of the visible sphere drawn for a point light.
pub const POINT_LIGHT_RADIUS: f32 = 0.05;

/// Corners of the local unit quad of an area light, in the XZ plane.
const AREA_QUAD: [Vec3; 4] = [
    Vec3::new(-0.5, 0.0, -0.5),
    Vec3::new(0.5, 0.0, -0.5),
    Vec3::new(0.5, 0.0, 0.5),
    Vec3::new(-0.5, 0.0, 0.5),
];

#[derive(Debug, Clone)]
pub enum LightKind {
    Point {
        position: Vec3,
    },
    Sphere {
        position: Vec3,
        radius: f32,
    },
    /// The local unit quad transformed into the world
    Area {
        matrices: TransformMatrices,
        /// The quad as two world-space triangles
        triangles: [Triangle; 2],
    },
}

#[derive(Debug, Clone)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    /// Intensity; contributions fall off as `brightness / distance`
    pub brightness: f32,
}

impl Light {
    pub fn point(position: Vec3, color: Color, brightness: f32) -> Self {
        Self {
            kind: LightKind::Point { position },
            color,
            brightness,
        }
    }

    pub fn sphere(position: Vec3, radius: f32, color: Color, brightness: f32) -> Self {
        Self {
            kind: LightKind::Sphere {
                position,
                radius: radius.abs(),
            },
            color,
            brightness,
        }
    }

    /// Rectangular light: the unit quad in the local XZ plane placed by `transform`.
    pub fn area(transform: &Transform, color: Color, brightness: f32) -> Self {
        let matrices = TransformMatrices::from(transform);
        let [a, b, c, d] = AREA_QUAD.map(|p| matrices.model.transform_point3(p));

        Self {
            kind: LightKind::Area {
                matrices,
                triangles: [Triangle::new(a, b, c), Triangle::new(a, c, d)],
            },
            color,
            brightness,
        }
    }

    /// True for lights that are sampled with a single shadow ray.
    pub fn is_point(&self) -> bool {
        matches!(self.kind, LightKind::Point { .. })
    }

    /// Center of the light.
    pub fn position(&self) -> Vec3 {
        match &self.kind {
            LightKind::Point { position } | LightKind::Sphere { position, .. } => *position,
            LightKind::Area { matrices, .. } => matrices.model.transform_point3(Vec3::ZERO),
        }
    }

    /// Distance along `ray` to the visible surface of the light.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        match &self.kind {
            LightKind::Point { position } => {
                nearest_sphere_root(ray, *position, POINT_LIGHT_RADIUS, Interval::POSITIVE)
            }
            LightKind::Sphere { position, radius } => {
                nearest_sphere_root(ray, *position, *radius, Interval::POSITIVE)
            }
            LightKind::Area { triangles, .. } => triangles
                .iter()
                .filter_map(|triangle| triangle.hit(ray, Interval::POSITIVE))
                .map(|hit| hit.t)
                .min_by(f32::total_cmp),
        }
    }

    /// Stratification grid `(cols, rows)` used for this light's shadow rays.
    pub fn sample_grid(&self, num_shadow_rays: u32) -> (u32, u32) {
        if self.is_point() {
            return (1, 1);
        }
        let n = num_shadow_rays.max(1);
        let cols = (n as f32).sqrt().ceil() as u32;
        let rows = n.div_ceil(cols);
        (cols, rows)
    }

    /// A point on the light for shadow-ray cell `(i, j)` of a `cols x rows` grid.
    pub fn point_on_light(
        &self,
        i: u32,
        j: u32,
        cols: u32,
        rows: u32,
        rng: &mut dyn RngCore,
    ) -> Vec3 {
        match &self.kind {
            LightKind::Point { position } => *position,
            LightKind::Sphere { position, radius } => *position + random_unit_vector(rng) * *radius,
            LightKind::Area { matrices, .. } => {
                let u = (i as f32 + gen_f32(rng)) / cols.max(1) as f32 - 0.5;
                let v = (j as f32 + gen_f32(rng)) / rows.max(1) as f32 - 0.5;
                matrices.model.transform_point3(Vec3::new(u, 0.0, v))
            }
        }
    }
}

/// Uniform light reaching every surface regardless of occlusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub brightness: f32,
}

impl AmbientLight {
    pub fn new(color: Color, brightness: f32) -> Self {
        Self { color, brightness }
    }

    /// No ambient light at all.
    pub fn none() -> Self {
        Self::new(Color::ZERO, 0.0)
    }

    pub fn intensity(&self) -> Color {
        self.color * self.brightness
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new(Color::ONE, 1.0)
    }
}
