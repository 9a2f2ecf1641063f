//! Adaptive per-pixel supersampling.
//!
//! A pixel is treated as a square in sub-pixel offset space. Its four corners
//! are traced; if any corner strays from their average by more than
//! [`ADAPTIVE_THRESHOLD`], the square is split into four quadrants and each
//! is refined the same way, down to `sample_depth` levels. Corner positions
//! live on an integer grid of `2^sample_depth` cells per side and are memoised,
//! so a corner shared between neighbouring quadrants is traced once.

use std::collections::HashMap;

use crate::scene::{Scene, TraceContext};
use crate::Color;

/// Maximum per-channel deviation from the quadrant average before it is split.
pub const ADAPTIVE_THRESHOLD: f32 = 0.01;

/// Mean of four colors, summed pairwise so equal inputs average exactly.
#[inline]
fn quad_mean([a, b, c, d]: [Color; 4]) -> Color {
    ((a + b) * 0.5 + (c + d) * 0.5) * 0.5
}

/// Adaptive sampler for a single pixel.
pub struct PixelSampler<'a> {
    scene: &'a Scene,
    x: u32,
    y: u32,
    depth: u32,
    /// Grid cells per pixel side
    resolution: u32,
    samples: HashMap<(u32, u32), Color>,
}

impl<'a> PixelSampler<'a> {
    pub fn new(scene: &'a Scene, x: u32, y: u32, sample_depth: u32) -> Self {
        Self {
            scene,
            x,
            y,
            depth: sample_depth,
            resolution: 1 << sample_depth,
            samples: HashMap::new(),
        }
    }

    /// Color of the pixel.
    pub fn render(&mut self, bounces: u32, ctx: &mut TraceContext) -> Color {
        self.subdivide(0, 0, self.resolution, 0, bounces, ctx)
    }

    /// Number of rays traced so far.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn sample(&mut self, gx: u32, gy: u32, bounces: u32, ctx: &mut TraceContext) -> Color {
        if let Some(color) = self.samples.get(&(gx, gy)) {
            return *color;
        }

        let scale = 1.0 / self.resolution as f32;
        let ray = self.scene.camera().shoot_ray(
            self.x,
            self.y,
            gx as f32 * scale,
            gy as f32 * scale,
            &mut ctx.rng,
        );
        let color = self.scene.trace(&ray, bounces, ctx);
        self.samples.insert((gx, gy), color);
        color
    }

    fn subdivide(
        &mut self,
        x0: u32,
        y0: u32,
        size: u32,
        level: u32,
        bounces: u32,
        ctx: &mut TraceContext,
    ) -> Color {
        let corners = [
            self.sample(x0, y0, bounces, ctx),
            self.sample(x0 + size, y0, bounces, ctx),
            self.sample(x0, y0 + size, bounces, ctx),
            self.sample(x0 + size, y0 + size, bounces, ctx),
        ];
        let average = quad_mean(corners);

        let converged = corners
            .iter()
            .all(|c| (*c - average).abs().max_element() <= ADAPTIVE_THRESHOLD);
        if converged || level >= self.depth || size < 2 {
            return average;
        }

        let half = size / 2;
        quad_mean([
            self.subdivide(x0, y0, half, level + 1, bounces, ctx),
            self.subdivide(x0 + half, y0, half, level + 1, bounces, ctx),
            self.subdivide(x0, y0 + half, half, level + 1, bounces, ctx),
            self.subdivide(x0 + half, y0 + half, half, level + 1, bounces, ctx),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AmbientLight, Camera, Light, Material, Object, SceneDescription};
    use lumen_math::{Transform, Vec3};

    fn camera() -> Camera {
        Camera::new()
            .with_resolution(8, 8)
            .with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .with_fov(40.0)
    }

    fn flat_scene() -> Scene {
        Scene::new(SceneDescription::new(camera()).with_sky_color(Color::new(0.3, 0.6, 0.9)))
    }

    /// A lit sphere whose silhouette crosses pixel (4, 4).
    fn edge_scene() -> Scene {
        Scene::new(
            SceneDescription::new(camera())
                .with_ambient(AmbientLight::none())
                .with_light(Light::point(Vec3::new(0.0, 0.0, 10.0), Color::ONE, 10.0))
                .with_object(Object::new(
                    crate::Sphere::new(1.0),
                    &Transform::from_translation(Vec3::new(-1.0, -1.0, 0.0)),
                    Material::diffuse(Color::ONE),
                )),
        )
    }

    #[test]
    fn test_quad_mean_is_exact_for_equal_colors() {
        let c = Color::new(0.1, 0.7, 0.33);
        assert_eq!(quad_mean([c; 4]), c);
    }

    #[test]
    fn test_flat_region_converges_immediately() {
        let scene = flat_scene();
        let sky = scene.sky_color();

        for depth in [0, 1, 4] {
            let mut sampler = PixelSampler::new(&scene, 3, 5, depth);
            let color = sampler.render(3, &mut TraceContext::new(1, 0));
            assert_eq!(color, sky);
            assert_eq!(sampler.sample_count(), 4);
        }
    }

    #[test]
    fn test_edges_get_more_samples() {
        let scene = edge_scene();

        let mut coarse = PixelSampler::new(&scene, 0, 0, 3);
        coarse.render(1, &mut TraceContext::new(1, 0));
        // Pixel (0, 0) only sees sky
        assert_eq!(coarse.sample_count(), 4);

        let mut shallow = PixelSampler::new(&scene, 3, 4, 1);
        shallow.render(1, &mut TraceContext::new(1, 0));
        let mut deep = PixelSampler::new(&scene, 3, 4, 3);
        let color = deep.render(1, &mut TraceContext::new(1, 0));

        assert!(shallow.sample_count() <= 9);
        assert!(deep.sample_count() > shallow.sample_count());
        // Bounded by the full (2^3 + 1)^2 grid
        assert!(deep.sample_count() <= 81);
        assert!(color.min_element() >= 0.0);
    }
}
