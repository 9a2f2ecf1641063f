//! Camera for ray generation.

use crate::sampling::random_in_unit_disk;
use lumen_math::{Ray, Vec3};
use rand::RngCore;

/// Thin-lens camera for generating rays into the scene.
#[derive(Clone, Debug)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    up: Vec3,

    // Lens settings
    vfov: f32,     // Vertical field of view in degrees
    aperture: f32, // Lens radius, 0 for a pinhole

    // Cached computed values (set by initialize())
    focus_dist: f32,
    viewport_upper_left: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            vfov: 90.0,
            aperture: 0.0,
            focus_dist: 1.0,
            viewport_upper_left: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, up: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.up = up;
        self
    }

    /// Set vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Set lens radius (0 disables depth of field).
    pub fn with_aperture(mut self, aperture: f32) -> Self {
        self.aperture = aperture.max(0.0);
        self
    }

    pub fn look_from(&self) -> Vec3 {
        self.look_from
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    pub fn aperture(&self) -> f32 {
        self.aperture
    }

    /// Distance to the plane of perfect focus (the `look_at` point).
    pub fn focus_distance(&self) -> f32 {
        self.focus_dist
    }

    /// Initialize the camera (must be called before generating rays).
    pub fn initialize(&mut self) {
        let focus_dist = (self.look_at - self.look_from).length();
        self.focus_dist = if focus_dist > 1e-6 { focus_dist } else { 1.0 };

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).try_normalize().unwrap_or(Vec3::Z);
        self.u = self
            .up
            .cross(self.w)
            .try_normalize()
            .unwrap_or_else(|| self.w.any_orthonormal_vector());
        self.v = self.w.cross(self.u);

        // Calculate viewport dimensions on the focal plane
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width =
            viewport_height * (self.image_width.max(1) as f32 / self.image_height.max(1) as f32);

        // Calculate viewport vectors
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width.max(1) as f32;
        self.pixel_delta_v = viewport_v / self.image_height.max(1) as f32;

        self.viewport_upper_left =
            self.look_from - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;
    }

    /// Generate the ray through pixel `(i, j)` at sub-pixel offset `(x_offset, y_offset)`.
    ///
    /// Offsets run from 0 (top-left corner of the pixel) to 1 (bottom-right).
    /// With a non-zero aperture the origin is jittered over the lens and the
    /// ray is re-aimed at the same point on the focal plane.
    pub fn shoot_ray(
        &self,
        i: u32,
        j: u32,
        x_offset: f32,
        y_offset: f32,
        rng: &mut dyn RngCore,
    ) -> Ray {
        let target = self.viewport_upper_left
            + (i as f32 + x_offset) * self.pixel_delta_u
            + (j as f32 + y_offset) * self.pixel_delta_v;

        let origin = if self.aperture <= 0.0 {
            self.look_from
        } else {
            let p = random_in_unit_disk(rng) * self.aperture;
            self.look_from + p.x * self.u + p.y * self.v
        };

        Ray::new(origin, target - origin)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn camera(aperture: f32) -> Camera {
        let mut camera = Camera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0), Vec3::Y)
            .with_fov(90.0)
            .with_aperture(aperture);
        camera.initialize();
        camera
    }

    #[test]
    fn test_camera_initialize() {
        let camera = camera(0.0);
        assert!((camera.w - Vec3::Z).length() < 0.001);
        assert!((camera.u - Vec3::X).length() < 0.001);
        assert!((camera.v - Vec3::Y).length() < 0.001);
        assert_eq!(camera.focus_distance(), 4.0);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = camera(0.0);
        let mut rng = StdRng::seed_from_u64(42);

        // The shared corner of the four central pixels is the image center
        let ray = camera.shoot_ray(50, 50, 0.0, 0.0, &mut rng);
        assert_eq!(ray.origin(), Vec3::ZERO);
        assert!((ray.direction() - Vec3::new(0.0, 0.0, -4.0)).length() < 1e-4);
    }

    #[test]
    fn test_corner_rays_span_field_of_view() {
        let camera = camera(0.0);
        let mut rng = StdRng::seed_from_u64(42);

        // 90 degree fov: the top-left corner is one focus distance up and left
        let ray = camera.shoot_ray(0, 0, 0.0, 0.0, &mut rng);
        let d = ray.direction();
        assert!((d - Vec3::new(-4.0, 4.0, -4.0)).length() < 1e-4);

        let ray = camera.shoot_ray(99, 99, 1.0, 1.0, &mut rng);
        let d = ray.direction();
        assert!((d - Vec3::new(4.0, -4.0, -4.0)).length() < 1e-4);
    }

    #[test]
    fn test_depth_of_field_keeps_focal_point() {
        let camera = camera(0.5);
        let mut rng = StdRng::seed_from_u64(7);

        let mut moved = false;
        for _ in 0..32 {
            let ray = camera.shoot_ray(50, 50, 0.0, 0.0, &mut rng);
            let origin = ray.origin();
            assert!(origin.length() <= 0.5 + 1e-5);
            assert!(origin.z.abs() < 1e-6);
            moved |= origin.length() > 1e-3;

            // Every lens sample converges on the same focal-plane point
            let focal = ray.at(1.0);
            assert!((focal - Vec3::new(0.0, 0.0, -4.0)).length() < 1e-4);
        }
        assert!(moved);
    }

    #[test]
    fn test_degenerate_up_vector() {
        let mut camera = Camera::new().with_position(Vec3::ZERO, Vec3::new(0.0, -5.0, 0.0), Vec3::Y);
        camera.initialize();
        let mut rng = StdRng::seed_from_u64(1);
        let ray = camera.shoot_ray(400, 225, 0.0, 0.0, &mut rng);
        assert!(ray.direction().is_finite());
        assert!(ray.direction().y < 0.0);
    }
}
