//! Scene assembly and the recursive ray tracer.
//!
//! A [`SceneDescription`] is the fully resolved input handed over by a scene
//! loader. [`Scene::new`] turns it into an immutable scene with an object BVH,
//! which is then shared read-only by every render thread.

use std::time::Instant;

use lumen_math::{Interval, Ray, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bvh::Bvh;
use crate::hittable::{face_forward, Hit};
use crate::material::{fresnel_dielectric, reflect_ray, refract_ray, RAY_EPSILON};
use crate::{AmbientLight, Camera, Color, Light, MaterialType, Object};

/// Everything needed to build a [`Scene`].
#[derive(Debug, Default)]
pub struct SceneDescription {
    pub camera: Camera,
    pub ambient: AmbientLight,
    /// Color returned by rays that escape the scene
    pub sky_color: Color,
    pub lights: Vec<Light>,
    pub objects: Vec<Object>,
}

impl SceneDescription {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn with_ambient(mut self, ambient: AmbientLight) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_sky_color(mut self, sky_color: Color) -> Self {
        self.sky_color = sky_color;
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_object(mut self, object: Object) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_objects(mut self, objects: impl IntoIterator<Item = Object>) -> Self {
        self.objects.extend(objects);
        self
    }
}

/// Per-task scratch state for tracing.
pub struct TraceContext {
    /// Shadow rays per area or sphere light
    pub num_shadow_rays: u32,
    pub rng: StdRng,
}

impl TraceContext {
    pub fn new(num_shadow_rays: u32, seed: u64) -> Self {
        Self {
            num_shadow_rays: num_shadow_rays.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// An immutable, ready-to-render scene.
pub struct Scene {
    camera: Camera,
    ambient: AmbientLight,
    sky_color: Color,
    lights: Vec<Light>,
    bvh: Bvh<Object>,
}

impl Scene {
    /// Build the object BVH and freeze the scene.
    pub fn new(description: SceneDescription) -> Self {
        let SceneDescription {
            mut camera,
            ambient,
            sky_color,
            lights,
            objects,
        } = description;
        camera.initialize();

        let start = Instant::now();
        let bvh = Bvh::new(objects);
        log::info!(
            "Built scene BVH: {} objects, {} nodes, depth {} in {:.2?}",
            bvh.len(),
            bvh.node_count(),
            bvh.depth(),
            start.elapsed()
        );
        for object in bvh.items() {
            log::debug!("  {} ({:?})", object.shape().name(), object.material().kind);
        }
        log::info!(
            "Scene: {} lights, camera {}x{}",
            lights.len(),
            camera.image_width,
            camera.image_height
        );

        Self {
            camera,
            ambient,
            sky_color,
            lights,
            bvh,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Objects in BVH order.
    pub fn objects(&self) -> &[Object] {
        self.bvh.items()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn ambient(&self) -> AmbientLight {
        self.ambient
    }

    pub fn sky_color(&self) -> Color {
        self.sky_color
    }

    /// Nearest object hit with `t > 0`.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let (index, local) = self.bvh.intersect_nearest(ray, Interval::POSITIVE)?;
        Some(self.bvh.items()[index].to_world_hit(ray, local))
    }

    /// True if any object lies along `ray` closer than `max_distance`.
    pub fn is_occluded(&self, ray: &Ray, max_distance: f32) -> bool {
        self.bvh.intersect_any(ray, max_distance)
    }

    /// Nearest light whose visible surface `ray` hits.
    pub fn nearest_light(&self, ray: &Ray) -> Option<(&Light, f32)> {
        self.lights
            .iter()
            .filter_map(|light| light.intersect(ray).map(|t| (light, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Color seen along `ray` with `bounces` levels of recursion left.
    pub fn trace(&self, ray: &Ray, bounces: u32, ctx: &mut TraceContext) -> Color {
        if bounces == 0 {
            return Color::ZERO;
        }

        let hit = self.intersect(ray);

        // Lights render as emissive bodies when nothing is in front of them
        if let Some((light, t)) = self.nearest_light(ray) {
            if hit.as_ref().map_or(true, |hit| t < hit.t) {
                return light.color;
            }
        }

        match hit {
            Some(hit) => self.shade(ray, &hit, bounces, ctx),
            None => self.sky_color,
        }
    }

    /// Material dispatch at a surface hit.
    fn shade(&self, ray: &Ray, hit: &Hit<'_>, bounces: u32, ctx: &mut TraceContext) -> Color {
        let material = hit.object.material();
        let normal = material.shading_normal(hit.normal, hit.dpdu, hit.dpdv, hit.uv);
        let direct = self.phong(ray, hit, normal, ctx);

        match material.kind {
            MaterialType::Diffuse => direct,
            MaterialType::Reflect => {
                let kr = material.metal_reflectance(ray.direction(), normal);
                if kr <= 0.0 {
                    return direct;
                }
                let reflected = reflect_ray(ray, hit.point, normal);
                direct + kr * self.trace(&reflected, bounces - 1, ctx)
            }
            MaterialType::ReflectRefract => {
                let kr = fresnel_dielectric(ray.direction(), normal, material.ior);
                let reflected = reflect_ray(ray, hit.point, normal);
                let mut color = direct + kr * self.trace(&reflected, bounces - 1, ctx);

                if kr < 1.0 {
                    if let Some(refracted) = refract_ray(ray, hit.point, normal, material.ior) {
                        color += (1.0 - kr) * self.trace(&refracted, bounces - 1, ctx);
                    }
                }
                color
            }
        }
    }

    /// Direct lighting: ambient plus stratified soft shadows with Lambert and
    /// Blinn-Phong terms for every light.
    pub fn phong(&self, ray: &Ray, hit: &Hit<'_>, normal: Vec3, ctx: &mut TraceContext) -> Color {
        let material = hit.object.material();
        let albedo = material.color_at(hit.uv);
        let normal = face_forward(normal, ray.direction());
        let view = -ray.direction().normalize_or_zero();
        let specular_tint = Color::ONE.lerp(albedo, material.metalness);
        let origin = hit.point + normal * RAY_EPSILON;

        let mut color = material.ambient * albedo * self.ambient.intensity();

        for light in &self.lights {
            let (cols, rows) = light.sample_grid(ctx.num_shadow_rays);
            let mut sum = Color::ZERO;

            for j in 0..rows {
                for i in 0..cols {
                    let target = light.point_on_light(i, j, cols, rows, &mut ctx.rng);
                    let to_light = target - origin;
                    let distance = to_light.length();
                    if distance <= 0.0 {
                        continue;
                    }

                    let l = to_light / distance;
                    let n_dot_l = normal.dot(l);
                    if n_dot_l <= 0.0 || self.is_occluded(&Ray::new(origin, l), distance) {
                        continue;
                    }

                    let falloff = light.brightness / distance.max(RAY_EPSILON);
                    let mut contribution = material.diffuse * n_dot_l * albedo;
                    if material.specular > 0.0 {
                        let h = (l + view).normalize_or_zero();
                        let n_dot_h = normal.dot(h).max(0.0);
                        contribution += material.specular * n_dot_h.powf(material.shininess) * specular_tint;
                    }
                    sum += light.color * falloff * contribution;
                }
            }

            color += sum / (cols * rows) as f32;
        }

        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere};
    use lumen_math::Transform;

    fn no_ambient(camera: Camera) -> SceneDescription {
        SceneDescription::new(camera).with_ambient(AmbientLight::none())
    }

    fn ground() -> Object {
        Object::plane(&Transform::default(), Material::diffuse(Color::ONE))
    }

    #[test]
    fn test_diffuse_sphere_under_point_light() {
        let albedo = Color::new(0.8, 0.6, 0.4);
        let scene = Scene::new(
            no_ambient(Camera::new())
                .with_light(Light::point(Vec3::new(0.0, 4.0, 0.0), Color::ONE, 10.0))
                .with_object(Object::sphere(Vec3::ZERO, 1.0, Material::diffuse(albedo))),
        );
        let mut ctx = TraceContext::new(4, 0);

        // Lit pole: n.l = 1 and the light is 3 units away
        let ray = Ray::new(Vec3::new(0.0, 4.0, 3.0), Vec3::new(0.0, -3.0, -3.0));
        let color = scene.trace(&ray, 1, &mut ctx);
        let expected = albedo * 0.9 * 10.0 / 3.0;
        assert!((color - expected).abs().max_element() < 1e-3, "{:?} vs {:?}", color, expected);

        // Past the terminator nothing but ambient (black here) remains
        let ray = Ray::new(Vec3::new(0.0, -4.0, 3.0), Vec3::new(0.0, 3.0, -3.0));
        assert_eq!(scene.trace(&ray, 1, &mut ctx), Color::ZERO);
    }

    #[test]
    fn test_ambient_term() {
        let albedo = Color::new(0.5, 0.5, 1.0);
        let scene = Scene::new(
            SceneDescription::new(Camera::new())
                .with_ambient(AmbientLight::new(Color::new(1.0, 0.5, 1.0), 2.0))
                .with_object(Object::sphere(Vec3::ZERO, 1.0, Material::diffuse(albedo))),
        );
        let mut ctx = TraceContext::new(1, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let color = scene.trace(&ray, 3, &mut ctx);
        let expected = 0.1 * albedo * Color::new(2.0, 1.0, 2.0);
        assert!((color - expected).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_sky_and_zero_bounces() {
        let sky = Color::new(0.2, 0.4, 0.6);
        let scene = Scene::new(SceneDescription::new(Camera::new()).with_sky_color(sky));
        let mut ctx = TraceContext::new(1, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.3, 0.1, -1.0));

        assert_eq!(scene.trace(&ray, 1, &mut ctx), sky);
        assert_eq!(scene.trace(&ray, 7, &mut ctx), sky);
        assert_eq!(scene.trace(&ray, 0, &mut ctx), Color::ZERO);
    }

    #[test]
    fn test_visible_light_in_front_of_objects() {
        let light_color = Color::new(1.0, 0.9, 0.8);
        let scene = Scene::new(
            no_ambient(Camera::new())
                .with_light(Light::point(Vec3::new(0.0, 0.0, -2.0), light_color, 5.0))
                .with_object(Object::sphere(Vec3::new(0.0, 0.0, -6.0), 1.0, Material::default())),
        );
        let mut ctx = TraceContext::new(1, 0);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(scene.trace(&ray, 2, &mut ctx), light_color);

        // From behind the sphere, the sphere is closer than the light
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::Z);
        assert_ne!(scene.trace(&ray, 2, &mut ctx), light_color);
    }

    #[test]
    fn test_mirror_needs_second_bounce() {
        let scene = Scene::new(
            no_ambient(Camera::new())
                .with_light(Light::point(Vec3::new(-1.73, 5.0, 3.0), Color::ONE, 10.0))
                .with_object(Object::sphere(Vec3::new(0.0, 2.0, 0.0), 1.0, Material::mirror()))
                .with_object(ground()),
        );
        let mut ctx = TraceContext::new(1, 0);

        // Hits the mirror at y = 1.5 and reflects down to the lit ground
        let ray = Ray::new(Vec3::new(-5.0, 1.5, 0.0), Vec3::X);
        assert_eq!(scene.trace(&ray, 1, &mut ctx), Color::ZERO);

        let reflected = scene.trace(&ray, 2, &mut ctx);
        assert!(reflected.min_element() > 0.5, "{:?}", reflected);
    }

    #[test]
    fn test_index_matched_glass_is_invisible() {
        let sky = Color::new(0.2, 0.4, 0.6);
        let scene = Scene::new(
            no_ambient(Camera::new())
                .with_sky_color(sky)
                .with_object(Object::sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, Material::glass(1.0))),
        );
        let mut ctx = TraceContext::new(1, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.1, 0.05, -1.0));
        let color = scene.trace(&ray, 5, &mut ctx);
        assert!((color - sky).abs().max_element() < 1e-3, "{:?}", color);
    }

    #[test]
    fn test_glass_reflects_and_refracts() {
        let scene = Scene::new(
            no_ambient(Camera::new())
                .with_sky_color(Color::ONE)
                .with_object(Object::sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, Material::glass(1.5))),
        );
        let mut ctx = TraceContext::new(1, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        // Only the Fresnel reflection survives a single extra bounce
        let shallow = scene.trace(&ray, 2, &mut ctx);
        assert!(shallow.x > 0.0 && shallow.x < 0.2, "{:?}", shallow);

        // Energy is conserved: kr + (1 - kr) of a white sky
        let deep = scene.trace(&ray, 8, &mut ctx);
        assert!(deep.x > 0.9 && deep.x <= 1.0 + 1e-4, "{:?}", deep);
    }

    /// Fraction of the unoccluded lighting at ground points `(x, 0, 0)`.
    fn shadow_profile(light: Light, num_shadow_rays: u32) -> Vec<f32> {
        let lit = Scene::new(no_ambient(Camera::new()).with_light(light.clone()).with_object(ground()));
        let shadowed = Scene::new(
            no_ambient(Camera::new())
                .with_light(light)
                .with_object(ground())
                .with_object(Object::sphere(Vec3::new(0.0, 2.0, 0.0), 1.0, Material::default())),
        );

        (0..60)
            .map(|k| {
                let x = k as f32 * 0.05;
                let ray = Ray::new(Vec3::new(x, 0.5, 5.0), Vec3::new(0.0, -0.5, -5.0));
                let full = lit.trace(&ray, 1, &mut TraceContext::new(num_shadow_rays, k)).x;
                let partial = shadowed.trace(&ray, 1, &mut TraceContext::new(num_shadow_rays, k)).x;
                partial / full
            })
            .collect()
    }

    fn is_binary(ratio: f32) -> bool {
        ratio == 0.0 || (ratio - 1.0).abs() < 1e-6
    }

    #[test]
    fn test_point_light_shadow_is_hard() {
        for rays in [1, 16, 64] {
            let profile = shadow_profile(Light::point(Vec3::new(0.0, 6.0, 0.0), Color::ONE, 10.0), rays);
            assert!(profile.iter().all(|r| is_binary(*r)), "{:?}", profile);
            assert_eq!(profile[0], 0.0);
            assert!(is_binary(profile[59]) && profile[59] > 0.5);
        }
    }

    #[test]
    fn test_area_light_shadow_softens_with_more_rays() {
        let transform = Transform::from_translation(Vec3::new(0.0, 6.0, 0.0)).with_scale(Vec3::new(2.0, 1.0, 2.0));
        let panel = Light::area(&transform, Color::ONE, 10.0);

        let single = shadow_profile(panel.clone(), 1);
        assert!(single.iter().all(|r| is_binary(*r)), "{:?}", single);

        let soft = shadow_profile(panel, 16);
        let penumbra = soft.iter().filter(|r| **r > 0.05 && **r < 0.95).count();
        assert!(penumbra >= 3, "{:?}", soft);
        assert!(soft.iter().all(|r| (0.0..=1.0 + 1e-6).contains(r)));
    }

    #[test]
    fn test_trace_is_non_negative_and_bounded() {
        let panel = Light::area(
            &Transform::from_translation(Vec3::new(0.0, 8.0, 0.0)).with_scale(Vec3::splat(3.0)),
            Color::ONE,
            8.0,
        );
        let scene = Scene::new(
            SceneDescription::new(Camera::new())
                .with_sky_color(Color::new(0.1, 0.2, 0.3))
                .with_light(panel)
                .with_light(Light::point(Vec3::new(4.0, 5.0, 4.0), Color::ONE, 5.0))
                .with_object(ground())
                .with_object(Object::sphere(Vec3::new(-1.5, 1.0, 0.0), 1.0, Material::glass(1.5)))
                .with_object(Object::sphere(Vec3::new(1.5, 1.0, 0.0), 1.0, Material::mirror()))
                .with_object(Object::new(
                    Sphere::new(0.7),
                    &Transform::from_translation(Vec3::new(0.0, 0.7, 2.0)),
                    Material::metal(Color::new(0.9, 0.6, 0.2), 0.2, 3.0),
                )),
        );

        let mut ctx = TraceContext::new(4, 11);
        for k in 0..400 {
            let angle = k as f32 * 0.137;
            let origin = Vec3::new(angle.cos() * 6.0, 1.0 + (k % 5) as f32, angle.sin() * 6.0);
            let target = Vec3::new((k % 7) as f32 * 0.4 - 1.2, (k % 3) as f32 * 0.5, 0.0);
            let color = scene.trace(&Ray::new(origin, target - origin), 6, &mut ctx);
            assert!(color.is_finite());
            assert!(color.min_element() >= 0.0, "{:?}", color);
            assert!(color.max_element() < 100.0, "{:?}", color);
        }
    }
}
