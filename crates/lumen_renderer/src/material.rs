//! Surface materials and the reflection / refraction helpers they use.
//!
//! A [`Material`] is a plain value. Its [`MaterialType`] tag decides which
//! secondary rays the scene traces from a hit, while the coefficients feed the
//! direct lighting term.

use std::sync::Arc;

use lumen_math::{Ray, Vec2, Vec3};

use crate::texture::{BumpMap, Texture};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Distance secondary ray origins are pushed off a surface.
pub const RAY_EPSILON: f32 = 1e-4;

/// Which secondary rays a material spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialType {
    /// Direct lighting plus a Fresnel-weighted mirror reflection
    Reflect,
    /// Direct lighting plus Fresnel-weighted reflection and refraction
    ReflectRefract,
    /// Direct lighting only
    #[default]
    Diffuse,
}

/// Surface appearance.
#[derive(Clone, Debug)]
pub struct Material {
    /// Base color, used when there is no texture
    pub color: Color,
    pub texture: Option<Arc<dyn Texture>>,
    pub bump_map: Option<Arc<dyn BumpMap>>,
    pub ambient: f32,
    /// Lambertian coefficient
    pub diffuse: f32,
    pub specular: f32,
    /// Specular exponent
    pub shininess: f32,
    pub metalness: f32,
    /// Index of refraction
    pub ior: f32,
    /// Extinction coefficient (imaginary part of a metal's IOR)
    pub k: f32,
    pub kind: MaterialType,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::splat(0.8),
            texture: None,
            bump_map: None,
            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.0,
            shininess: 32.0,
            metalness: 0.0,
            ior: 1.5,
            k: 0.0,
            kind: MaterialType::Diffuse,
        }
    }
}

impl Material {
    /// Matte surface of the given color.
    pub fn diffuse(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Near-perfect mirror with no direct lighting of its own.
    pub fn mirror() -> Self {
        Self {
            color: Color::ONE,
            ambient: 0.0,
            diffuse: 0.0,
            metalness: 1.0,
            ior: 1.0,
            k: 20.0,
            kind: MaterialType::Reflect,
            ..Self::default()
        }
    }

    /// Clear dielectric with the given index of refraction.
    pub fn glass(ior: f32) -> Self {
        Self {
            color: Color::ONE,
            ambient: 0.0,
            diffuse: 0.0,
            specular: 0.5,
            shininess: 128.0,
            ior,
            kind: MaterialType::ReflectRefract,
            ..Self::default()
        }
    }

    /// Conductor described by its complex index of refraction `ior + i k`.
    pub fn metal(color: Color, ior: f32, k: f32) -> Self {
        Self {
            color,
            ambient: 0.05,
            diffuse: 0.3,
            specular: 0.8,
            shininess: 64.0,
            metalness: 1.0,
            ior,
            k,
            kind: MaterialType::Reflect,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_texture(mut self, texture: Arc<dyn Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_bump_map(mut self, bump_map: Arc<dyn BumpMap>) -> Self {
        self.bump_map = Some(bump_map);
        self
    }

    pub fn with_ambient(mut self, ambient: f32) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_diffuse(mut self, diffuse: f32) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn with_specular(mut self, specular: f32, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    pub fn with_ior(mut self, ior: f32) -> Self {
        self.ior = ior;
        self
    }

    pub fn with_extinction(mut self, k: f32) -> Self {
        self.k = k;
        self
    }

    pub fn with_kind(mut self, kind: MaterialType) -> Self {
        self.kind = kind;
        self
    }

    /// Albedo at a texture coordinate.
    pub fn color_at(&self, uv: Vec2) -> Color {
        match &self.texture {
            Some(texture) => texture.color_at(uv),
            None => self.color,
        }
    }

    /// Normal used for shading, after bump mapping.
    ///
    /// `dpdu` and `dpdv` orient the bump map's tangent frame along the
    /// surface's texture directions.
    pub fn shading_normal(&self, normal: Vec3, dpdu: Vec3, dpdv: Vec3, uv: Vec2) -> Vec3 {
        match &self.bump_map {
            Some(bump_map) => {
                let (tangent, bitangent) = tangent_frame(normal, dpdu, dpdv);
                bump_map.perturb_normal(normal, tangent, bitangent, uv)
            }
            None => normal,
        }
    }

    /// Weight of the mirror reflection for a [`MaterialType::Reflect`] surface.
    pub fn metal_reflectance(&self, direction: Vec3, normal: Vec3) -> f32 {
        self.metalness * fresnel_metal(direction, normal, self.ior, self.k)
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Unit tangent and bitangent following `dpdu` and `dpdv`, orthogonalized
/// against the unit `normal`.
///
/// Falls back to an arbitrary frame when the uv mapping is singular.
pub fn tangent_frame(normal: Vec3, dpdu: Vec3, dpdv: Vec3) -> (Vec3, Vec3) {
    let tangent = (dpdu - normal * normal.dot(dpdu)).normalize_or_zero();
    if tangent == Vec3::ZERO {
        return normal.any_orthonormal_pair();
    }

    let bitangent = dpdv - normal * normal.dot(dpdv) - tangent * tangent.dot(dpdv);
    match bitangent.try_normalize() {
        Some(bitangent) => (tangent, bitangent),
        None => (tangent, normal.cross(tangent)),
    }
}

/// Reflect a direction about a unit normal.
///
/// The direction is normalized first, so the result is unit length.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    let v = v.normalize_or_zero();
    v - 2.0 * v.dot(n) * n
}

/// Refract a direction through a surface with outward unit normal `n`.
///
/// `ior` is the index inside the surface; the ratio is inverted when the
/// direction leaves through the surface. Returns `Vec3::ZERO` on total
/// internal reflection.
pub fn refract(v: Vec3, n: Vec3, ior: f32) -> Vec3 {
    let v = v.normalize_or_zero();
    let mut cos_i = v.dot(n).clamp(-1.0, 1.0);
    let (mut eta_i, mut eta_t) = (1.0, ior);
    let mut n = n;

    if cos_i < 0.0 {
        cos_i = -cos_i;
    } else {
        std::mem::swap(&mut eta_i, &mut eta_t);
        n = -n;
    }

    let eta = eta_i / eta_t;
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        Vec3::ZERO
    } else {
        eta * v + (eta * cos_i - k.sqrt()) * n
    }
}

/// Unpolarized Fresnel reflectance of a dielectric, `1.0` under total
/// internal reflection.
pub fn fresnel_dielectric(v: Vec3, n: Vec3, ior: f32) -> f32 {
    let cos_i = v.normalize_or_zero().dot(n).clamp(-1.0, 1.0);
    let (eta_i, eta_t) = if cos_i > 0.0 { (ior, 1.0) } else { (1.0, ior) };

    let sin_t = eta_i / eta_t * (1.0 - cos_i * cos_i).max(0.0).sqrt();
    if sin_t >= 1.0 {
        return 1.0;
    }

    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();
    let cos_i = cos_i.abs();

    let rs = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let rp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    let reflectance = (rs * rs + rp * rp) * 0.5;

    if reflectance.is_finite() {
        reflectance.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Schlick-style reflectance of a conductor with complex IOR `ior + i k`.
pub fn fresnel_metal(v: Vec3, n: Vec3, ior: f32, k: f32) -> f32 {
    let cos_i = v.normalize_or_zero().dot(n).abs().min(1.0);
    let eta = ior.max(0.0);
    let k2 = k * k;

    let numerator = (eta - 1.0).powi(2) + 4.0 * eta * (1.0 - cos_i).powi(5) + k2;
    let denominator = (eta + 1.0).powi(2) + k2;
    (numerator / denominator).clamp(0.0, 1.0)
}

/// Origin for a secondary ray leaving `point` in `direction`, pushed off
/// the surface on the side the ray travels into.
#[inline]
fn offset_origin(point: Vec3, normal: Vec3, direction: Vec3) -> Vec3 {
    if direction.dot(normal) > 0.0 {
        point + normal * RAY_EPSILON
    } else {
        point - normal * RAY_EPSILON
    }
}

/// Mirror reflection of `ray` at `point`.
pub fn reflect_ray(ray: &Ray, point: Vec3, normal: Vec3) -> Ray {
    let direction = reflect(ray.direction(), normal);
    Ray::new(offset_origin(point, normal, direction), direction)
}

/// Refraction of `ray` at `point`, or `None` on total internal reflection.
pub fn refract_ray(ray: &Ray, point: Vec3, normal: Vec3, ior: f32) -> Option<Ray> {
    let direction = refract(ray.direction(), normal, ior);
    if direction == Vec3::ZERO {
        return None;
    }
    Some(Ray::new(offset_origin(point, normal, direction), direction))
}
