// Transform utilities for Mat4
//
// Objects and area lights are placed with translation / Euler rotation / scale
// components composed once into a model matrix.

use crate::Aabb;
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Scale components smaller than this are clamped so the model matrix stays invertible.
pub const SCALE_EPSILON: f32 = 1e-4;

/// Determinant below which a matrix is treated as singular.
const SINGULAR_DETERMINANT: f32 = 1e-12;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// True when the matrix has a usable inverse.
    fn is_invertible(&self) -> bool;

    /// The inverse matrix, or the matrix itself when it is singular.
    fn inverse_or_self(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::from_point_cloud(aabb.corners().map(|corner| self.transform_point3(corner)))
    }

    fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > SINGULAR_DETERMINANT
    }

    fn inverse_or_self(&self) -> Mat4 {
        if self.is_invertible() {
            self.inverse()
        } else {
            *self
        }
    }
}

/// Translation, rotation (Euler XYZ, degrees) and scale of a scene element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Rotation around X, Y and Z in degrees
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Scale with near-zero components pushed out to `SCALE_EPSILON`.
    pub fn clamped_scale(&self) -> Vec3 {
        let clamp = |s: f32| {
            if s.abs() >= SCALE_EPSILON {
                s
            } else if s < 0.0 {
                -SCALE_EPSILON
            } else {
                SCALE_EPSILON
            }
        };
        Vec3::new(clamp(self.scale.x), clamp(self.scale.y), clamp(self.scale.z))
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.clamped_scale(), rotation, self.translation)
    }
}

/// Model matrix together with the matrices derived from it for ray tracing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformMatrices {
    /// Local-to-world
    pub model: Mat4,
    /// World-to-local, used to bring rays into object space
    pub inverse: Mat4,
    /// Inverse-transpose, used to bring normals back to world space
    pub normal: Mat4,
}

impl TransformMatrices {
    pub fn from_matrix(model: Mat4) -> Self {
        if !model.is_invertible() {
            log::warn!("Singular transform matrix, object will not be transformed correctly");
        }
        let inverse = model.inverse_or_self();
        Self {
            model,
            inverse,
            normal: inverse.transpose(),
        }
    }

    /// World-space direction of a local-space normal (unit length).
    pub fn normal_to_world(&self, normal: Vec3) -> Vec3 {
        self.normal.transform_vector3(normal).normalize_or_zero()
    }
}

impl From<&Transform> for TransformMatrices {
    fn from(transform: &Transform) -> Self {
        Self::from_matrix(transform.to_matrix())
    }
}

impl Default for TransformMatrices {
    fn default() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min() - Vec3::splat(5.0)).length() < 0.001);
        assert!((transformed.max() - Vec3::splat(6.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_rotation_encloses_corners() {
        let transform = Transform::default().with_rotation(Vec3::new(0.0, 45.0, 0.0));
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let transformed = transform.to_matrix().transform_aabb(&aabb);

        let half_diagonal = 2.0_f32.sqrt();
        assert!((transformed.x.max - half_diagonal).abs() < 1e-4);
        assert!((transformed.y.max - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_is_in_degrees() {
        let transform = Transform::default().with_rotation(Vec3::new(0.0, 0.0, 90.0));
        let rotated = transform.to_matrix().transform_vector3(Vec3::X);

        assert!((rotated - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_zero_scale_is_clamped() {
        let transform = Transform::default().with_scale(Vec3::new(0.0, -0.0, 2.0));
        let scale = transform.clamped_scale();

        assert_eq!(scale, Vec3::new(SCALE_EPSILON, SCALE_EPSILON, 2.0));
        assert!(transform.to_matrix().is_invertible());
    }

    #[test]
    fn test_singular_matrix_inverse_is_self() {
        let singular = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(!singular.is_invertible());
        assert_eq!(singular.inverse_or_self(), singular);
    }

    #[test]
    fn test_matrices_round_trip() {
        let transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Vec3::new(10.0, 20.0, 30.0))
            .with_scale(Vec3::new(2.0, 1.0, 0.5));
        let matrices = TransformMatrices::from(&transform);

        let point = Vec3::new(0.3, -0.7, 1.1);
        let back = matrices.inverse.transform_point3(matrices.model.transform_point3(point));
        assert!((back - point).length() < 1e-4);
    }

    #[test]
    fn test_normal_matrix_keeps_normals_perpendicular() {
        let transform = Transform::default().with_scale(Vec3::new(4.0, 1.0, 1.0));
        let matrices = TransformMatrices::from(&transform);

        // Local plane x + y = 0 has normal (1, 1, 0); stretching along X tilts it
        let tangent_world = matrices.model.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        let normal_world = matrices.normal_to_world(Vec3::new(1.0, 1.0, 0.0));

        assert!(tangent_world.dot(normal_world).abs() < 1e-5);
        assert!((normal_world.length() - 1.0).abs() < 1e-5);
    }
}
