//! Scene objects: a shape placed in the world with a material.

use crate::hittable::{Hit, Hittable, LocalHit};
use crate::{Cuboid, Material, Mesh, Plane, Shape, Sphere};
use lumen_math::{Aabb, Interval, Mat4, Mat4Ext, Ray, Transform, TransformMatrices, Vec3};

/// A shape with its transform and material.
///
/// Intersection happens in object space: world rays are brought in with the
/// inverse matrix without renormalizing the direction, so `t` values are the
/// same in both spaces.
#[derive(Debug)]
pub struct Object {
    shape: Shape,
    material: Material,
    matrices: TransformMatrices,
    /// World-space bounds, computed once
    bbox: Aabb,
    centroid: Vec3,
}

impl Object {
    pub fn new(shape: impl Into<Shape>, transform: &Transform, material: Material) -> Self {
        Self::from_matrix(shape, transform.to_matrix(), material)
    }

    pub fn from_matrix(shape: impl Into<Shape>, model: Mat4, material: Material) -> Self {
        let shape = shape.into();
        let matrices = TransformMatrices::from_matrix(model);
        let bbox = model.transform_aabb(&shape.bounding_box());

        Self {
            shape,
            material,
            matrices,
            bbox,
            centroid: bbox.centroid(),
        }
    }

    pub fn sphere(center: Vec3, radius: f32, material: Material) -> Self {
        Self::new(Sphere::new(radius), &Transform::from_translation(center), material)
    }

    /// Unit cube placed by `transform`.
    pub fn cuboid(transform: &Transform, material: Material) -> Self {
        Self::new(Cuboid::default(), transform, material)
    }

    /// Ground plane (local `y = 0`) placed by `transform`.
    pub fn plane(transform: &Transform, material: Material) -> Self {
        Self::new(Plane::new(), transform, material)
    }

    pub fn mesh(mesh: Mesh, transform: &Transform, material: Material) -> Self {
        Self::new(mesh, transform, material)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn matrices(&self) -> &TransformMatrices {
        &self.matrices
    }

    /// The ray expressed in this object's local space.
    pub fn local_ray(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.matrices.inverse.transform_point3(ray.origin()),
            self.matrices.inverse.transform_vector3(ray.direction()),
        )
    }

    /// Complete a local-space hit into a world-space record.
    pub fn to_world_hit(&self, ray: &Ray, local: LocalHit) -> Hit<'_> {
        Hit {
            object: self,
            triangle: local.triangle,
            point: ray.at(local.t),
            normal: self.matrices.normal_to_world(local.normal),
            uv: local.uv,
            dpdu: self.matrices.model.transform_vector3(local.dpdu),
            dpdv: self.matrices.model.transform_vector3(local.dpdv),
            t: local.t,
        }
    }

    /// World-space intersection strictly inside `ray_t`.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        let local = self.hit(ray, ray_t)?;
        Some(self.to_world_hit(ray, local))
    }
}

impl Hittable for Object {
    type Hit = LocalHit;

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
        self.shape.hit(&self.local_ray(ray), ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn centroid(&self) -> Vec3 {
        self.centroid
    }
}
