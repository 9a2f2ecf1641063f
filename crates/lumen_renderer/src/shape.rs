//! The closed set of object geometries.

use crate::hittable::{Hittable, LocalHit};
use crate::{Cuboid, Mesh, Plane, Sphere};
use lumen_math::{Aabb, Interval, Ray};

/// Object-space geometry of a scene object.
#[derive(Debug)]
pub enum Shape {
    Sphere(Sphere),
    Cuboid(Cuboid),
    Plane(Plane),
    Mesh(Mesh),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Sphere(_) => "sphere",
            Shape::Cuboid(_) => "cuboid",
            Shape::Plane(_) => "plane",
            Shape::Mesh(_) => "mesh",
        }
    }
}

impl Hittable for Shape {
    type Hit = LocalHit;

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
        match self {
            Shape::Sphere(sphere) => sphere.hit(ray, ray_t),
            Shape::Cuboid(cuboid) => cuboid.hit(ray, ray_t),
            Shape::Plane(plane) => plane.hit(ray, ray_t),
            Shape::Mesh(mesh) => mesh.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(sphere) => sphere.bounding_box(),
            Shape::Cuboid(cuboid) => cuboid.bounding_box(),
            Shape::Plane(plane) => plane.bounding_box(),
            Shape::Mesh(mesh) => mesh.bounding_box(),
        }
    }
}

impl From<Sphere> for Shape {
    fn from(sphere: Sphere) -> Self {
        Shape::Sphere(sphere)
    }
}

impl From<Cuboid> for Shape {
    fn from(cuboid: Cuboid) -> Self {
        Shape::Cuboid(cuboid)
    }
}

impl From<Plane> for Shape {
    fn from(plane: Plane) -> Self {
        Shape::Plane(plane)
    }
}

impl From<Mesh> for Shape {
    fn from(mesh: Mesh) -> Self {
        Shape::Mesh(mesh)
    }
}
