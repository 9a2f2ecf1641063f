//! Lumen renderer - CPU Whitted-style ray tracing
//!
//! Recursive ray tracer with Phong shading, Fresnel reflection and refraction,
//! stratified soft shadows from area lights, and adaptive supersampling.
//! Pixels are rendered in parallel on a rayon thread pool.

mod bvh;
mod camera;
mod cuboid;
mod hittable;
mod light;
mod material;
mod mesh;
mod object;
mod plane;
mod progress;
mod renderer;
mod sampler;
mod sampling;
mod scene;
mod shape;
mod sphere;
mod texture;
mod triangle;

pub use bvh::Bvh;
pub use camera::Camera;
pub use cuboid::Cuboid;
pub use hittable::{face_forward, Hit, HitDistance, Hittable, LocalHit};
pub use light::{AmbientLight, Light, LightKind, POINT_LIGHT_RADIUS};
pub use material::{
    fresnel_dielectric, fresnel_metal, reflect, reflect_ray, refract, refract_ray, tangent_frame,
    Color, Material, MaterialType, RAY_EPSILON,
};
pub use mesh::{Mesh, MeshData};
pub use object::Object;
pub use plane::{Plane, PLANE_HALF_EXTENT};
pub use progress::ProgressTracker;
pub use renderer::{
    color_to_rgb, pixel_seed, render, render_image, render_pixel, ImageBuffer, RenderError,
    RenderResult, RenderSettings, MAX_SAMPLE_DEPTH,
};
pub use sampler::{PixelSampler, ADAPTIVE_THRESHOLD};
pub use scene::{Scene, SceneDescription, TraceContext};
pub use shape::Shape;
pub use sphere::Sphere;
pub use texture::{
    BumpMap, CheckerTexture, HeightMapBump, ImageTexture, Texture, TextureError, TextureResult,
};
pub use triangle::{Triangle, TriangleHit};

/// Re-export the math types scenes are built from
pub use lumen_math::{Aabb, Interval, Ray, Transform, TransformMatrices, Vec2, Vec3};
