//! Lumen math - value types shared by the renderer crates.
//!
//! Vectors and matrices come from glam; this crate adds the ray, interval,
//! bounding box and transform types the ray tracer is built on.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{Mat4Ext, Transform, TransformMatrices, SCALE_EPSILON};
