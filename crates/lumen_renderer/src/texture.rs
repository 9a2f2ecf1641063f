//! Textures and bump maps sampled by materials.
//!
//! Both are queried with a surface texture coordinate. Image-backed lookups
//! wrap the coordinate into `[0, 1)` so tiling is the default behavior.

use std::fmt::Debug;
use std::path::Path;

use image::RgbImage;
use lumen_math::{Vec2, Vec3};
use thiserror::Error;

use crate::Color;

/// Errors that can occur while building a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Texture has no pixels")]
    Empty,

    #[error("Expected {expected} texels for a {width}x{height} texture, got {actual}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A color lookup over texture space.
pub trait Texture: Send + Sync + Debug {
    fn color_at(&self, uv: Vec2) -> Color;
}

/// A normal perturbation over texture space.
pub trait BumpMap: Send + Sync + Debug {
    /// Perturb a unit normal given the surface tangent frame at `uv`.
    fn perturb_normal(&self, normal: Vec3, tangent: Vec3, bitangent: Vec3, uv: Vec2) -> Vec3;
}

/// Wrap a texture coordinate to a texel index on an axis of `size` texels.
fn wrap_texel(coord: f32, size: u32) -> u32 {
    let wrapped = coord.rem_euclid(1.0);
    ((wrapped * size as f32) as u32).min(size - 1)
}

fn check_dimensions(width: u32, height: u32, actual: usize) -> TextureResult<()> {
    if width == 0 || height == 0 {
        return Err(TextureError::Empty);
    }
    let expected = width as usize * height as usize;
    if expected != actual {
        return Err(TextureError::DimensionMismatch {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Nearest-neighbour sampled RGB image.
///
/// Texels are stored row-major with row 0 at the top; `v = 0` maps to the
/// bottom row. Channel values are taken as-is (byte / 255), without any
/// color space conversion.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl ImageTexture {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> TextureResult<Self> {
        check_dimensions(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Load an image file in any format the `image` crate can decode.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgb8();
        let texture = Self::from_rgb_image(&image)?;

        log::debug!(
            "Loaded texture: {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );

        Ok(texture)
    }

    pub fn from_rgb_image(image: &RgbImage) -> TextureResult<Self> {
        let (width, height) = image.dimensions();
        let pixels = image
            .pixels()
            .map(|p| Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0)
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn texel(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }
}

impl Texture for ImageTexture {
    fn color_at(&self, uv: Vec2) -> Color {
        let x = wrap_texel(uv.x, self.width);
        // Flip V for image coordinates
        let y = self.height - 1 - wrap_texel(uv.y, self.height);
        self.texel(x, y)
    }
}

/// Two-color checkerboard in texture space.
///
/// Defined over the whole texture plane, so it tiles without wrapping.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckerTexture {
    even: Color,
    odd: Color,
    /// Squares per unit of texture space
    scale: f32,
}

impl CheckerTexture {
    pub fn new(even: Color, odd: Color, scale: f32) -> Self {
        Self { even, odd, scale }
    }
}

impl Texture for CheckerTexture {
    fn color_at(&self, uv: Vec2) -> Color {
        let cell = (uv * self.scale).floor();
        let parity = (cell.x as i64 + cell.y as i64).rem_euclid(2);
        if parity == 0 {
            self.even
        } else {
            self.odd
        }
    }
}

/// Bump map driven by the luminance of a height image.
///
/// The normal is tilted against the height gradient, estimated with forward
/// differences between neighbouring texels.
#[derive(Clone, Debug)]
pub struct HeightMapBump {
    width: u32,
    height: u32,
    heights: Vec<f32>,
    strength: f32,
}

impl HeightMapBump {
    pub fn new(width: u32, height: u32, heights: Vec<f32>, strength: f32) -> TextureResult<Self> {
        check_dimensions(width, height, heights.len())?;
        Ok(Self {
            width,
            height,
            heights,
            strength,
        })
    }

    pub fn load(path: impl AsRef<Path>, strength: f32) -> TextureResult<Self> {
        let image = image::open(path.as_ref())?.to_rgb8();
        Self::from_rgb_image(&image, strength)
    }

    pub fn from_rgb_image(image: &RgbImage, strength: f32) -> TextureResult<Self> {
        let (width, height) = image.dimensions();
        let heights = image
            .pixels()
            .map(|p| (0.2126 * p[0] as f32 + 0.7152 * p[1] as f32 + 0.0722 * p[2] as f32) / 255.0)
            .collect();
        Self::new(width, height, heights, strength)
    }

    fn height_at(&self, x: u32, y: u32) -> f32 {
        self.heights[((y % self.height) * self.width + (x % self.width)) as usize]
    }
}

impl BumpMap for HeightMapBump {
    fn perturb_normal(&self, normal: Vec3, tangent: Vec3, bitangent: Vec3, uv: Vec2) -> Vec3 {
        let x = wrap_texel(uv.x, self.width);
        let y = self.height - 1 - wrap_texel(uv.y, self.height);

        let h = self.height_at(x, y);
        let du = self.height_at(x + 1, y) - h;
        // Rows run downwards while v runs upwards
        let dv = self.height_at(x, y + self.height - 1) - h;

        let perturbed = normal - self.strength * (du * tangent + dv * bitangent);
        let perturbed = perturbed.normalize_or_zero();
        if perturbed == Vec3::ZERO {
            normal
        } else {
            perturbed
        }
    }
}
