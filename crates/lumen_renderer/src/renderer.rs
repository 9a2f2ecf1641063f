//! Multi-threaded render loop.
//!
//! One task per output pixel runs on a fixed-size rayon pool:
//! - Adaptive supersampling per pixel (see [`PixelSampler`])
//! - Per-pixel RNG seeded from the settings seed, so output does not depend on scheduling
//! - Whole-percent progress reporting and cooperative cancellation

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::ProgressTracker;
use crate::sampler::PixelSampler;
use crate::scene::{Scene, TraceContext};
use crate::Color;

/// Deepest adaptive subdivision accepted by [`RenderSettings::validate`].
pub const MAX_SAMPLE_DEPTH: u32 = 8;

/// Errors that can occur while rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Render cancelled")]
    Cancelled,

    #[error("Pixel ({x}, {y}) failed: {message}")]
    PixelFailed { x: u32, y: u32, message: String },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Levels of adaptive subdivision per pixel (0 = one quadrant, four corner rays)
    pub sample_depth: u32,
    /// Maximum recursion depth of `trace`
    pub bounces: u32,
    /// Shadow rays per area or sphere light
    pub num_shadow_rays: u32,
    pub thread_count: usize,
    /// Base seed for all per-pixel random streams
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_depth: 2,
            bounces: 5,
            num_shadow_rays: 16,
            thread_count: std::thread::available_parallelism().map_or(1, |n| n.get()),
            seed: 0,
        }
    }
}

impl RenderSettings {
    pub fn with_sample_depth(mut self, sample_depth: u32) -> Self {
        self.sample_depth = sample_depth;
        self
    }

    pub fn with_bounces(mut self, bounces: u32) -> Self {
        self.bounces = bounces;
        self
    }

    pub fn with_shadow_rays(mut self, num_shadow_rays: u32) -> Self {
        self.num_shadow_rays = num_shadow_rays;
        self
    }

    pub fn with_threads(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.num_shadow_rays < 1 {
            return Err(RenderError::InvalidSettings(
                "num_shadow_rays must be at least 1".to_string(),
            ));
        }
        if self.thread_count < 1 {
            return Err(RenderError::InvalidSettings(
                "thread_count must be at least 1".to_string(),
            ));
        }
        if self.sample_depth > MAX_SAMPLE_DEPTH {
            return Err(RenderError::InvalidSettings(format!(
                "sample_depth {} exceeds the maximum of {}",
                self.sample_depth, MAX_SAMPLE_DEPTH
            )));
        }
        Ok(())
    }
}

/// Convert a color to 8-bit RGB, clamping each channel to [0, 1].
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let convert = |c: f32| (255.0 * c.clamp(0.0, 1.0)).round() as u8;
    [convert(color.x), convert(color.y), convert(color.z)]
}

/// Simple image buffer for storing render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| image::Rgb(color_to_rgb(self.get(x, y))))
    }

    /// Write the image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        self.to_rgb8().save(path)?;
        Ok(())
    }
}

/// Seed of the random stream for the pixel at `index` (row-major).
pub fn pixel_seed(seed: u64, index: u64) -> u64 {
    seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Render a single pixel with adaptive supersampling.
pub fn render_pixel(scene: &Scene, settings: &RenderSettings, x: u32, y: u32) -> Color {
    let index = y as u64 * scene.camera().image_width as u64 + x as u64;
    let mut ctx = TraceContext::new(settings.num_shadow_rays, pixel_seed(settings.seed, index));
    let mut sampler = PixelSampler::new(scene, x, y, settings.sample_depth);
    sampler.render(settings.bounces, &mut ctx)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Render the whole image into a buffer.
///
/// Blocks until every pixel is done. `progress` receives whole percentages;
/// setting `cancel` makes the remaining pixel tasks bail out with
/// [`RenderError::Cancelled`]. A panic inside a pixel task does not stop the
/// others; once every pixel has been attempted the failing pixel with the
/// lowest index is reported as [`RenderError::PixelFailed`].
pub fn render_image(
    scene: &Scene,
    settings: &RenderSettings,
    progress: &(dyn Fn(u32) + Sync),
    cancel: Option<&AtomicBool>,
) -> RenderResult<ImageBuffer> {
    settings.validate()?;

    let camera = scene.camera();
    let (width, height) = (camera.image_width, camera.image_height);
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSettings(format!(
            "image size {}x{} has no pixels",
            width, height
        )));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.thread_count)
        .build()?;

    log::info!(
        "Rendering {}x{} on {} threads (depth {}, {} bounces, {} shadow rays)",
        width,
        height,
        settings.thread_count,
        settings.sample_depth,
        settings.bounces,
        settings.num_shadow_rays
    );

    let start = Instant::now();
    let mut image = ImageBuffer::new(width, height);
    let tracker = ProgressTracker::new(image.pixels.len(), progress);
    let row_length = width as usize;

    // Lowest failing pixel index wins so the reported pixel does not depend on scheduling
    let failure: Mutex<Option<(usize, RenderError)>> = Mutex::new(None);
    let skipped = AtomicBool::new(false);

    pool.install(|| {
        image.pixels.par_iter_mut().enumerate().for_each(|(index, pixel)| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                skipped.store(true, Ordering::Relaxed);
                return;
            }

            let x = (index % row_length) as u32;
            let y = (index / row_length) as u32;
            match panic::catch_unwind(AssertUnwindSafe(|| render_pixel(scene, settings, x, y))) {
                Ok(color) => *pixel = color,
                Err(payload) => {
                    let error = RenderError::PixelFailed {
                        x,
                        y,
                        message: panic_message(payload.as_ref()),
                    };
                    let mut first = failure.lock().unwrap_or_else(PoisonError::into_inner);
                    if first.as_ref().map_or(true, |(earliest, _)| index < *earliest) {
                        *first = Some((index, error));
                    }
                }
            }

            tracker.pixel_done();
        })
    });

    if let Some((_, error)) = failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
        log::error!("{}", error);
        return Err(error);
    }
    if skipped.load(Ordering::Relaxed) {
        log::info!(
            "Render cancelled after {} of {} pixels",
            tracker.completed(),
            image.pixels.len()
        );
        return Err(RenderError::Cancelled);
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}

/// Render the scene and write it to `path`.
pub fn render(
    scene: &Scene,
    path: impl AsRef<Path>,
    settings: &RenderSettings,
    progress: &(dyn Fn(u32) + Sync),
) -> RenderResult<ImageBuffer> {
    let image = render_image(scene, settings, progress, None)?;
    let path = path.as_ref();
    image.save(path)?;
    log::info!("Saved {}", path.display());
    Ok(image)
}
