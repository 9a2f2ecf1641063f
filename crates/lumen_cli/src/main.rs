//! Lumen command-line renderer.
//!
//! Renders one of the built-in scenes to an image file:
//!
//! ```text
//! lumen [--scene NAME] [--output PATH] [--settings FILE] [--width W] [--height H]
//!       [--threads N] [--depth N] [--bounces N] [--shadow-rays N] [--seed N]
//! ```

mod scenes;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_renderer::{render, RenderSettings, Scene};

/// Command line arguments
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "lumen")]
#[command(about = "Render a built-in scene with the Lumen ray tracer")]
struct Args {
    /// Built-in scene to render (spheres, mesh, empty)
    #[arg(long, default_value = "spheres")]
    scene: String,

    /// Output image; the format follows the extension
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// JSON render settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 360)]
    height: u32,

    // Overrides applied on top of the settings file
    /// Worker threads (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Adaptive supersampling depth
    #[arg(long)]
    depth: Option<u32>,

    /// Maximum reflection/refraction recursion
    #[arg(long)]
    bounces: Option<u32>,

    /// Shadow rays per area light
    #[arg(long)]
    shadow_rays: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,
}

/// Settings from the optional JSON file with command-line overrides applied.
fn load_settings(args: &Args) -> Result<RenderSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse settings file {}", path.display()))?
        }
        None => RenderSettings::default(),
    };

    if let Some(threads) = args.threads {
        settings.thread_count = threads;
    }
    if let Some(depth) = args.depth {
        settings.sample_depth = depth;
    }
    if let Some(bounces) = args.bounces {
        settings.bounces = bounces;
    }
    if let Some(shadow_rays) = args.shadow_rays {
        settings.num_shadow_rays = shadow_rays;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    settings.validate()?;
    Ok(settings)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let settings = load_settings(&args)?;

    let description = scenes::build(&args.scene, args.width, args.height).with_context(|| {
        format!(
            "unknown scene '{}' (available: {})",
            args.scene,
            scenes::SCENE_NAMES.join(", ")
        )
    })?;

    log::info!("Starting Lumen: scene '{}'", args.scene);
    let scene = Scene::new(description);

    // Log every 10%, skipping steps a small image jumps over
    let last_step = AtomicU32::new(0);
    let progress = |percent: u32| {
        let step = percent / 10;
        if last_step.fetch_max(step, Ordering::Relaxed) < step {
            log::info!("{}%", step * 10);
        }
    };

    let start = Instant::now();
    render(&scene, &args.output, &settings, &progress)
        .with_context(|| format!("failed to render to {}", args.output.display()))?;

    log::info!(
        "Wrote {} in {:.2?}",
        args.output.display(),
        start.elapsed()
    );
    Ok(())
}
