mod aabb;
mod aggregate;
mod base;
mod bvh;
mod camera;
mod color;
mod config;
mod error;
mod light;
mod material;
mod point;
mod progress;
mod quaternion;
mod ray;
mod sampling;
mod scene;
mod scheduler;
mod shape;
mod tracer;
mod transform;
mod utils;
mod vector;

use crate::config::{AaMode, BvhStrategy, RenderConfig, ThreadMode};
use crate::progress::Progress;
use crate::scheduler::FrameBuffer;

use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// An offline Phong ray tracer: reads a JSON scene description, renders it
/// with recursive reflection/refraction and soft shadows, and writes the
/// result out as a PNG.
#[derive(Parser, Debug)]
#[command(name = "phong-trace", version, about = "An offline Phong ray tracer")]
struct Cli {
    /// Path to the JSON scene description to render
    scene: PathBuf,

    /// Path to write the rendered PNG to
    output: PathBuf,

    /// "sequential", "auto" (data-parallel via rayon), or a worker count
    #[arg(long, default_value = "auto")]
    threads: String,

    /// Fixed k x k supersampling grid per pixel; 0 disables SSAA
    #[arg(long, default_value_t = 0)]
    samples: u32,

    /// Use adaptive (corner-variance) SSAA instead, subdividing up to this
    /// many levels. Overrides --samples.
    #[arg(long)]
    adaptive_samples: Option<u32>,

    /// Override the scene file's output width
    #[arg(long)]
    width: Option<u32>,

    /// Override the scene file's output height
    #[arg(long)]
    height: Option<u32>,

    /// Jitter shadow rays over each light's disk instead of casting one
    #[arg(long)]
    soft_shadows: bool,

    /// BVH acceleration strategy
    #[arg(long, value_enum, default_value_t = BvhArg::Sah)]
    bvh: BvhArg,

    /// Maximum reflection/refraction recursion depth
    #[arg(long, default_value_t = 5)]
    max_depth: u32,

    /// Base seed for per-pixel RNGs (soft shadows, adaptive SSAA jitter)
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BvhArg {
    Off,
    Median,
    Sah,
}

impl From<BvhArg> for BvhStrategy {
    fn from(arg: BvhArg) -> BvhStrategy {
        match arg {
            BvhArg::Off => BvhStrategy::Off,
            BvhArg::Median => BvhStrategy::Median,
            BvhArg::Sah => BvhStrategy::Sah,
        }
    }
}

fn parse_threads(raw: &str) -> Result<ThreadMode, String> {
    match raw {
        "auto" => Ok(ThreadMode::DataParallel),
        "sequential" => Ok(ThreadMode::Sequential),
        n => match n.parse::<usize>() {
            Ok(0) => Ok(ThreadMode::Sequential),
            Ok(workers) => Ok(ThreadMode::WorkerPool(workers)),
            Err(_) => Err(format!("'{}' is not 'auto', 'sequential', or a worker count", n)),
        },
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phong_trace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let threads = match parse_threads(&cli.threads) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("invalid --threads value: {}", e);
            process::exit(1);
        }
    };

    let bvh_strategy = BvhStrategy::from(cli.bvh);
    let aa_mode = match cli.adaptive_samples {
        Some(max_depth) => AaMode::AdaptiveSsaa(max_depth),
        None if cli.samples > 1 => AaMode::Ssaa(cli.samples),
        None => AaMode::Off,
    };

    let config = RenderConfig {
        max_depth: cli.max_depth,
        soft_shadows: cli.soft_shadows,
        aa_mode,
        bvh: bvh_strategy,
        threads,
        seed: cli.seed,
        ..RenderConfig::default()
    };

    let scene_json = match std::fs::read_to_string(&cli.scene) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to read scene file '{}': {}", cli.scene.display(), e);
            process::exit(1);
        }
    };

    let resolution_override = match (cli.width, cli.height) {
        (Some(w), Some(h)) => Some((w, h)),
        (None, None) => None,
        _ => {
            eprintln!("--width and --height must be given together");
            process::exit(1);
        }
    };

    let scene = match scene::load(&scene_json, config.bvh, config.leaf_size, resolution_override) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to parse scene '{}': {}", cli.scene.display(), e);
            process::exit(1);
        }
    };

    let (width, height) = scene.camera.resolution();
    tracing::info!(width, height, ?config.threads, ?config.aa_mode, "starting render");

    let framebuffer = FrameBuffer::new(width, height);
    let (width, height) = framebuffer.dimensions();
    let progress = Mutex::new(Progress::new(
        width as u64 * height as u64,
        std::sync::Arc::new(Mutex::new(io::stdout())),
        40_u32,
    ));

    let start = Instant::now();
    scheduler::render(&scene, &config, &framebuffer, Some(&progress));
    progress.lock().unwrap().done();
    let elapsed = start.elapsed();
    tracing::info!(seconds = elapsed.as_secs_f64(), "render finished");

    let data = framebuffer.into_rgb8();
    match image::save_buffer(&cli.output, &data, width, height, image::ColorType::Rgb8) {
        Ok(()) => eprintln!(
            "wrote {} ({}x{}) in {:.2}s",
            cli.output.display(),
            width,
            height,
            elapsed.as_secs_f64()
        ),
        Err(e) => {
            eprintln!("failed to write '{}': {}", cli.output.display(), e);
            process::exit(1);
        }
    }
}
