//! Airpaint Headless Runner
//!
//! Drives a canvas session offscreen from a scripted or random stroke and
//! writes PNG snapshots plus a metrics CSV.

mod config;
mod metrics;
mod snapshots;
mod stroke;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use airpaint_core::{
    Airpaint, ContentRect, FrameOutcome, GpuDevice, ManualScheduler, OffscreenTarget, Props, World,
};

use config::{HeadlessConfig, StrokeConfig};
use metrics::{FieldStats, MetricsWriter};
use snapshots::SnapshotWriter;
use stroke::StrokePlan;

#[derive(Parser)]
#[command(name = "airpaint-headless")]
#[command(about = "Headless CLI runner for Airpaint stroke experiments")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Output directory for results
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,

    /// Override the configured frame count
    #[arg(long)]
    frames: Option<u32>,

    /// Override the random stroke seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    println!("Loading configuration from {}", cli.config.display());
    let text = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading {}", cli.config.display()))?;
    let mut config: HeadlessConfig =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", cli.config.display()))?;

    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(seed) = cli.seed {
        match &mut config.stroke {
            StrokeConfig::Random { seed: configured, .. } => *configured = seed,
            StrokeConfig::Scripted { .. } => bail!("--seed only applies to random strokes."),
        }
    }
    config.validate()?;

    std::fs::create_dir_all(&cli.out)?;

    println!("Initializing GPU...");
    let gpu = pollster::block_on(GpuDevice::new())?;
    println!("{}", gpu.info());

    let size = config.size();
    let scheduler = ManualScheduler::new();
    let world = World::new(config.brush.clamped(), config.wind.clamped());
    let mut canvas = Airpaint::new(Props {
        device: gpu.device.clone(),
        queue: gpu.queue.clone(),
        target: Box::new(OffscreenTarget::new(&gpu.device, size)?),
        scheduler: Box::new(scheduler.clone()),
        world,
        rect: ContentRect::sized(size.width as f32, size.height as f32),
        scale_factor: 1.0,
    })?;

    let stroke = StrokePlan::from_config(&config.stroke, size, config.frames);
    let mut metrics = MetricsWriter::new(&cli.out)?;
    let snapshots = SnapshotWriter::new(&cli.out);

    println!(
        "Running {} frames on a {}x{} canvas ({} stroke keyframes)",
        config.frames,
        size.width,
        size.height,
        stroke.points().len()
    );
    let start_time = Instant::now();

    for frame in 0..config.frames {
        let frame_start = Instant::now();

        for event in stroke.events_for(frame) {
            canvas.handle_pointer(event);
        }

        if !scheduler.take() {
            bail!("Frame {} was never scheduled.", frame);
        }
        match canvas.frame()? {
            FrameOutcome::Submitted(_) => {}
            FrameOutcome::Skipped => log::warn!("Frame {} skipped", frame),
            FrameOutcome::Disposed => bail!("Canvas disposed before frame {}.", frame),
        }

        let last = frame + 1 == config.frames;
        if frame % config.snapshot_every == 0 || last {
            gpu.wait();
            let pigment = canvas.pigment_snapshot()?;
            let water = canvas.water_snapshot()?;
            let presented = canvas.target_snapshot()?;

            let stats = FieldStats::from_rgba(&pigment, &water);
            metrics.write_frame(frame, canvas.parity().index(), &stats, frame_start.elapsed())?;
            snapshots.write_frame(frame, size, &presented)?;
            snapshots.write_pigment(frame, size, &pigment)?;

            println!(
                "Frame {}: alpha {:.4}, water {:.4}, coverage {:.4}",
                frame, stats.mean_pigment_alpha, stats.mean_water, stats.coverage
            );
        }
    }

    let frames_submitted = canvas.submitted_frames();
    canvas.dispose();

    let total_time = start_time.elapsed();
    println!(
        "Run completed: {} frames in {:.2?} ({} metric rows)",
        frames_submitted,
        total_time,
        metrics.rows()
    );
    println!("Results written to {}", cli.out.display());

    Ok(())
}
