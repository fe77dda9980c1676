//! Airpaint Interactive App
//!
//! Paint into a window with the mouse or touch; keyboard bindings adjust the
//! brush and wind.

mod controls;
mod viewer;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use airpaint_params::AirpaintConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            println!("Loading configuration from {}", path.display());
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str::<AirpaintConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => AirpaintConfig::default(),
    }
    .sanitized();

    println!("Starting Airpaint");
    println!("Window: {}x{}", config.window.width, config.window.height);
    println!(
        "Brush: radius {} hardness {} noise {}",
        config.brush.radius, config.brush.hardness, config.brush.noise
    );
    println!("{}", controls::HELP);

    pollster::block_on(viewer::run_viewer(config))?;

    Ok(())
}
