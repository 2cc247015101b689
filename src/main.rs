mod clock;
mod config;
mod content;
mod error;
mod nav;
mod render;
mod starfield;
mod types;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{AppConfig, ConfigFile, Preset},
    error::AppError,
};

/// Single-page portfolio over a hyperspace starfield
#[derive(Parser, Debug)]
#[command(name = "starport")]
#[command(about = "Terminal portfolio with a hyperspace starfield background")]
struct Args {
    /// Starfield preset (overrides the one in the config file)
    #[arg(long, short = 'p', value_enum)]
    preset: Option<Preset>,

    /// TOML file with [starfield] and [navigation] overrides
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Seed for the particle field, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Treat the display as touch-primary (renders at reduced resolution)
    #[arg(long)]
    touch: bool,

    /// Display pixel ratio; above 2 renders at reduced resolution
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f32,

    /// Where log output goes; the terminal itself is taken by the UI
    #[arg(long, default_value = "starport.log")]
    log_file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let mut app = AppConfig::resolve(file, args.preset)?;
    app.seed = args.seed;
    app.touch_primary = args.touch;
    app.pixel_ratio = args.pixel_ratio;
    tracing::info!(
        particles = app.starfield.particle_count,
        shape = ?app.starfield.shape,
        "starting"
    );

    ui::run(app)
}

fn init_logging(path: &Path) -> Result<(), AppError> {
    let file = File::create(path).map_err(|source| AppError::LogFile {
        path: path.to_path_buf(),
        source,
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}
