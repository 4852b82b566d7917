//! autocat - terminal autoplayer for one-key rhythm charts
//!
//! Run with: cargo run -- demos/demo.json

mod app;
mod injector;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use log::LevelFilter;

use app::App;
use autocat::PlayerConfig;

/// Presses one key in time with a chart. Insert/Space toggles playback,
/// Left/Right shift the timing by one nudge step.
#[derive(Debug, Parser)]
#[command(name = "autocat", version, about)]
struct Args {
    /// Chart file (JSON) to load at startup
    chart: Option<PathBuf>,

    /// Starting offset in milliseconds (positive fires later)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset_ms: i64,

    /// Press length for taps in milliseconds
    #[arg(long, default_value_t = 10)]
    tap_ms: i64,

    /// Offset change per Left/Right key in milliseconds
    #[arg(long, default_value_t = 5)]
    nudge_ms: i64,

    /// Pre-roll before the first tile, in beats
    #[arg(long, default_value_t = 4.0)]
    countdown_beats: f64,

    /// How long a stop waits for the playback thread, in milliseconds
    #[arg(long, default_value_t = 100)]
    stop_wait_ms: u64,

    /// Write logs to this file (the terminal belongs to the UI)
    #[arg(long, env = "AUTOCAT_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn player_config(&self) -> PlayerConfig {
        const MS: i64 = 1_000_000;
        PlayerConfig {
            countdown_beats: self.countdown_beats,
            tap_ns: self.tap_ms * MS,
            nudge_step_ns: self.nudge_ms * MS,
            stop_wait_ms: self.stop_wait_ms,
            offset_ns: self.offset_ms * MS,
        }
    }
}

fn init_logging(log_file: Option<&Path>, verbose: bool) -> EyreResult<()> {
    let mut builder = env_logger::Builder::new();

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
            let level = if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            builder
                .filter_level(level)
                .parse_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(LevelFilter::Off);
        }
    }

    builder.try_init().wrap_err("failed to initialise logging")
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.verbose)?;

    let mut app = App::new(args.player_config());
    if let Some(path) = args.chart {
        app = app.chart(path);
    }
    app.run()
}
