//! gesture_board: interactive entry point.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use gesture_board::app::run;
use gesture_board::config::AppConfig;
use gesture_board::replay::ReplayLandmarkSource;
use gesture_board::source::{LandmarkSource, SimLandmarkSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gesture_board", about = "Live hand-gesture board")]
struct Cli {
    /// TOML configuration; missing file means defaults.
    #[arg(long, default_value = "gesture_board.toml")]
    config: PathBuf,

    /// Play recorded landmarks (JSON Lines) instead of the keyboard simulator.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Seed for particles and simulator jitter.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gesture_board=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = AppConfig::load_or_default(&cli.config);
    if cli.replay.is_some() {
        cfg.source.replay = cli.replay.clone();
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║            Gesture Board : Live Hand-Pose Classifier         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let latency = Duration::from_millis(cfg.source.latency_ms);
    let (source, sim_tx): (Box<dyn LandmarkSource>, _) = match &cfg.source.replay {
        Some(path) => {
            let replay = ReplayLandmarkSource::open(path, latency)?;
            println!("  Mode: Replay {} ({} frames)", path.display(), replay.frame_count());
            (Box::new(replay), None)
        }
        None => {
            let (tx, rx) = mpsc::channel();
            println!("  Mode: Keyboard simulation  (1-7 pose, 0 no hand, C camera, Q quit)");
            (Box::new(SimLandmarkSource::new(rx, latency, cli.seed)), Some(tx))
        }
    };
    println!();
    println!("  Opening board window…");
    println!();

    info!(seed = cli.seed, config = %cli.config.display(), "starting");
    run(cfg, source, sim_tx, cli.seed)
}
