//! RathaNav - race simulation on a rasterized track
//!
//! Loads (or generates) a track, spawns planner-driven agents and an
//! optional keyboard-driven one, runs the race loop and logs a summary.
//!
//! ```text
//! ratha-nav [--config ratha.toml] [--track track.png] [--ticks N] [--remote URL]
//! ```

use clap::Parser;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ratha_nav::{
    NavError, PlannerMode, RathaConfig, Result, SharedInput, Track, build_race, plan_service,
};

const DEFAULT_CONFIG: &str = "ratha.toml";
const DEFAULT_LOG_FILTER: &str = "ratha_nav=info,patha_map=info";

#[derive(Parser, Debug)]
#[command(name = "ratha-nav", version, about = "Track navigation race simulation")]
struct Args {
    /// Configuration file (default: ratha.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Track image, overrides [track] image
    #[arg(long)]
    track: Option<PathBuf>,

    /// Ticks to simulate, overrides [simulation] ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Plan through this HTTP endpoint instead of locally
    #[arg(long)]
    remote: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .try_init()
        .map_err(|e| NavError::Logging(e.to_string()))?;

    let args = Args::parse();
    let config = load_config(&args)?;
    config.validate()?;

    info!("RathaNav v{}", env!("CARGO_PKG_VERSION"));

    let track = Track::load(&config.track)?;
    let service = plan_service(&config, Arc::clone(&track.map))?;
    let (race, input) = build_race(&config, &track, service);

    if let Some(input) = input {
        spawn_keyboard(input)?;
        info!("Player keys on stdin: w/s throttle, a/d steer, x straight, q release");
    }

    let mut race = race.with_tick_period(config.tick_period());
    let summary = race.run(config.simulation.ticks);

    info!(
        "Finished {} ticks in {:.2}s",
        summary.ticks,
        summary.elapsed.as_secs_f32()
    );
    for agent in &summary.agents {
        info!("{}", agent);
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<RathaConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            RathaConfig::load(path)?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG);
            RathaConfig::load(Path::new(DEFAULT_CONFIG))?
        }
        None => {
            info!("Using default configuration");
            RathaConfig::default()
        }
    };

    if let Some(track) = &args.track {
        config.track.image = Some(track.clone());
    }
    if let Some(ticks) = args.ticks {
        config.simulation.ticks = ticks;
    }
    if let Some(endpoint) = &args.remote {
        info!("Using remote planner at {}", endpoint);
        config.planner.mode = PlannerMode::Remote;
        config.remote.endpoint = endpoint.clone();
    }

    Ok(config)
}

/// Feed stdin key letters into the player's shared input.
fn spawn_keyboard(input: Arc<SharedInput>) -> Result<()> {
    std::thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                for key in line.chars().filter(|c| !c.is_whitespace()) {
                    if !input.apply_key(key) {
                        warn!("Unknown key {:?}", key);
                    }
                }
            }
        })?;
    Ok(())
}
