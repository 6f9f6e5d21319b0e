//! Configuration loading for RathaNav

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{NavError, Result};
use crate::navigation::{FollowerConfig, ReplanConfig};
use crate::planning::{PlannerConfig, PlannerMode, RemoteConfig};
use crate::track::TrackConfig;

/// Tick period used when something outside the loop needs real time
const REALTIME_TICK_MS: u64 = 16;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RathaConfig {
    #[serde(default)]
    pub track: TrackConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub follower: FollowerConfig,
    #[serde(default)]
    pub replan: ReplanConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Race loop settings
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Ticks to run (default: 3600)
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Planner-driven agents (default: 3)
    #[serde(default = "default_ai_agents")]
    pub ai_agents: usize,

    /// Distance between starting positions along the centerline
    #[serde(default = "default_spawn_spacing")]
    pub spawn_spacing: f32,

    /// Ticks between status log lines, 0 disables (default: 600)
    #[serde(default = "default_status_interval")]
    pub status_interval: u64,

    /// Add a keyboard-driven agent (default: false)
    #[serde(default)]
    pub manual_agent: bool,

    /// Wall-clock milliseconds per tick, 0 runs flat out (default: 0)
    #[serde(default)]
    pub tick_ms: u64,
}

fn default_ticks() -> u64 {
    3600
}
fn default_ai_agents() -> usize {
    3
}
fn default_spawn_spacing() -> f32 {
    30.0
}
fn default_status_interval() -> u64 {
    600
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            ai_agents: default_ai_agents(),
            spawn_spacing: default_spawn_spacing(),
            status_interval: default_status_interval(),
            manual_agent: false,
            tick_ms: 0,
        }
    }
}

impl RathaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        let config: RathaConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let f = &self.follower;
        let checks = [
            (self.track.cell_size >= 1, "track.cell_size must be at least 1"),
            (self.track.centerline_step > 0.0, "track.centerline_step must be positive"),
            (f.max_speed > 0.0, "follower.max_speed must be positive"),
            (f.max_turn_rate > 0.0, "follower.max_turn_rate must be positive"),
            (f.arrival_tolerance > 0.0, "follower.arrival_tolerance must be positive"),
            (
                f.min_speed_factor > 0.0 && f.min_speed_factor <= 1.0,
                "follower.min_speed_factor must be in (0, 1]",
            ),
            (f.crawl_speed > 0.0, "follower.crawl_speed must be positive"),
            (
                self.replan.deviation_threshold > 0.0,
                "replan.deviation_threshold must be positive",
            ),
            (
                self.replan.plan_timeout_ticks >= 1,
                "replan.plan_timeout_ticks must be at least 1",
            ),
            (self.planner.max_iterations >= 1, "planner.max_iterations must be at least 1"),
            (self.planner.snap_radius >= 0.0, "planner.snap_radius must not be negative"),
            (
                self.planner.search_radius.is_none_or(|r| r > 0.0),
                "planner.search_radius must be positive",
            ),
            (
                self.simulation.ai_agents > 0 || self.simulation.manual_agent,
                "simulation needs at least one agent",
            ),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(NavError::Config((*message).to_string())),
            None => Ok(()),
        }
    }

    /// Wall-clock pacing for the race loop.
    ///
    /// Remote planning and keyboard input are measured in real time, so
    /// they get a default frame period when `tick_ms` is unset.
    pub fn tick_period(&self) -> Option<Duration> {
        let realtime = self.planner.mode == PlannerMode::Remote || self.simulation.manual_agent;
        match self.simulation.tick_ms {
            0 if realtime => Some(Duration::from_millis(REALTIME_TICK_MS)),
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
