//! Replan throttling.
//!
//! Decides once per tick whether the driver should ask for a fresh path.
//! State is a cooldown countdown, the ticks since the last successful plan,
//! and the last goal requested. While a request is in flight no new one is
//! issued; a request that never answers is failed by its timeout.

use patha_map::WorldPoint;
use serde::Deserialize;
use std::fmt;

/// Replan policy parameters (ticks and world units).
#[derive(Clone, Debug, Deserialize)]
pub struct ReplanConfig {
    /// Minimum ticks between plan requests
    #[serde(default = "default_cooldown_ticks")]
    pub cooldown_ticks: u32,
    /// Replan after this many ticks without a successful plan
    #[serde(default = "default_periodic_interval_ticks")]
    pub periodic_interval_ticks: u32,
    /// Replan when the current waypoint is further than this
    #[serde(default = "default_deviation_threshold")]
    pub deviation_threshold: f32,
    /// Give up on an unanswered request after this many ticks
    #[serde(default = "default_plan_timeout_ticks")]
    pub plan_timeout_ticks: u32,
    /// Goals are picked this many centerline waypoints ahead
    #[serde(default = "default_goal_lookahead")]
    pub goal_lookahead: usize,
}

fn default_cooldown_ticks() -> u32 {
    30
}
fn default_periodic_interval_ticks() -> u32 {
    300
}
fn default_deviation_threshold() -> f32 {
    80.0
}
fn default_plan_timeout_ticks() -> u32 {
    120
}
fn default_goal_lookahead() -> usize {
    8
}

impl Default for ReplanConfig {
    fn default() -> Self {
        Self {
            cooldown_ticks: default_cooldown_ticks(),
            periodic_interval_ticks: default_periodic_interval_ticks(),
            deviation_threshold: default_deviation_threshold(),
            plan_timeout_ticks: default_plan_timeout_ticks(),
            goal_lookahead: default_goal_lookahead(),
        }
    }
}

/// Why a replan was requested, highest priority first
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplanTrigger {
    /// The active path is empty or fully consumed
    PathExhausted,
    /// The agent drifted too far from its current waypoint
    Deviation,
    /// The periodic refresh interval elapsed
    Periodic,
}

impl fmt::Display for ReplanTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplanTrigger::PathExhausted => "path exhausted",
            ReplanTrigger::Deviation => "deviation",
            ReplanTrigger::Periodic => "periodic",
        };
        f.write_str(name)
    }
}

/// What the scheduler looks at each tick
#[derive(Clone, Copy, Debug, Default)]
pub struct FollowStatus {
    /// No waypoint left to steer toward
    pub exhausted: bool,
    /// Distance from the agent to its current waypoint, if any
    pub deviation: Option<f32>,
}

/// Per-agent replan throttle.
#[derive(Clone, Debug)]
pub struct ReplanScheduler {
    config: ReplanConfig,
    cooldown: u32,
    ticks_since_plan: u32,
    in_flight: bool,
    last_goal: Option<WorldPoint>,
}

impl ReplanScheduler {
    pub fn new(config: ReplanConfig) -> Self {
        Self {
            config,
            cooldown: 0,
            ticks_since_plan: 0,
            in_flight: false,
            last_goal: None,
        }
    }

    pub fn config(&self) -> &ReplanConfig {
        &self.config
    }

    /// Advance one tick and report whether a plan should be requested now.
    ///
    /// The cooldown gates every trigger, including path exhaustion, so a
    /// planner that keeps failing is retried at most once per cooldown.
    pub fn tick(&mut self, status: FollowStatus) -> Option<ReplanTrigger> {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.ticks_since_plan = self.ticks_since_plan.saturating_add(1);

        if self.in_flight || self.cooldown > 0 {
            return None;
        }

        if status.exhausted {
            Some(ReplanTrigger::PathExhausted)
        } else if status
            .deviation
            .is_some_and(|d| d > self.config.deviation_threshold)
        {
            Some(ReplanTrigger::Deviation)
        } else if self.ticks_since_plan >= self.config.periodic_interval_ticks {
            Some(ReplanTrigger::Periodic)
        } else {
            None
        }
    }

    /// A request for `goal` went out.
    pub fn on_submitted(&mut self, goal: WorldPoint) {
        self.in_flight = true;
        self.cooldown = self.config.cooldown_ticks;
        self.last_goal = Some(goal);
    }

    /// The outstanding request finished, successfully or not.
    pub fn on_completed(&mut self, success: bool) {
        self.in_flight = false;
        self.cooldown = self.config.cooldown_ticks;
        if success {
            self.ticks_since_plan = 0;
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Ticks until another request may go out
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown
    }

    pub fn ticks_since_plan(&self) -> u32 {
        self.ticks_since_plan
    }

    pub fn last_goal(&self) -> Option<WorldPoint> {
        self.last_goal
    }
}
