//! Race simulation: agents sharing one track, advanced tick by tick.
//!
//! Per tick and per agent, in insertion order: the driver decides (replan
//! check, optional plan, follower update), then the pose integrates one
//! step along its heading. Agents share nothing mutable; the road map and
//! centerline are read-only.

use patha_map::RoadMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::RathaConfig;
use crate::error::Result;
use crate::navigation::{Driver, ManualDriver, PlanStats, PlannerDriver};
use crate::planning::{
    InlinePlanService, PlanService, PlannerMode, RemotePlanService, WorkerPlanService,
};
use crate::pose::AgentPose;
use crate::shared::SharedInput;
use crate::track::Track;

/// Running totals for one agent
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentStats {
    pub ticks: u64,
    pub distance: f32,
    pub off_road_ticks: u64,
}

/// One vehicle and whatever drives it
pub struct Agent {
    name: String,
    pose: AgentPose,
    driver: Box<dyn Driver>,
    stats: AgentStats,
}

impl Agent {
    pub fn new(name: impl Into<String>, pose: AgentPose, driver: Box<dyn Driver>) -> Self {
        Self {
            name: name.into(),
            pose,
            driver,
            stats: AgentStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pose(&self) -> &AgentPose {
        &self.pose
    }

    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    pub fn plan_stats(&self) -> Option<PlanStats> {
        self.driver.plan_stats()
    }

    fn step(&mut self, map: &RoadMap) {
        let command = self.driver.drive(&self.pose);
        self.pose.apply(&command);
        self.stats.distance += self.pose.integrate();
        self.stats.ticks += 1;
        if !map.is_drivable_world(self.pose.position()) {
            self.stats.off_road_ticks += 1;
        }
    }

    fn summary(&self) -> AgentSummary {
        AgentSummary {
            name: self.name.clone(),
            driver: self.driver.kind(),
            pose: self.pose,
            stats: self.stats,
            plans: self.driver.plan_stats(),
        }
    }
}

/// Final state of one agent
#[derive(Clone, Debug)]
pub struct AgentSummary {
    pub name: String,
    pub driver: &'static str,
    pub pose: AgentPose,
    pub stats: AgentStats,
    pub plans: Option<PlanStats>,
}

impl AgentSummary {
    /// Share of ticks spent off the road
    pub fn off_road_fraction(&self) -> f32 {
        if self.stats.ticks == 0 {
            0.0
        } else {
            self.stats.off_road_ticks as f32 / self.stats.ticks as f32
        }
    }
}

impl fmt::Display for AgentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {:.0} units, {:.1}% off-road, at {}",
            self.name,
            self.driver,
            self.stats.distance,
            self.off_road_fraction() * 100.0,
            self.pose
        )?;
        if let Some(p) = &self.plans {
            write!(
                f,
                ", plans {} requested / {} ok / {} failed / {} timed out / {} fallbacks",
                p.requested, p.succeeded, p.failed, p.timed_out, p.fallbacks
            )?;
        }
        Ok(())
    }
}

/// Outcome of [`Race::run`]
#[derive(Clone, Debug)]
pub struct RaceSummary {
    pub ticks: u64,
    pub elapsed: Duration,
    pub agents: Vec<AgentSummary>,
}

/// The simulation loop.
pub struct Race {
    map: Arc<RoadMap>,
    agents: Vec<Agent>,
    tick: u64,
    status_interval: u64,
    tick_period: Option<Duration>,
}

impl Race {
    pub fn new(map: Arc<RoadMap>) -> Self {
        Self {
            map,
            agents: Vec::new(),
            tick: 0,
            status_interval: 0,
            tick_period: None,
        }
    }

    /// Log a status line every `interval` ticks (0 = never)
    pub fn with_status_interval(mut self, interval: u64) -> Self {
        self.status_interval = interval;
        self
    }

    /// Pace the loop to one tick per `period` instead of running flat out
    pub fn with_tick_period(mut self, period: Option<Duration>) -> Self {
        self.tick_period = period;
        self
    }

    pub fn add_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance every agent by one tick.
    pub fn step(&mut self) {
        for agent in &mut self.agents {
            agent.step(&self.map);
        }
        self.tick += 1;
    }

    /// Run `ticks` more ticks and summarize.
    pub fn run(&mut self, ticks: u64) -> RaceSummary {
        let started = Instant::now();

        for _ in 0..ticks {
            let tick_started = Instant::now();
            self.step();

            if self.status_interval > 0 && self.tick % self.status_interval == 0 {
                self.log_status();
            }

            if let Some(period) = self.tick_period {
                let spent = tick_started.elapsed();
                if spent < period {
                    std::thread::sleep(period - spent);
                }
            }
        }

        self.summary(started.elapsed())
    }

    pub fn summary(&self, elapsed: Duration) -> RaceSummary {
        RaceSummary {
            ticks: self.tick,
            elapsed,
            agents: self.agents.iter().map(Agent::summary).collect(),
        }
    }

    fn log_status(&self) {
        info!("Tick {}", self.tick);
        for agent in &self.agents {
            let stats = agent.stats();
            info!(
                "  {} at {}, {:.0} units, {} off-road ticks",
                agent.name(),
                agent.pose(),
                stats.distance,
                stats.off_road_ticks
            );
        }
    }
}

/// Build the plan service selected by `[planner] mode`.
pub fn plan_service(config: &RathaConfig, map: Arc<RoadMap>) -> Result<Arc<dyn PlanService>> {
    let timeout = config.replan.plan_timeout_ticks;
    let service: Arc<dyn PlanService> = match config.planner.mode {
        PlannerMode::Inline => Arc::new(InlinePlanService::new(map, config.planner.clone())),
        PlannerMode::Worker => Arc::new(WorkerPlanService::spawn(
            map,
            config.planner.clone(),
            timeout,
        )?),
        PlannerMode::Remote => Arc::new(RemotePlanService::new(&config.remote, timeout)?),
    };
    info!("Planning via {} service", service.name());
    Ok(service)
}

/// Populate a race from configuration.
///
/// Planner-driven agents come first, spaced along the centerline; the
/// manual agent, if enabled, starts behind them. Returns the manual agent's
/// input handle.
pub fn build_race(
    config: &RathaConfig,
    track: &Track,
    service: Arc<dyn PlanService>,
) -> (Race, Option<Arc<SharedInput>>) {
    let sim = &config.simulation;
    let total = sim.ai_agents + usize::from(sim.manual_agent);
    let mut poses = track.spawn_poses(total, sim.spawn_spacing).into_iter();

    let mut race = Race::new(Arc::clone(&track.map)).with_status_interval(sim.status_interval);

    for i in 0..sim.ai_agents {
        let Some(pose) = poses.next() else { break };
        let driver = PlannerDriver::new(
            Arc::clone(&service),
            Arc::clone(&track.centerline),
            config.follower.clone(),
            config.replan.clone(),
            config.planner.search_radius,
        );
        race.add_agent(Agent::new(format!("ai-{}", i + 1), pose, Box::new(driver)));
    }

    let input = match (sim.manual_agent, poses.next()) {
        (true, Some(pose)) => {
            let input = Arc::new(SharedInput::new());
            let driver = ManualDriver::new(Arc::clone(&input), &config.follower);
            race.add_agent(Agent::new("player", pose, Box::new(driver)));
            Some(input)
        }
        _ => None,
    };

    info!("Race ready with {} agents", race.agents().len());
    (race, input)
}
