//! Drivers decide each agent's steering command.
//!
//! Human and planner-controlled agents are the same [`Agent`](crate::race::Agent)
//! type; only the driver behind them differs.

use patha_map::Centerline;
use std::sync::Arc;
use tracing::{debug, warn};

use super::follower::{FollowerConfig, PathFollower};
use super::scheduler::{FollowStatus, ReplanConfig, ReplanScheduler, ReplanTrigger};
use crate::error::PlanError;
use crate::planning::{PendingPlan, PlanPoll, PlanRequest, PlanService};
use crate::pose::{AgentPose, SteeringCommand};
use crate::shared::SharedInput;

/// Throttle gain per tick while held
const MANUAL_ACCELERATION: f32 = 0.12;
/// Speed lost per tick while released
const MANUAL_DECAY: f32 = 0.08;

/// Plan request bookkeeping for one agent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub requested: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub timed_out: u32,
    /// Times the agent fell back to the centerline
    pub fallbacks: u32,
}

/// Source of an agent's per-tick steering.
pub trait Driver: Send {
    fn drive(&mut self, pose: &AgentPose) -> SteeringCommand;

    /// Planning statistics, for drivers that plan
    fn plan_stats(&self) -> Option<PlanStats> {
        None
    }

    fn kind(&self) -> &'static str;
}

/// Plans toward a point ahead on the centerline and follows the result.
///
/// Each tick: collect a finished plan, ask the scheduler whether to replan,
/// submit if so, then steer. With no usable path the agent follows the
/// centerline itself.
pub struct PlannerDriver {
    follower: PathFollower,
    scheduler: ReplanScheduler,
    service: Arc<dyn PlanService>,
    centerline: Arc<Centerline>,
    search_radius: Option<f32>,
    pending: Option<PendingPlan>,
    stats: PlanStats,
}

impl PlannerDriver {
    pub fn new(
        service: Arc<dyn PlanService>,
        centerline: Arc<Centerline>,
        follower: FollowerConfig,
        replan: ReplanConfig,
        search_radius: Option<f32>,
    ) -> Self {
        Self {
            follower: PathFollower::new(follower),
            scheduler: ReplanScheduler::new(replan),
            service,
            centerline,
            search_radius,
            pending: None,
            stats: PlanStats::default(),
        }
    }

    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    pub fn scheduler(&self) -> &ReplanScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> PlanStats {
        self.stats
    }

    /// Take a finished plan, if any.
    fn collect(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        let outcome = match pending.poll() {
            PlanPoll::Pending => return,
            PlanPoll::Ready(outcome) => outcome,
        };
        self.pending = None;

        match outcome {
            Ok(path) => {
                debug!("Plan ready: {} waypoints", path.len());
                self.stats.succeeded += 1;
                self.follower.set_path(path);
                self.scheduler.on_completed(true);
            }
            Err(e) => {
                if let PlanError::Timeout { ticks } = e {
                    warn!("Plan timed out after {} ticks, keeping current path", ticks);
                    self.stats.timed_out += 1;
                } else {
                    warn!("Plan failed ({}), keeping current path", e);
                    self.stats.failed += 1;
                }
                self.scheduler.on_completed(false);
            }
        }
    }

    fn request(&mut self, pose: &AgentPose, trigger: ReplanTrigger) {
        let goal = self
            .centerline
            .lookahead(pose.position(), self.scheduler.config().goal_lookahead);
        let request = PlanRequest {
            start: pose.position(),
            goal,
            radius: self.search_radius,
        };

        debug!(
            "Requesting plan ({}) via {}: {} -> {}",
            trigger,
            self.service.name(),
            request.start,
            goal
        );

        self.pending = Some(self.service.submit(request));
        self.scheduler.on_submitted(goal);
        self.stats.requested += 1;
    }
}

impl Driver for PlannerDriver {
    fn drive(&mut self, pose: &AgentPose) -> SteeringCommand {
        self.collect();

        let position = pose.position();
        let status = FollowStatus {
            exhausted: self.follower.is_exhausted(),
            deviation: self.follower.current_target().map(|t| position.distance(&t)),
        };

        if let Some(trigger) = self.scheduler.tick(status) {
            self.request(pose, trigger);
            // Inline plans resolve immediately
            self.collect();
        }

        let command = self.follower.step(pose);
        if !command.need_replan {
            return command;
        }

        // Nothing left to follow: keep moving along the centerline
        self.stats.fallbacks += 1;
        debug!("Path exhausted, falling back to centerline at {}", position);
        self.follower.set_path(self.centerline.path_from(position));
        self.follower.step(pose)
    }

    fn plan_stats(&self) -> Option<PlanStats> {
        Some(self.stats)
    }

    fn kind(&self) -> &'static str {
        "planner"
    }
}

/// Steers from held-key flags.
pub struct ManualDriver {
    input: Arc<SharedInput>,
    max_speed: f32,
    max_turn_rate: f32,
}

impl ManualDriver {
    pub fn new(input: Arc<SharedInput>, config: &FollowerConfig) -> Self {
        Self {
            input,
            max_speed: config.max_speed,
            max_turn_rate: config.max_turn_rate,
        }
    }
}

impl Driver for ManualDriver {
    fn drive(&mut self, pose: &AgentPose) -> SteeringCommand {
        let keys = self.input.snapshot();

        let speed = if keys.throttle {
            (pose.speed + MANUAL_ACCELERATION).min(self.max_speed)
        } else {
            (pose.speed - MANUAL_DECAY).max(0.0)
        };

        let mut heading = pose.heading;
        if keys.left {
            heading -= self.max_turn_rate;
        }
        if keys.right {
            heading += self.max_turn_rate;
        }

        SteeringCommand {
            heading: crate::utils::normalize_angle(heading),
            speed,
            need_replan: false,
        }
    }

    fn kind(&self) -> &'static str {
        "manual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::{InlinePlanService, PlanOutcome, PlannerConfig};
    use approx::assert_relative_eq;
    use patha_map::{RoadMap, WorldPoint};
    use std::sync::Mutex;

    /// Never answers; counts submissions
    struct SilentService {
        submitted: Mutex<Vec<PlanRequest>>,
        keep_alive: Mutex<Vec<crossbeam_channel::Sender<PlanOutcome>>>,
    }

    impl SilentService {
        fn new() -> Self {
            Self {
                submitted: Mutex::new(Vec::new()),
                keep_alive: Mutex::new(Vec::new()),
            }
        }
    }

    impl PlanService for SilentService {
        fn submit(&self, request: PlanRequest) -> PendingPlan {
            let (tx, rx) = crossbeam_channel::bounded(1);
            self.submitted.lock().unwrap().push(request);
            self.keep_alive.lock().unwrap().push(tx);
            PendingPlan::new(rx, 5)
        }

        fn name(&self) -> &'static str {
            "silent"
        }
    }

    fn square_centerline() -> Arc<Centerline> {
        Arc::new(
            Centerline::from_points(vec![
                WorldPoint::new(20.0, 20.0),
                WorldPoint::new(80.0, 20.0),
                WorldPoint::new(80.0, 80.0),
                WorldPoint::new(20.0, 80.0),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_planner_driver_uses_inline_plan() {
        let map = Arc::new(RoadMap::from_cells(100, 100, 1, vec![true; 10_000]).unwrap());
        let service = Arc::new(InlinePlanService::new(map, PlannerConfig::default()));
        let replan = ReplanConfig {
            goal_lookahead: 1,
            ..Default::default()
        };
        let mut driver = PlannerDriver::new(
            service,
            square_centerline(),
            FollowerConfig::default(),
            replan,
            None,
        );

        let cmd = driver.drive(&AgentPose::new(20.0, 20.0, 0.0));

        assert!(!cmd.need_replan);
        assert_eq!(driver.stats().requested, 1);
        assert_eq!(driver.stats().succeeded, 1);
        assert_eq!(driver.scheduler().last_goal(), Some(WorldPoint::new(80.0, 20.0)));
        assert_eq!(
            driver.follower().path().last(),
            Some(&WorldPoint::new(80.5, 20.5))
        );
    }

    #[test]
    fn test_timeout_keeps_agent_moving() {
        let service = Arc::new(SilentService::new());
        let mut driver = PlannerDriver::new(
            service.clone(),
            square_centerline(),
            FollowerConfig::default(),
            ReplanConfig {
                cooldown_ticks: 10,
                ..Default::default()
            },
            Some(50.0),
        );

        let pose = AgentPose::new(20.0, 20.0, 0.0).with_speed(1.0);
        for _ in 0..6 {
            let cmd = driver.drive(&pose);
            assert!(!cmd.need_replan);
            assert!(cmd.speed > 0.0);
        }

        let stats = driver.stats();
        assert_eq!(stats.requested, 1);
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(service.submitted.lock().unwrap()[0].radius, Some(50.0));
        assert!(!driver.scheduler().in_flight());
    }

    #[test]
    fn test_throttled_retries() {
        let service = Arc::new(SilentService::new());
        let mut driver = PlannerDriver::new(
            service.clone(),
            square_centerline(),
            FollowerConfig::default(),
            ReplanConfig {
                cooldown_ticks: 20,
                deviation_threshold: 0.0,
                ..Default::default()
            },
            None,
        );

        let pose = AgentPose::new(20.0, 20.0, 0.0);
        for _ in 0..100 {
            driver.drive(&pose);
        }

        // Each request times out on its 5th poll and the 20-tick cooldown
        // follows: one request every 23 ticks (1, 24, 47, 70, 93)
        let requests = service.submitted.lock().unwrap().len();
        assert_eq!(requests, 5);
        assert_eq!(driver.stats().timed_out, 5);
    }

    #[test]
    fn test_manual_driver() {
        let input = Arc::new(SharedInput::new());
        let mut driver = ManualDriver::new(Arc::clone(&input), &FollowerConfig::default());

        let mut pose = AgentPose::new(0.0, 0.0, 0.0);
        input.set_throttle(true);
        input.set_turn(1);
        for _ in 0..30 {
            let cmd = driver.drive(&pose);
            pose.apply(&cmd);
        }
        assert_relative_eq!(pose.speed, 2.6);
        assert_relative_eq!(pose.heading, 1.8, epsilon = 1e-4);

        input.release_all();
        let cmd = driver.drive(&pose);
        assert_relative_eq!(cmd.speed, 2.52, epsilon = 1e-5);
        assert_relative_eq!(cmd.heading, pose.heading);
        assert!(driver.plan_stats().is_none());
    }
}
