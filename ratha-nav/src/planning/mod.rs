//! Plan services: where paths come from.
//!
//! Every service takes the same [`PlanRequest`] and hands back a
//! [`PendingPlan`] that the driver polls once per tick. Whether the search
//! ran inline, on a worker thread, or on a remote server is invisible to
//! the caller, and every failure arrives as a [`PlanError`].
//!
//! - [`InlinePlanService`]: A* on the calling thread, ready on first poll
//! - [`WorkerPlanService`]: A* on a background thread fed by a channel
//! - [`RemotePlanService`]: JSON over HTTP POST

mod inline;
mod remote;
mod worker;

pub use inline::InlinePlanService;
pub use remote::{RemoteConfig, RemotePlanService, WirePlanRequest, WirePlanResponse};
pub use worker::WorkerPlanService;

use crossbeam_channel::{Receiver, TryRecvError};
use patha_map::{AStarConfig, AStarPlanner, RoadMap, WorldPoint, shortcut_line_of_sight};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Result of one plan request
pub type PlanOutcome = Result<Vec<WorldPoint>, PlanError>;

/// One path request in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanRequest {
    pub start: WorldPoint,
    pub goal: WorldPoint,
    /// Optional search radius around the start (world units)
    pub radius: Option<f32>,
}

/// Which service the agents plan through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerMode {
    #[default]
    Inline,
    Worker,
    Remote,
}

/// Local planner settings shared by the inline and worker services.
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub mode: PlannerMode,
    /// 8-connected search when true
    #[serde(default = "default_allow_diagonal")]
    pub allow_diagonal: bool,
    /// A* expansion budget
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Search window radius sent with each request (world units)
    #[serde(default = "default_search_radius")]
    pub search_radius: Option<f32>,
    /// Snap blocked endpoints to road within this radius (world units, 0 = off)
    #[serde(default = "default_snap_radius")]
    pub snap_radius: f32,
    /// Shortcut waypoints with clear line of sight
    #[serde(default = "default_simplify")]
    pub simplify: bool,
}

fn default_allow_diagonal() -> bool {
    true
}
fn default_max_iterations() -> usize {
    100_000
}
fn default_search_radius() -> Option<f32> {
    Some(160.0)
}
fn default_snap_radius() -> f32 {
    160.0
}
fn default_simplify() -> bool {
    true
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mode: PlannerMode::default(),
            allow_diagonal: default_allow_diagonal(),
            max_iterations: default_max_iterations(),
            search_radius: default_search_radius(),
            snap_radius: default_snap_radius(),
            simplify: default_simplify(),
        }
    }
}

impl PlannerConfig {
    pub fn astar(&self) -> AStarConfig {
        AStarConfig {
            allow_diagonal: self.allow_diagonal,
            max_iterations: self.max_iterations,
            ..Default::default()
        }
    }
}

/// Source of paths.
///
/// Implementations are shared by all agents, so `submit` takes `&self`.
pub trait PlanService: Send + Sync {
    fn submit(&self, request: PlanRequest) -> PendingPlan;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// What a poll of a [`PendingPlan`] found
#[derive(Debug)]
pub enum PlanPoll {
    Pending,
    Ready(PlanOutcome),
}

/// Handle to an outstanding plan request.
///
/// Each [`poll`](PendingPlan::poll) that finds no answer counts one tick;
/// once `timeout_ticks` polls have gone unanswered it resolves to
/// [`PlanError::Timeout`]. A reply that arrives after that is dropped with
/// the handle.
#[derive(Debug)]
pub struct PendingPlan {
    reply: Receiver<PlanOutcome>,
    polls: u32,
    timeout_ticks: u32,
}

impl PendingPlan {
    pub fn new(reply: Receiver<PlanOutcome>, timeout_ticks: u32) -> Self {
        Self {
            reply,
            polls: 0,
            timeout_ticks: timeout_ticks.max(1),
        }
    }

    /// Already resolved
    pub fn ready(outcome: PlanOutcome) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        // Receiver is alive, so the send cannot fail
        let _ = tx.send(outcome);
        Self::new(rx, 1)
    }

    /// Check for an answer without blocking.
    ///
    /// Polling again after `Ready` reports [`PlanError::WorkerGone`].
    pub fn poll(&mut self) -> PlanPoll {
        match self.reply.try_recv() {
            Ok(outcome) => PlanPoll::Ready(outcome),
            Err(TryRecvError::Disconnected) => PlanPoll::Ready(Err(PlanError::WorkerGone)),
            Err(TryRecvError::Empty) => {
                self.polls += 1;
                if self.polls >= self.timeout_ticks {
                    PlanPoll::Ready(Err(PlanError::Timeout { ticks: self.polls }))
                } else {
                    PlanPoll::Pending
                }
            }
        }
    }

    /// Ticks spent waiting so far
    pub fn polls(&self) -> u32 {
        self.polls
    }
}

/// Plan on a local map: snap endpoints, search, and optionally shortcut.
///
/// The first waypoint is the (possibly snapped) start cell center and the
/// last is the goal cell center.
pub fn plan_on_map(map: &RoadMap, config: &PlannerConfig, request: &PlanRequest) -> PlanOutcome {
    let mut start = map.world_to_cell(request.start);
    let mut goal = map.world_to_cell(request.goal);

    if config.snap_radius > 0.0 {
        let rings = (config.snap_radius / map.cell_size()).ceil() as i32;
        let clamped_start = map.world_to_cell_clamped(request.start);
        let clamped_goal = map.world_to_cell_clamped(request.goal);
        start = map.nearest_drivable(clamped_start, rings).unwrap_or(start);
        goal = map.nearest_drivable(clamped_goal, rings).unwrap_or(goal);
    }

    let planner = AStarPlanner::new(map, config.astar());
    let result = planner.find_path_within(start, goal, request.radius)?;

    let path = if config.simplify {
        shortcut_line_of_sight(map, &result.path_world)
    } else {
        result.path_world
    };
    Ok(path)
}
