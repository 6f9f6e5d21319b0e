//! # Ratha-Nav: Track Navigation for Simulated Vehicles
//!
//! Keeps agents on the road of a rasterized track:
//!
//! - **Steering**: a waypoint follower with turn-rate limits, angle wrapping
//!   and cornering speed control
//! - **Replanning**: a per-agent throttle deciding when to ask for a fresh
//!   path (path exhausted, drifted off course, or stale)
//! - **Plan services**: the same request/response contract served inline,
//!   from a worker thread, or by a remote HTTP planner
//! - **Race loop**: several agents advanced tick by tick on a shared,
//!   immutable road map
//!
//! ## Tick order
//!
//! For each agent: collect a finished plan, check replan triggers, submit a
//! request if one fired, steer toward the current waypoint, integrate the
//! pose. Nothing in the loop can fail; planning problems degrade to
//! following the last path or the centerline.

pub mod config;
pub mod error;
pub mod navigation;
pub mod planning;
pub mod pose;
pub mod race;
pub mod shared;
pub mod track;
pub mod utils;

pub use config::{RathaConfig, SimulationConfig};
pub use error::{NavError, PlanError, Result};
pub use navigation::{
    Driver, FollowerConfig, ManualDriver, PathFollower, PlanStats, PlannerDriver, ReplanConfig,
    ReplanScheduler, ReplanTrigger,
};
pub use planning::{
    InlinePlanService, PendingPlan, PlanPoll, PlanRequest, PlanService, PlannerConfig,
    PlannerMode, RemoteConfig, RemotePlanService, WorkerPlanService,
};
pub use pose::{AgentPose, SteeringCommand};
pub use race::{Agent, Race, RaceSummary, build_race, plan_service};
pub use shared::SharedInput;
pub use track::{Track, TrackConfig};
pub use utils::normalize_angle;
