//! Per-agent navigation: steering, replan throttling and drivers.

pub mod driver;
pub mod follower;
pub mod scheduler;

pub use driver::{Driver, ManualDriver, PlanStats, PlannerDriver};
pub use follower::{FollowState, FollowerConfig, PathFollower};
pub use scheduler::{FollowStatus, ReplanConfig, ReplanScheduler, ReplanTrigger};
