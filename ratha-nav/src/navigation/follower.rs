//! Waypoint follower with turn-rate limited steering.
//!
//! Each tick the follower steers toward the current waypoint:
//! 1. Skip waypoints already within the arrival tolerance
//! 2. Wrap the heading error into (-π, π] and clamp it to the turn rate
//! 3. Slow down for sharp turns, and further when the waypoint is too
//!    close to reach at the current turn rate
//!
//! When the path runs out the follower coasts on its last heading and
//! speed and raises `need_replan`.

use patha_map::WorldPoint;
use serde::Deserialize;
use std::f32::consts::PI;

use crate::pose::{AgentPose, SteeringCommand};
use crate::utils::normalize_angle;

/// Largest fraction of speed shed for heading error
const MAX_TURN_SLOWDOWN: f32 = 0.8;

/// Configuration for path following.
#[derive(Clone, Debug, Deserialize)]
pub struct FollowerConfig {
    /// Top speed (world units per tick)
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Maximum heading change per tick (radians)
    #[serde(default = "default_max_turn_rate")]
    pub max_turn_rate: f32,
    /// Waypoint counts as reached inside this radius (world units)
    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance: f32,
    /// Speed floor for turn slowdown, as a fraction of `max_speed`
    #[serde(default = "default_min_speed_factor")]
    pub min_speed_factor: f32,
    /// Lowest speed the cornering limit may impose
    #[serde(default = "default_crawl_speed")]
    pub crawl_speed: f32,
}

fn default_max_speed() -> f32 {
    2.6
}
fn default_max_turn_rate() -> f32 {
    0.06
}
fn default_arrival_tolerance() -> f32 {
    6.0
}
fn default_min_speed_factor() -> f32 {
    0.45
}
fn default_crawl_speed() -> f32 {
    0.25
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            max_turn_rate: default_max_turn_rate(),
            arrival_tolerance: default_arrival_tolerance(),
            min_speed_factor: default_min_speed_factor(),
            crawl_speed: default_crawl_speed(),
        }
    }
}

/// State of path following.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowState {
    /// Steering toward a waypoint
    Following,
    /// Path consumed or never set; coasting
    Exhausted,
}

/// Follows one path at a time, advancing a read cursor through it.
#[derive(Clone, Debug)]
pub struct PathFollower {
    config: FollowerConfig,
    path: Vec<WorldPoint>,
    index: usize,
}

impl PathFollower {
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            config,
            path: Vec::new(),
            index: 0,
        }
    }

    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// Replace the active path and rewind the cursor.
    pub fn set_path(&mut self, path: Vec<WorldPoint>) {
        tracing::trace!("set_path: {} waypoints", path.len());
        self.path = path;
        self.index = 0;
    }

    pub fn path(&self) -> &[WorldPoint] {
        &self.path
    }

    /// Index of the waypoint being steered toward
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_target(&self) -> Option<WorldPoint> {
        self.path.get(self.index).copied()
    }

    pub fn remaining(&self) -> usize {
        self.path.len().saturating_sub(self.index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.path.len()
    }

    pub fn state(&self) -> FollowState {
        if self.is_exhausted() {
            FollowState::Exhausted
        } else {
            FollowState::Following
        }
    }

    /// Compute the heading and speed for this tick.
    pub fn step(&mut self, pose: &AgentPose) -> SteeringCommand {
        let position = pose.position();

        while let Some(target) = self.current_target() {
            if position.distance(&target) >= self.config.arrival_tolerance {
                break;
            }
            self.index += 1;
            tracing::trace!(
                "Waypoint reached, advancing to {}/{}",
                self.index,
                self.path.len()
            );
        }

        let Some(target) = self.current_target() else {
            return SteeringCommand::coast(pose);
        };

        let distance = position.distance(&target);
        let desired = position.bearing_to(&target);
        let diff = normalize_angle(desired - pose.heading);
        let turn = diff.clamp(-self.config.max_turn_rate, self.config.max_turn_rate);

        SteeringCommand {
            heading: normalize_angle(pose.heading + turn),
            speed: self.target_speed(diff, distance),
            need_replan: false,
        }
    }

    /// Speed for a heading error `diff` with the waypoint `distance` away.
    ///
    /// Linear falloff with turn sharpness, floored at `min_speed_factor`.
    /// On top of that the turning radius `speed / max_turn_rate` is kept
    /// inside the circle that touches the heading and passes through the
    /// waypoint, so the waypoint stays reachable instead of being orbited.
    pub fn target_speed(&self, diff: f32, distance: f32) -> f32 {
        let err = diff.abs();
        let factor = (1.0 - (err / PI).min(MAX_TURN_SLOWDOWN)).max(self.config.min_speed_factor);
        let speed = self.config.max_speed * factor;

        let sin = err.sin();
        if sin > 1e-6 {
            let reachable = self.config.max_turn_rate * distance / (2.0 * sin);
            speed.min(reachable.max(self.config.crawl_speed))
        } else {
            speed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn follower_with(path: Vec<WorldPoint>) -> PathFollower {
        let mut follower = PathFollower::new(FollowerConfig::default());
        follower.set_path(path);
        follower
    }

    #[test]
    fn test_straight_ahead_full_speed() {
        let mut follower = follower_with(vec![WorldPoint::new(100.0, 0.0)]);
        let cmd = follower.step(&AgentPose::new(0.0, 0.0, 0.0));

        assert_relative_eq!(cmd.heading, 0.0);
        assert_relative_eq!(cmd.speed, 2.6);
        assert!(!cmd.need_replan);
    }

    #[test]
    fn test_turn_is_rate_limited() {
        let mut follower = follower_with(vec![WorldPoint::new(0.0, 1000.0)]);
        let cmd = follower.step(&AgentPose::new(0.0, 0.0, 0.0));

        assert_relative_eq!(cmd.heading, 0.06, epsilon = 1e-6);
        // Quarter turn: 1 - 0.5 of max speed
        assert_relative_eq!(cmd.speed, 1.3, epsilon = 1e-5);
    }

    #[test]
    fn test_speed_floor() {
        let follower = PathFollower::new(FollowerConfig::default());
        // Heading error near π would drop to 0.2 without the floor
        assert_relative_eq!(follower.target_speed(PI - 0.01, 1e6), 2.6 * 0.45, epsilon = 1e-4);
    }

    #[test]
    fn test_cornering_limit_for_close_waypoints() {
        let follower = PathFollower::new(FollowerConfig::default());
        // 0.06 * 10 / (2 * sin(π/2)) = 0.3
        assert_relative_eq!(follower.target_speed(FRAC_PI_2, 10.0), 0.3, epsilon = 1e-5);
        // Never below crawl speed
        assert_relative_eq!(follower.target_speed(FRAC_PI_2, 1.0), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_shorter_arc_across_pi() {
        // Facing just under +π, target just past -π: turn counter-clockwise
        let heading = PI - 0.05;
        let target = WorldPoint::new(100.0 * (-PI + 0.05).cos(), 100.0 * (-PI + 0.05).sin());
        let mut follower = follower_with(vec![target]);

        let cmd = follower.step(&AgentPose::new(0.0, 0.0, heading));
        let turned = normalize_angle(cmd.heading - heading);

        assert!(turned > 0.0, "turned {} the long way", turned);
        assert_relative_eq!(turned, 0.06, epsilon = 1e-4);
        assert!(cmd.heading <= PI && cmd.heading > -PI);
    }

    #[test]
    fn test_target_directly_behind() {
        let mut follower = follower_with(vec![WorldPoint::new(-50.0, 0.0)]);
        let cmd = follower.step(&AgentPose::new(0.0, 0.0, 0.0));

        // diff is exactly π; turns by one full step either way
        assert_relative_eq!(cmd.heading.abs(), 0.06, epsilon = 1e-6);
    }

    #[test]
    fn test_arrival_advances_index() {
        let mut follower = follower_with(vec![
            WorldPoint::new(3.0, 0.0),
            WorldPoint::new(50.0, 0.0),
        ]);

        follower.step(&AgentPose::new(0.0, 0.0, 0.0));
        assert_eq!(follower.index(), 1);
        assert_eq!(follower.current_target(), Some(WorldPoint::new(50.0, 0.0)));
    }

    #[test]
    fn test_exhausted_path_coasts() {
        let mut follower = follower_with(vec![WorldPoint::new(1.0, 1.0)]);
        let pose = AgentPose::new(0.0, 0.0, 1.2).with_speed(1.7);

        let cmd = follower.step(&pose);

        assert!(cmd.need_replan);
        assert_relative_eq!(cmd.heading, 1.2);
        assert_relative_eq!(cmd.speed, 1.7);
        assert_eq!(follower.state(), FollowState::Exhausted);
    }

    #[test]
    fn test_empty_path_coasts() {
        let mut follower = PathFollower::new(FollowerConfig::default());
        let cmd = follower.step(&AgentPose::new(5.0, 5.0, -0.4).with_speed(0.9));

        assert!(cmd.need_replan);
        assert_relative_eq!(cmd.speed, 0.9);
        assert_eq!(follower.remaining(), 0);
    }

    #[test]
    fn test_set_path_rewinds() {
        let mut follower = follower_with(vec![WorldPoint::new(1.0, 0.0)]);
        follower.step(&AgentPose::new(0.0, 0.0, 0.0));
        assert!(follower.is_exhausted());

        follower.set_path(vec![WorldPoint::new(100.0, 0.0), WorldPoint::new(200.0, 0.0)]);
        assert_eq!(follower.index(), 0);
        assert_eq!(follower.remaining(), 2);
    }
}
