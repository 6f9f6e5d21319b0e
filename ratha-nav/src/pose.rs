//! Agent kinematic state.

use patha_map::WorldPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::normalize_angle;

/// Position, heading (radians, (-π, π]) and scalar speed (world units/tick).
///
/// Owned by the vehicle; drivers only read it and answer with a
/// [`SteeringCommand`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub speed: f32,
}

impl AgentPose {
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self {
            x,
            y,
            heading: normalize_angle(heading),
            speed: 0.0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[inline]
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y)
    }

    /// Take the commanded heading and speed.
    pub fn apply(&mut self, command: &SteeringCommand) {
        self.heading = normalize_angle(command.heading);
        self.speed = command.speed.max(0.0);
    }

    /// Move one tick along the current heading. Returns the distance covered.
    pub fn integrate(&mut self) -> f32 {
        self.x += self.heading.cos() * self.speed;
        self.y += self.heading.sin() * self.speed;
        self.speed
    }
}

impl fmt::Display for AgentPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}) {:.0}° @ {:.2}",
            self.x,
            self.y,
            self.heading.to_degrees(),
            self.speed
        )
    }
}

/// Per-tick control output: absolute heading and speed for the next move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringCommand {
    pub heading: f32,
    pub speed: f32,
    /// The active path ran out; a fresh plan is wanted
    pub need_replan: bool,
}

impl SteeringCommand {
    /// Keep the current heading and speed.
    pub fn coast(pose: &AgentPose) -> Self {
        Self {
            heading: pose.heading,
            speed: pose.speed,
            need_replan: true,
        }
    }
}
