//! A* pathfinding.
//!
//! Implements A* search on the road grid with:
//! - 4- or 8-connected movement (no corner cutting on diagonals)
//! - Deterministic tie-breaking (earliest discovered node first)
//! - Optional square search window around the start

mod planner;
mod types;

pub use planner::AStarPlanner;
pub use types::{AStarConfig, PathResult};

use crate::core::Cell;
use crate::error::PathNotFound;
use crate::road_map::RoadMap;

/// Quick path finding with default configuration
pub fn find_path(map: &RoadMap, start: Cell, goal: Cell) -> Result<PathResult, PathNotFound> {
    AStarPlanner::with_defaults(map).find_path(start, goal)
}
