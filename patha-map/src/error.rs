//! Error types for Patha-Map

use thiserror::Error;

/// Failure to build a [`RoadMap`](crate::RoadMap).
///
/// Fatal at startup; there is no recovery from a malformed track raster.
#[derive(Error, Debug)]
pub enum MapError {
    /// Zero-size, truncated or undecodable source image
    #[error("Invalid map image: {0}")]
    InvalidImage(String),

    /// Unusable map parameters
    #[error("Invalid map configuration: {0}")]
    InvalidConfig(String),
}

/// Reason a path could not be produced.
///
/// Always recoverable: callers fall back to their last path, a centerline
/// or coasting.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathNotFound {
    /// Start or goal lies outside the map
    #[error("start or goal is outside the map")]
    OutOfBounds,
    /// Start cell is not drivable
    #[error("start cell is not drivable")]
    StartBlocked,
    /// Goal cell is not drivable
    #[error("goal cell is not drivable")]
    GoalBlocked,
    /// Goal lies outside the requested search window
    #[error("goal is outside the search window")]
    OutsideSearchWindow,
    /// Search space exhausted without reaching the goal
    #[error("no drivable connection between start and goal")]
    NoPath,
    /// Expansion budget spent before reaching the goal
    #[error("search expansion limit exceeded")]
    MaxIterationsExceeded,
}
