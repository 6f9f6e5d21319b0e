//! Grid cells and world-space points.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Integer grid coordinate, one map tile.
///
/// Equality and hashing are by `(x, y)`, which makes it usable directly as a
/// search-graph node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// X coordinate (column index)
    pub x: i32,
    /// Y coordinate (row index)
    pub y: i32,
}

impl Cell {
    /// Create a new cell
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell
    #[inline]
    pub fn manhattan_distance(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (max of x and y distance), the step count on an
    /// 8-connected grid
    #[inline]
    pub fn chebyshev_distance(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// The 4 cardinal neighbors (E, S, W, N)
    #[inline]
    pub fn neighbors_4(&self) -> [Cell; 4] {
        [
            Cell::new(self.x + 1, self.y),
            Cell::new(self.x, self.y + 1),
            Cell::new(self.x - 1, self.y),
            Cell::new(self.x, self.y - 1),
        ]
    }

    /// The 8 neighbors, cardinals first then diagonals (SE, SW, NW, NE)
    #[inline]
    pub fn neighbors_8(&self) -> [Cell; 8] {
        [
            Cell::new(self.x + 1, self.y),
            Cell::new(self.x, self.y + 1),
            Cell::new(self.x - 1, self.y),
            Cell::new(self.x, self.y - 1),
            Cell::new(self.x + 1, self.y + 1),
            Cell::new(self.x - 1, self.y + 1),
            Cell::new(self.x - 1, self.y - 1),
            Cell::new(self.x + 1, self.y - 1),
        ]
    }
}

impl Add for Cell {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Cell::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Cell {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Cell::new(self.x - other.x, self.y - other.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Point in world (raster) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate, grows to the right
    pub x: f32,
    /// Y coordinate, grows downward
    pub y: f32,
}

impl WorldPoint {
    /// Origin
    pub const ZERO: WorldPoint = WorldPoint { x: 0.0, y: 0.0 };

    /// Create a new point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &WorldPoint) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance
    #[inline]
    pub fn distance_squared(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Bearing from this point toward another, in radians
    #[inline]
    pub fn bearing_to(&self, other: &WorldPoint) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Linear interpolation, `t = 0` is `self`, `t = 1` is `other`
    #[inline]
    pub fn lerp(&self, other: &WorldPoint, t: f32) -> WorldPoint {
        WorldPoint::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
