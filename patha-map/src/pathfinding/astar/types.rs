//! A* pathfinding types.

use crate::core::{Cell, WorldPoint};
use std::cmp::Ordering;

/// A node in the A* open set
#[derive(Clone, Debug)]
pub(super) struct AStarNode {
    pub cell: Cell,
    pub g_cost: f32, // Cost from start
    pub f_cost: f32, // g_cost + heuristic
    pub seq: u64,    // Discovery order
}

impl Eq for AStarNode {}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; equal f pops the earlier discovery
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* pathfinding configuration
#[derive(Clone, Debug)]
pub struct AStarConfig {
    /// Allow diagonal movement (8-connected vs 4-connected)
    pub allow_diagonal: bool,
    /// Diagonal movement cost (sqrt(2))
    pub diagonal_cost: f32,
    /// Maximum number of nodes to expand before giving up
    pub max_iterations: usize,
}

impl Default for AStarConfig {
    fn default() -> Self {
        Self {
            allow_diagonal: true,
            diagonal_cost: std::f32::consts::SQRT_2,
            max_iterations: 100_000,
        }
    }
}

impl AStarConfig {
    /// 4-connected search
    pub fn four_connected() -> Self {
        Self {
            allow_diagonal: false,
            ..Default::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Successful A* search
#[derive(Clone, Debug)]
pub struct PathResult {
    /// Visited cells from start to goal, inclusive
    pub path_cells: Vec<Cell>,
    /// Cell centers in world coordinates
    pub path_world: Vec<WorldPoint>,
    /// Total path cost (cells)
    pub cost: f32,
    /// Number of nodes expanded during search
    pub nodes_expanded: usize,
}

impl PathResult {
    /// Path length in cells
    pub fn length_cells(&self) -> usize {
        self.path_cells.len()
    }

    /// Path length in world units
    pub fn length_world(&self) -> f32 {
        crate::pathfinding::smoothing::path_length(&self.path_world)
    }
}
