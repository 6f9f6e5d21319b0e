//! A* planner implementation.

use crate::core::{Cell, WorldPoint};
use crate::error::PathNotFound;
use crate::road_map::RoadMap;
use log::{debug, trace};
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::types::{AStarConfig, AStarNode, PathResult};

/// Smallest search window half-size (cells)
const MIN_WINDOW_HALF: i32 = 3;

/// Inclusive cell rectangle the search may expand into
#[derive(Clone, Copy, Debug)]
struct Window {
    min: Cell,
    max: Cell,
}

impl Window {
    fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }
}

/// A* pathfinder over a [`RoadMap`].
///
/// Holds no search state between calls; every invocation builds its own
/// open/closed sets, so one planner can be shared across threads.
pub struct AStarPlanner<'a> {
    map: &'a RoadMap,
    config: AStarConfig,
}

impl<'a> AStarPlanner<'a> {
    /// Create a new A* planner
    pub fn new(map: &'a RoadMap, config: AStarConfig) -> Self {
        Self { map, config }
    }

    /// Create with default configuration
    pub fn with_defaults(map: &'a RoadMap) -> Self {
        Self::new(map, AStarConfig::default())
    }

    pub fn config(&self) -> &AStarConfig {
        &self.config
    }

    /// Find a path from start to goal over the whole map
    pub fn find_path(&self, start: Cell, goal: Cell) -> Result<PathResult, PathNotFound> {
        self.find_path_within(start, goal, None)
    }

    /// Find a path, optionally restricted to a square window around `start`.
    ///
    /// `radius` is in world units; the window half-size is
    /// `max(3, ceil(radius / cell_size))` cells.
    pub fn find_path_within(
        &self,
        start: Cell,
        goal: Cell,
        radius: Option<f32>,
    ) -> Result<PathResult, PathNotFound> {
        trace!(
            "[AStar] find_path: start=({},{}) goal=({},{}) radius={:?}",
            start.x, start.y, goal.x, goal.y, radius
        );

        if !self.map.contains(start) || !self.map.contains(goal) {
            debug!("[AStar] FAILED: OutOfBounds - start or goal outside grid");
            return Err(PathNotFound::OutOfBounds);
        }
        if !self.map.is_drivable_cell(start) {
            debug!("[AStar] FAILED: StartBlocked at {}", start);
            return Err(PathNotFound::StartBlocked);
        }
        if !self.map.is_drivable_cell(goal) {
            debug!("[AStar] FAILED: GoalBlocked at {}", goal);
            return Err(PathNotFound::GoalBlocked);
        }

        if start == goal {
            return Ok(self.build_result(vec![start], 0.0, 0));
        }

        let window = self.window(start, radius);
        if !window.contains(goal) {
            debug!(
                "[AStar] FAILED: OutsideSearchWindow - goal {} beyond {}..{}",
                goal, window.min, window.max
            );
            return Err(PathNotFound::OutsideSearchWindow);
        }

        let mut open_set = BinaryHeap::new();
        let mut closed_set = HashSet::new();
        let mut came_from: HashMap<Cell, Cell> = HashMap::new();
        let mut g_scores: HashMap<Cell, f32> = HashMap::new();
        let mut seq = 0u64;

        open_set.push(AStarNode {
            cell: start,
            g_cost: 0.0,
            f_cost: self.heuristic(start, goal),
            seq,
        });
        g_scores.insert(start, 0.0);

        let mut nodes_expanded = 0;

        while let Some(current) = open_set.pop() {
            if closed_set.contains(&current.cell) {
                continue;
            }

            nodes_expanded += 1;
            if nodes_expanded > self.config.max_iterations {
                debug!(
                    "[AStar] FAILED: MaxIterationsExceeded ({} nodes)",
                    nodes_expanded
                );
                return Err(PathNotFound::MaxIterationsExceeded);
            }

            if current.cell == goal {
                let path = reconstruct(&came_from, goal);
                trace!(
                    "[AStar] SUCCESS: path length={} cells, cost={:.2}, nodes_expanded={}",
                    path.len(),
                    current.g_cost,
                    nodes_expanded
                );
                return Ok(self.build_result(path, current.g_cost, nodes_expanded));
            }

            closed_set.insert(current.cell);

            let neighbors = if self.config.allow_diagonal {
                current.cell.neighbors_8().to_vec()
            } else {
                current.cell.neighbors_4().to_vec()
            };

            for (i, &neighbor) in neighbors.iter().enumerate() {
                if closed_set.contains(&neighbor)
                    || !window.contains(neighbor)
                    || !self.map.is_drivable_cell(neighbor)
                {
                    continue;
                }

                let is_diagonal = i >= 4;
                if is_diagonal && !self.diagonal_clear(current.cell, neighbor) {
                    continue;
                }

                let move_cost = if is_diagonal {
                    self.config.diagonal_cost
                } else {
                    1.0
                };
                let tentative_g = current.g_cost + move_cost;

                let known_g = g_scores.get(&neighbor).copied().unwrap_or(f32::INFINITY);
                if tentative_g < known_g {
                    came_from.insert(neighbor, current.cell);
                    g_scores.insert(neighbor, tentative_g);

                    seq += 1;
                    open_set.push(AStarNode {
                        cell: neighbor,
                        g_cost: tentative_g,
                        f_cost: tentative_g + self.heuristic(neighbor, goal),
                        seq,
                    });
                }
            }
        }

        debug!(
            "[AStar] FAILED: NoPath after expanding {} nodes",
            nodes_expanded
        );
        Err(PathNotFound::NoPath)
    }

    /// Find a path between world points (each mapped to its containing cell)
    pub fn find_path_world(
        &self,
        start: WorldPoint,
        goal: WorldPoint,
        radius: Option<f32>,
    ) -> Result<PathResult, PathNotFound> {
        self.find_path_within(
            self.map.world_to_cell(start),
            self.map.world_to_cell(goal),
            radius,
        )
    }

    /// Octile distance when 8-connected, Manhattan when 4-connected
    fn heuristic(&self, from: Cell, to: Cell) -> f32 {
        let dx = (from.x - to.x).abs() as f32;
        let dy = (from.y - to.y).abs() as f32;

        if self.config.allow_diagonal {
            let min = dx.min(dy);
            let max = dx.max(dy);
            min * self.config.diagonal_cost + (max - min)
        } else {
            dx + dy
        }
    }

    /// A diagonal step may not cut a blocked corner
    fn diagonal_clear(&self, from: Cell, to: Cell) -> bool {
        self.map.is_drivable(to.x, from.y) && self.map.is_drivable(from.x, to.y)
    }

    fn window(&self, start: Cell, radius: Option<f32>) -> Window {
        let last = Cell::new(self.map.width() as i32 - 1, self.map.height() as i32 - 1);
        match radius {
            Some(r) => {
                let half = ((r / self.map.cell_size()).ceil() as i32).max(MIN_WINDOW_HALF);
                Window {
                    min: Cell::new((start.x - half).max(0), (start.y - half).max(0)),
                    max: Cell::new((start.x + half).min(last.x), (start.y + half).min(last.y)),
                }
            }
            None => Window {
                min: Cell::new(0, 0),
                max: last,
            },
        }
    }

    fn build_result(&self, path_cells: Vec<Cell>, cost: f32, nodes_expanded: usize) -> PathResult {
        let path_world = path_cells
            .iter()
            .map(|&c| self.map.cell_to_world(c))
            .collect();
        PathResult {
            path_cells,
            path_world,
            cost,
            nodes_expanded,
        }
    }
}

/// Walk `came_from` back from the goal
fn reconstruct(came_from: &HashMap<Cell, Cell>, goal: Cell) -> Vec<Cell> {
    let mut path = Vec::new();
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        path.push(current);
        current = prev;
    }
    path.push(current); // Add start
    path.reverse();
    path
}
