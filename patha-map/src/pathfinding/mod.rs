//! Path planning on the road grid.
//!
//! - **A* Search**: deterministic shortest paths between drivable cells
//! - **Post-processing**: optional, caller-side waypoint reduction
//!
//! ## A* Pathfinding
//!
//! ```rust,ignore
//! use patha_map::pathfinding::{AStarConfig, AStarPlanner};
//!
//! let planner = AStarPlanner::new(&map, AStarConfig::default());
//! match planner.find_path(start, goal) {
//!     Ok(result) => println!("{} waypoints", result.path_world.len()),
//!     Err(reason) => println!("no path: {}", reason),
//! }
//! ```
//!
//! ## Post-processing
//!
//! ```rust,ignore
//! use patha_map::pathfinding::{shortcut_line_of_sight, simplify_collinear};
//!
//! let corners = simplify_collinear(&result.path_cells);
//! let direct = shortcut_line_of_sight(&map, &result.path_world);
//! ```

pub mod astar;
pub mod smoothing;

pub use astar::{AStarConfig, AStarPlanner, PathResult, find_path};
pub use smoothing::{path_length, segment_is_drivable, shortcut_line_of_sight, simplify_collinear};
