//! # Patha-Map: Road Maps and Grid Planning
//!
//! Turns a track raster into an immutable traversability grid and plans
//! over it.
//!
//! ## Features
//!
//! - **RoadMap**: one-time classification of a raster into drivable and
//!   blocked cells, optionally tiled (`cell_size` pixels per cell)
//! - **A* Search**: deterministic shortest paths on the 4- or 8-connected grid
//! - **Path Post-processing**: collinear simplification and line-of-sight
//!   shortcuts that never leave the road
//! - **Centerline**: a cyclic reference loop along the middle of the track
//!
//! ## Quick Start
//!
//! ```rust
//! use patha_map::{AStarPlanner, Cell, RoadMap};
//!
//! let map = RoadMap::from_ascii(
//!     "......\n\
//!      .####.\n\
//!      ......",
//!     1,
//! )
//! .unwrap();
//!
//! let planner = AStarPlanner::with_defaults(&map);
//! let result = planner.find_path(Cell::new(0, 1), Cell::new(5, 1)).unwrap();
//! assert_eq!(result.path_cells.first(), Some(&Cell::new(0, 1)));
//! assert_eq!(result.path_cells.last(), Some(&Cell::new(5, 1)));
//! ```
//!
//! ## Coordinate Frame
//!
//! World coordinates are raster coordinates: X grows to the right, Y grows
//! downward, one unit per source pixel. Cell `(x, y)` covers the world square
//! `[x * cell_size, (x + 1) * cell_size)` and is represented by its center.
//!
//! ## Architecture
//!
//! - [`core`]: `Cell` and `WorldPoint`
//! - [`road_map`]: raster classification and grid queries
//! - [`pathfinding`]: A* planner and path post-processing
//! - [`centerline`]: cyclic fallback waypoints

pub mod centerline;
pub mod core;
pub mod error;
pub mod pathfinding;
pub mod road_map;

pub use centerline::{Centerline, CenterlineConfig};
pub use core::{Cell, WorldPoint};
pub use error::{MapError, PathNotFound};
pub use pathfinding::{
    AStarConfig, AStarPlanner, PathResult, find_path, path_length, segment_is_drivable,
    shortcut_line_of_sight, simplify_collinear,
};
pub use road_map::{RoadMap, RoadMapConfig};
