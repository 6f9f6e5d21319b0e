//! Cyclic reference path along the middle of the track.
//!
//! Used as the default path before any plan exists and whenever planning
//! fails. Extracted once from a [`RoadMap`] by scanning rows and columns for
//! runs of road and ordering the run midpoints by angle around the track
//! center.

use crate::core::{Cell, WorldPoint};
use crate::error::MapError;
use crate::road_map::RoadMap;
use std::f32::consts::{PI, TAU};

/// Points in the fallback circle
const FALLBACK_POINTS: usize = 36;

/// Fallback circle radius as a fraction of the smaller half-extent
const FALLBACK_RADIUS_FACTOR: f32 = 0.7;

/// Centerline extraction parameters (world units)
#[derive(Clone, Debug)]
pub struct CenterlineConfig {
    /// Distance between scanned rows/columns and between output points
    pub step: f32,
    /// Shortest run of road that counts as track
    pub min_road_width: f32,
}

impl Default for CenterlineConfig {
    fn default() -> Self {
        Self {
            step: 6.0,
            min_road_width: 4.0,
        }
    }
}

/// Closed loop of world-space waypoints. Never empty.
#[derive(Clone, Debug)]
pub struct Centerline {
    points: Vec<WorldPoint>,
}

impl Centerline {
    /// Use an explicit waypoint loop.
    pub fn from_points(points: Vec<WorldPoint>) -> Result<Self, MapError> {
        if points.is_empty() {
            return Err(MapError::InvalidConfig("centerline has no points".into()));
        }
        Ok(Self { points })
    }

    /// Extract from the map, falling back to [`Centerline::circle`] when the
    /// map has too little road to outline a loop.
    pub fn extract(map: &RoadMap, config: &CenterlineConfig) -> Self {
        let midpoints = run_midpoints(map, config);
        let points = order_by_angle(&midpoints, config.step);

        if points.len() < 3 {
            log::warn!(
                "[Centerline] only {} points extracted, using fallback circle",
                points.len()
            );
            return Self::circle(map);
        }

        log::debug!(
            "[Centerline] extracted {} points from {} run midpoints",
            points.len(),
            midpoints.len()
        );
        Self { points }
    }

    /// Circle centered on the map.
    pub fn circle(map: &RoadMap) -> Self {
        let (w, h) = map.world_size();
        let (cx, cy) = (w / 2.0, h / 2.0);
        let radius = FALLBACK_RADIUS_FACTOR * cx.min(cy);

        let points = (0..FALLBACK_POINTS)
            .map(|i| {
                let a = i as f32 * TAU / FALLBACK_POINTS as f32;
                WorldPoint::new(cx + radius * a.cos(), cy + radius * a.sin())
            })
            .collect();
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    /// Waypoint at `index`, wrapping around the loop.
    #[inline]
    pub fn point(&self, index: usize) -> WorldPoint {
        self.points[index % self.points.len()]
    }

    #[inline]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.points.len()
    }

    /// Index of the waypoint closest to `p` (first wins on ties).
    pub fn nearest_index(&self, p: WorldPoint) -> usize {
        let mut best = 0;
        let mut best_d = f32::INFINITY;
        for (i, q) in self.points.iter().enumerate() {
            let d = p.distance_squared(q);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    /// Waypoint `ahead` steps past the one nearest to `p`.
    pub fn lookahead(&self, p: WorldPoint, ahead: usize) -> WorldPoint {
        self.point(self.nearest_index(p) + ahead)
    }

    /// The loop unrolled from the waypoint after the one nearest `p`.
    ///
    /// Handy as a follower path when no plan is available.
    pub fn path_from(&self, p: WorldPoint) -> Vec<WorldPoint> {
        let start = self.nearest_index(p) + 1;
        (0..self.points.len()).map(|i| self.point(start + i)).collect()
    }
}

/// Midpoints of every long-enough run of road on sampled rows and columns.
fn run_midpoints(map: &RoadMap, config: &CenterlineConfig) -> Vec<WorldPoint> {
    let cs = map.cell_size();
    let stride = ((config.step / cs).round() as usize).max(1);
    let (w, h) = (map.width() as i32, map.height() as i32);
    let mut mids = Vec::new();

    for y in (0..h).step_by(stride) {
        for (start, end) in drivable_runs(w, |x| map.is_drivable(x, y)) {
            if (end - start + 1) as f32 * cs >= config.min_road_width {
                let mid_x = (start + end + 1) as f32 / 2.0 * cs;
                mids.push(WorldPoint::new(mid_x, map.cell_to_world(Cell::new(0, y)).y));
            }
        }
    }

    for x in (0..w).step_by(stride) {
        for (start, end) in drivable_runs(h, |y| map.is_drivable(x, y)) {
            if (end - start + 1) as f32 * cs >= config.min_road_width {
                let mid_y = (start + end + 1) as f32 / 2.0 * cs;
                mids.push(WorldPoint::new(map.cell_to_world(Cell::new(x, 0)).x, mid_y));
            }
        }
    }

    mids
}

/// Inclusive index ranges of consecutive drivable cells along one line.
fn drivable_runs(len: i32, drivable: impl Fn(i32) -> bool) -> Vec<(i32, i32)> {
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..len {
        match (drivable(i), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, len - 1));
    }
    runs
}

/// Average midpoints into angular bins around their centroid.
fn order_by_angle(mids: &[WorldPoint], step: f32) -> Vec<WorldPoint> {
    if mids.is_empty() {
        return Vec::new();
    }

    let n = mids.len() as f32;
    let cx = mids.iter().map(|p| p.x).sum::<f32>() / n;
    let cy = mids.iter().map(|p| p.y).sum::<f32>() / n;
    let center = WorldPoint::new(cx, cy);
    let mean_radius = mids.iter().map(|p| p.distance(&center)).sum::<f32>() / n;

    let bins = ((TAU * mean_radius / step.max(f32::EPSILON)).ceil() as usize).clamp(8, 720);
    let mut acc = vec![(0.0f32, 0.0f32, 0usize); bins];

    for p in mids {
        let angle = (p.y - cy).atan2(p.x - cx);
        let bin = (((angle + PI) / TAU * bins as f32) as usize).min(bins - 1);
        let slot = &mut acc[bin];
        slot.0 += p.x;
        slot.1 += p.y;
        slot.2 += 1;
    }

    acc.into_iter()
        .filter(|&(_, _, count)| count > 0)
        .map(|(sx, sy, count)| WorldPoint::new(sx / count as f32, sy / count as f32))
        .collect()
}
