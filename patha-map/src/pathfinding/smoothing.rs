//! Path post-processing.
//!
//! Both reductions are optional and keep every sample along the resulting
//! segments on drivable cells:
//! - Collinear simplification (keeps only the cells where direction changes)
//! - Line-of-sight shortcutting (skips waypoints with a clear straight run)

use crate::core::{Cell, WorldPoint};
use crate::road_map::RoadMap;

/// Drop interior cells where the step direction does not change.
///
/// The segments between the kept cells retrace the original cells exactly.
pub fn simplify_collinear(path: &[Cell]) -> Vec<Cell> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut simplified = vec![path[0]];
    for i in 1..path.len() - 1 {
        let incoming = path[i] - path[i - 1];
        let outgoing = path[i + 1] - path[i];
        if incoming != outgoing {
            simplified.push(path[i]);
        }
    }
    simplified.push(path[path.len() - 1]);
    simplified
}

/// Is every sample on the segment `a -> b` drivable?
///
/// Samples are at most a quarter cell apart, both endpoints included.
pub fn segment_is_drivable(map: &RoadMap, a: WorldPoint, b: WorldPoint) -> bool {
    let step = map.cell_size() * 0.25;
    let length = a.distance(&b);
    let samples = (length / step).ceil().max(1.0) as usize;

    (0..=samples).all(|i| map.is_drivable_world(a.lerp(&b, i as f32 / samples as f32)))
}

/// Greedily skip waypoints reachable by a drivable straight segment.
///
/// From each kept waypoint, jumps to the furthest later waypoint with a clear
/// segment. Adjacent waypoints are always kept as a fallback, so the output
/// never leaves the road more than the input does.
pub fn shortcut_line_of_sight(map: &RoadMap, path: &[WorldPoint]) -> Vec<WorldPoint> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut shortened = vec![path[0]];
    let mut i = 0;

    while i < path.len() - 1 {
        let mut furthest = i + 1;
        for j in (i + 2..path.len()).rev() {
            if segment_is_drivable(map, path[i], path[j]) {
                furthest = j;
                break;
            }
        }

        shortened.push(path[furthest]);
        i = furthest;
    }

    shortened
}

/// Sum of segment lengths
pub fn path_length(path: &[WorldPoint]) -> f32 {
    path.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::find_path;
    use approx::assert_relative_eq;

    #[test]
    fn test_simplify_straight_line() {
        let path: Vec<Cell> = (0..10).map(|x| Cell::new(x, 3)).collect();
        let simplified = simplify_collinear(&path);
        assert_eq!(simplified, vec![Cell::new(0, 3), Cell::new(9, 3)]);
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let path = vec![
            Cell::new(0, 0),
            Cell::new(1, 0),
            Cell::new(2, 0),
            Cell::new(3, 1),
            Cell::new(4, 2),
            Cell::new(4, 3),
        ];
        let simplified = simplify_collinear(&path);
        assert_eq!(
            simplified,
            vec![
                Cell::new(0, 0),
                Cell::new(2, 0),
                Cell::new(4, 2),
                Cell::new(4, 3)
            ]
        );
    }

    #[test]
    fn test_simplify_short_paths_untouched() {
        assert!(simplify_collinear(&[]).is_empty());
        assert_eq!(simplify_collinear(&[Cell::new(1, 1)]), vec![Cell::new(1, 1)]);
    }

    #[test]
    fn test_segment_drivability() {
        let map = RoadMap::from_ascii(
            ".....\n\
             ..#..\n\
             .....",
            2,
        )
        .unwrap();

        assert!(segment_is_drivable(
            &map,
            WorldPoint::new(1.0, 1.0),
            WorldPoint::new(9.0, 1.0)
        ));
        assert!(!segment_is_drivable(
            &map,
            WorldPoint::new(1.0, 3.0),
            WorldPoint::new(9.0, 3.0)
        ));
    }

    #[test]
    fn test_shortcut_stays_on_road() {
        let map = RoadMap::from_ascii(
            "..........\n\
             ..........\n\
             ....##....\n\
             ....##....\n\
             ..........\n\
             ..........",
            1,
        )
        .unwrap();

        let raw = find_path(&map, Cell::new(0, 3), Cell::new(9, 3)).unwrap();
        let short = shortcut_line_of_sight(&map, &raw.path_world);

        assert!(short.len() < raw.path_world.len());
        assert_eq!(short.first(), raw.path_world.first());
        assert_eq!(short.last(), raw.path_world.last());
        for pair in short.windows(2) {
            assert!(segment_is_drivable(&map, pair[0], pair[1]));
        }
        assert!(path_length(&short) <= raw.length_world() + 1e-3);
    }

    #[test]
    fn test_path_length() {
        let path = [
            WorldPoint::new(0.0, 0.0),
            WorldPoint::new(3.0, 4.0),
            WorldPoint::new(3.0, 10.0),
        ];
        assert_relative_eq!(path_length(&path), 11.0);
        assert_relative_eq!(path_length(&path[..1]), 0.0);
    }
}
