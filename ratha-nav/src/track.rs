//! Track setup: road map plus centerline, from a PNG or a generated oval.

use image::{Rgb, RgbImage};
use patha_map::{Centerline, CenterlineConfig, RoadMap, RoadMapConfig, WorldPoint};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::error::{NavError, Result};
use crate::pose::AgentPose;

/// Road color of the generated oval
const ROAD_COLOR: Rgb<u8> = Rgb([190, 190, 190]);
/// Off-road color of the generated oval
const GRASS_COLOR: Rgb<u8> = Rgb([38, 112, 46]);

/// Track source and classification settings
#[derive(Clone, Debug, Deserialize)]
pub struct TrackConfig {
    /// Track PNG; a synthetic oval is generated when absent
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Source pixels per grid cell
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
    /// Road pixels have every channel above this
    #[serde(default = "default_brightness_threshold")]
    pub brightness_threshold: u8,
    /// Centerline sampling step (world units)
    #[serde(default = "default_centerline_step")]
    pub centerline_step: f32,
    /// Narrowest road run kept for the centerline (world units)
    #[serde(default = "default_min_road_width")]
    pub min_road_width: f32,
    /// Explicit centerline loop, `[[x, y], ...]`
    #[serde(default)]
    pub centerline: Option<Vec<[f32; 2]>>,
    /// Synthetic oval image width (pixels)
    #[serde(default = "default_oval_width")]
    pub width: u32,
    /// Synthetic oval image height (pixels)
    #[serde(default = "default_oval_height")]
    pub height: u32,
    /// Synthetic oval road width (pixels)
    #[serde(default = "default_road_width")]
    pub road_width: f32,
}

fn default_cell_size() -> u32 {
    4
}
fn default_brightness_threshold() -> u8 {
    150
}
fn default_centerline_step() -> f32 {
    6.0
}
fn default_min_road_width() -> f32 {
    4.0
}
fn default_oval_width() -> u32 {
    800
}
fn default_oval_height() -> u32 {
    600
}
fn default_road_width() -> f32 {
    70.0
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            image: None,
            cell_size: default_cell_size(),
            brightness_threshold: default_brightness_threshold(),
            centerline_step: default_centerline_step(),
            min_road_width: default_min_road_width(),
            centerline: None,
            width: default_oval_width(),
            height: default_oval_height(),
            road_width: default_road_width(),
        }
    }
}

impl TrackConfig {
    fn road_map_config(&self) -> RoadMapConfig {
        RoadMapConfig {
            cell_size: self.cell_size,
            brightness_threshold: self.brightness_threshold,
        }
    }
}

/// Immutable track data shared by every agent
#[derive(Clone, Debug)]
pub struct Track {
    pub map: Arc<RoadMap>,
    pub centerline: Arc<Centerline>,
}

impl Track {
    /// Build the road map and centerline described by `config`.
    pub fn load(config: &TrackConfig) -> Result<Self> {
        let map = match &config.image {
            Some(path) => {
                info!("Loading track image {:?}", path);
                RoadMap::load(path, &config.road_map_config())?
            }
            None => {
                info!(
                    "Generating {}x{} oval track (road width {:.0})",
                    config.width, config.height, config.road_width
                );
                let image = render_oval(config.width, config.height, config.road_width)?;
                RoadMap::from_image(&image, &config.road_map_config())?
            }
        };

        info!(
            "Road map: {}x{} cells of {}px, {:.1}% drivable",
            map.width(),
            map.height(),
            config.cell_size,
            map.drivable_fraction() * 100.0
        );

        let centerline = match &config.centerline {
            Some(points) => {
                Centerline::from_points(points.iter().map(|&[x, y]| WorldPoint::new(x, y)).collect())?
            }
            None => Centerline::extract(
                &map,
                &CenterlineConfig {
                    step: config.centerline_step,
                    min_road_width: config.min_road_width,
                },
            ),
        };
        info!("Centerline: {} waypoints", centerline.len());

        Ok(Self {
            map: Arc::new(map),
            centerline: Arc::new(centerline),
        })
    }

    /// Starting poses `spacing` world units apart along the centerline,
    /// each facing the next waypoint.
    pub fn spawn_poses(&self, count: usize, spacing: f32) -> Vec<AgentPose> {
        let line = &self.centerline;
        let mut poses = Vec::with_capacity(count);
        let mut index = 0;
        let mut travelled = 0.0;

        for slot in 0..count {
            let wanted = slot as f32 * spacing;
            // Bounded by one lap so a degenerate loop cannot spin forever
            for _ in 0..line.len() {
                if travelled >= wanted {
                    break;
                }
                travelled += line.point(index).distance(&line.point(index + 1));
                index = line.next_index(index);
            }

            let here = line.point(index);
            let heading = here.bearing_to(&line.point(index + 1));
            poses.push(AgentPose::new(here.x, here.y, heading));
        }
        poses
    }
}

/// Render a light-gray elliptical ring on grass.
///
/// The ring's middle follows the ellipse inset one road width from the
/// image border.
pub fn render_oval(width: u32, height: u32, road_width: f32) -> Result<RgbImage> {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (a, b) = (cx - road_width, cy - road_width);
    let half = road_width / 2.0;

    if road_width <= 0.0 || a - half <= 0.0 || b - half <= 0.0 {
        return Err(NavError::Config(format!(
            "oval {}x{} cannot fit a road {:.0} wide",
            width, height, road_width
        )));
    }

    let inside = |x: f32, y: f32, ra: f32, rb: f32| {
        let (dx, dy) = (x - cx, y - cy);
        (dx * dx) / (ra * ra) + (dy * dy) / (rb * rb) <= 1.0
    };

    Ok(RgbImage::from_fn(width, height, |px, py| {
        let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
        if inside(x, y, a + half, b + half) && !inside(x, y, a - half, b - half) {
            ROAD_COLOR
        } else {
            GRASS_COLOR
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oval_track() {
        let track = Track::load(&TrackConfig::default()).unwrap();

        assert_eq!(track.map.width(), 200);
        assert_eq!(track.map.height(), 150);
        // Center of the infield and the corners are grass
        assert!(!track.map.is_drivable_world(WorldPoint::new(400.0, 300.0)));
        assert!(!track.map.is_drivable_world(WorldPoint::new(5.0, 5.0)));
        // Middle of the right straight is road
        assert!(track.map.is_drivable_world(WorldPoint::new(730.0, 300.0)));

        let on_road = track
            .centerline
            .points()
            .iter()
            .filter(|p| track.map.is_drivable_world(**p))
            .count();
        assert_eq!(on_road, track.centerline.len());
    }

    #[test]
    fn test_explicit_centerline() {
        let config = TrackConfig {
            centerline: Some(vec![[100.0, 100.0], [200.0, 100.0], [150.0, 200.0]]),
            ..Default::default()
        };
        let track = Track::load(&config).unwrap();
        assert_eq!(track.centerline.len(), 3);
        assert_eq!(track.centerline.point(1), WorldPoint::new(200.0, 100.0));
    }

    #[test]
    fn test_oval_too_small() {
        assert!(render_oval(100, 100, 60.0).is_err());
    }

    #[test]
    fn test_spawn_poses_are_spaced() {
        let track = Track::load(&TrackConfig::default()).unwrap();
        let poses = track.spawn_poses(3, 30.0);

        assert_eq!(poses.len(), 3);
        for pair in poses.windows(2) {
            let gap = pair[0].position().distance(&pair[1].position());
            assert!(gap > 20.0 && gap < 40.0, "gap {}", gap);
        }
        assert!(poses.iter().all(|p| track.map.is_drivable_world(p.position())));
    }
}
