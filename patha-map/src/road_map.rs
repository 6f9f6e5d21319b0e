//! Immutable road traversability grid.
//!
//! Built once from a track raster: every cell samples the pixel at its
//! center, and the pixel is road when all three color channels exceed the
//! brightness threshold (road is rendered light gray). No smoothing, no
//! hysteresis. Queries outside the grid answer "not drivable".

use crate::core::{Cell, WorldPoint};
use crate::error::MapError;
use image::RgbImage;
use std::path::Path;

/// Classification parameters for building a [`RoadMap`]
#[derive(Clone, Debug)]
pub struct RoadMapConfig {
    /// Source pixels per cell side (1 = one cell per pixel)
    pub cell_size: u32,
    /// A pixel is road when R, G and B are all strictly above this value
    pub brightness_threshold: u8,
}

impl Default for RoadMapConfig {
    fn default() -> Self {
        Self {
            cell_size: 1,
            brightness_threshold: 150,
        }
    }
}

/// Binary drivable/blocked grid.
///
/// Never mutated after construction, so a shared reference (or an `Arc`)
/// can be read from any number of threads.
#[derive(Clone, Debug)]
pub struct RoadMap {
    width: usize,
    height: usize,
    cell_size: f32,
    drivable: Vec<bool>,
}

impl RoadMap {
    /// Classify a row-major RGB buffer (3 bytes per pixel).
    pub fn from_rgb(
        width: u32,
        height: u32,
        pixels: &[u8],
        config: &RoadMapConfig,
    ) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidImage(format!(
                "zero-size image ({}x{})",
                width, height
            )));
        }
        if config.cell_size == 0 {
            return Err(MapError::InvalidConfig("cell_size must be at least 1".into()));
        }

        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(MapError::InvalidImage(format!(
                "pixel buffer holds {} bytes, expected {} for {}x{} RGB",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        let cs = config.cell_size;
        let cols = width.div_ceil(cs) as usize;
        let rows = height.div_ceil(cs) as usize;
        let threshold = config.brightness_threshold;

        let mut drivable = Vec::with_capacity(cols * rows);
        for row in 0..rows as u32 {
            let py = (row * cs + cs / 2).min(height - 1) as usize;
            for col in 0..cols as u32 {
                let px = (col * cs + cs / 2).min(width - 1) as usize;
                let i = (py * width as usize + px) * 3;
                let rgb = &pixels[i..i + 3];
                drivable.push(rgb.iter().all(|&channel| channel > threshold));
            }
        }

        let map = Self {
            width: cols,
            height: rows,
            cell_size: cs as f32,
            drivable,
        };

        log::debug!(
            "[RoadMap] classified {}x{} px into {}x{} cells ({} drivable)",
            width,
            height,
            cols,
            rows,
            map.drivable_count()
        );

        Ok(map)
    }

    /// Classify a decoded RGB image.
    pub fn from_image(image: &RgbImage, config: &RoadMapConfig) -> Result<Self, MapError> {
        Self::from_rgb(image.width(), image.height(), image.as_raw(), config)
    }

    /// Decode and classify an image file.
    pub fn load<P: AsRef<Path>>(path: P, config: &RoadMapConfig) -> Result<Self, MapError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| {
                MapError::InvalidImage(format!("failed to load {}: {}", path.display(), e))
            })?
            .into_rgb8();
        Self::from_image(&image, config)
    }

    /// Build directly from a drivable mask (row-major, `width * height` cells).
    pub fn from_cells(
        width: usize,
        height: usize,
        cell_size: u32,
        drivable: Vec<bool>,
    ) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidImage(format!(
                "zero-size grid ({}x{})",
                width, height
            )));
        }
        if cell_size == 0 {
            return Err(MapError::InvalidConfig("cell_size must be at least 1".into()));
        }
        if drivable.len() != width * height {
            return Err(MapError::InvalidImage(format!(
                "mask holds {} cells, expected {}",
                drivable.len(),
                width * height
            )));
        }
        Ok(Self {
            width,
            height,
            cell_size: cell_size as f32,
            drivable,
        })
    }

    /// Build from a text sketch: `.` is road, anything else is blocked.
    ///
    /// Leading/trailing whitespace on each line is ignored; blank lines are
    /// skipped. All rows must have the same length.
    pub fn from_ascii(sketch: &str, cell_size: u32) -> Result<Self, MapError> {
        let rows: Vec<&str> = sketch
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.chars().count() != width) {
            return Err(MapError::InvalidImage(format!(
                "ragged sketch row {:?}, expected {} columns",
                bad, width
            )));
        }

        let drivable = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c == '.'))
            .collect();
        Self::from_cells(width, rows.len(), cell_size, drivable)
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// World units per cell side
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World extent covered by the grid (width, height)
    pub fn world_size(&self) -> (f32, f32) {
        (
            self.width as f32 * self.cell_size,
            self.height as f32 * self.cell_size,
        )
    }

    /// Is the cell inside the grid?
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Is `(x, y)` road? Out-of-bounds answers `false`.
    #[inline]
    pub fn is_drivable(&self, x: i32, y: i32) -> bool {
        self.is_drivable_cell(Cell::new(x, y))
    }

    /// Is the cell road? Out-of-bounds answers `false`.
    #[inline]
    pub fn is_drivable_cell(&self, cell: Cell) -> bool {
        self.contains(cell) && self.drivable[cell.y as usize * self.width + cell.x as usize]
    }

    /// Is the cell under a world point road?
    #[inline]
    pub fn is_drivable_world(&self, point: WorldPoint) -> bool {
        self.is_drivable_cell(self.world_to_cell(point))
    }

    /// Cell containing a world point (may lie outside the grid)
    #[inline]
    pub fn world_to_cell(&self, point: WorldPoint) -> Cell {
        Cell::new(
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    /// Cell containing a world point, clamped into the grid
    pub fn world_to_cell_clamped(&self, point: WorldPoint) -> Cell {
        let cell = self.world_to_cell(point);
        Cell::new(
            cell.x.clamp(0, self.width as i32 - 1),
            cell.y.clamp(0, self.height as i32 - 1),
        )
    }

    /// World position of a cell center
    #[inline]
    pub fn cell_to_world(&self, cell: Cell) -> WorldPoint {
        WorldPoint::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    /// Number of drivable cells
    pub fn drivable_count(&self) -> usize {
        self.drivable.iter().filter(|&&d| d).count()
    }

    /// Fraction of the grid that is road
    pub fn drivable_fraction(&self) -> f32 {
        self.drivable_count() as f32 / self.drivable.len() as f32
    }

    /// Nearest drivable cell within `max_radius` rings (Chebyshev distance).
    ///
    /// Rings are scanned row by row, so the result is deterministic. Returns
    /// `center` itself when it is already road.
    pub fn nearest_drivable(&self, center: Cell, max_radius: i32) -> Option<Cell> {
        if self.is_drivable_cell(center) {
            return Some(center);
        }

        for r in 1..=max_radius {
            for dy in -r..=r {
                for dx in -r..=r {
                    // Only the ring boundary
                    if dx.abs() != r && dy.abs() != r {
                        continue;
                    }
                    let cell = Cell::new(center.x + dx, center.y + dy);
                    if self.is_drivable_cell(cell) {
                        return Some(cell);
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ROAD: [u8; 3] = [190, 190, 190];
    const GRASS: [u8; 3] = [40, 140, 40];

    fn striped_rgb(width: u32, height: u32) -> Vec<u8> {
        // Left half road, right half grass
        let mut pixels = Vec::new();
        for _y in 0..height {
            for x in 0..width {
                let px = if x < width / 2 { ROAD } else { GRASS };
                pixels.extend_from_slice(&px);
            }
        }
        pixels
    }

    #[test]
    fn test_classification_per_pixel() {
        let pixels = striped_rgb(8, 4);
        let map = RoadMap::from_rgb(8, 4, &pixels, &RoadMapConfig::default()).unwrap();

        assert_eq!(map.width(), 8);
        assert_eq!(map.height(), 4);
        assert!(map.is_drivable(0, 0));
        assert!(map.is_drivable(3, 3));
        assert!(!map.is_drivable(4, 0));
        assert_eq!(map.drivable_count(), 16);
    }

    #[test]
    fn test_all_channels_must_exceed_threshold() {
        // Bright red and bright green are not road
        let pixels = [255, 255, 255, 255, 0, 0, 0, 255, 0, 151, 151, 151];
        let map = RoadMap::from_rgb(4, 1, &pixels, &RoadMapConfig::default()).unwrap();

        assert!(map.is_drivable(0, 0));
        assert!(!map.is_drivable(1, 0));
        assert!(!map.is_drivable(2, 0));
        assert!(map.is_drivable(3, 0));
    }

    #[test]
    fn test_threshold_is_strict() {
        let pixels = [150, 150, 150];
        let map = RoadMap::from_rgb(1, 1, &pixels, &RoadMapConfig::default()).unwrap();
        assert!(!map.is_drivable(0, 0));
    }

    #[test]
    fn test_tiled_sampling_uses_tile_center() {
        let pixels = striped_rgb(10, 10);
        let config = RoadMapConfig {
            cell_size: 4,
            ..Default::default()
        };
        let map = RoadMap::from_rgb(10, 10, &pixels, &config).unwrap();

        // ceil(10 / 4) = 3 cells per side
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 3);
        // Tile 0 samples x=2 (road), tile 1 samples x=6 (grass), tile 2 clamps to x=9
        assert!(map.is_drivable(0, 1));
        assert!(!map.is_drivable(1, 1));
        assert!(!map.is_drivable(2, 1));
    }

    #[test]
    fn test_zero_size_rejected() {
        let result = RoadMap::from_rgb(0, 5, &[], &RoadMapConfig::default());
        assert!(matches!(result, Err(MapError::InvalidImage(_))));
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let result = RoadMap::from_rgb(2, 2, &[0u8; 11], &RoadMapConfig::default());
        assert!(matches!(result, Err(MapError::InvalidImage(_))));
    }

    #[test]
    fn test_zero_cell_size_rejected() {
        let config = RoadMapConfig {
            cell_size: 0,
            ..Default::default()
        };
        let result = RoadMap::from_rgb(1, 1, &[200, 200, 200], &config);
        assert!(matches!(result, Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn test_out_of_bounds_is_wall() {
        let map = RoadMap::from_ascii("...\n...", 1).unwrap();
        assert!(!map.is_drivable(-1, 0));
        assert!(!map.is_drivable(0, -1));
        assert!(!map.is_drivable(3, 0));
        assert!(!map.is_drivable(0, 2));
        assert!(!map.is_drivable(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_world_cell_round_trip() {
        let map = RoadMap::from_ascii("....\n....\n....", 4).unwrap();

        let center = map.cell_to_world(Cell::new(2, 1));
        assert_relative_eq!(center.x, 10.0);
        assert_relative_eq!(center.y, 6.0);
        assert_eq!(map.world_to_cell(center), Cell::new(2, 1));
        assert_eq!(map.world_to_cell(WorldPoint::new(-0.5, 3.9)), Cell::new(-1, 0));
        assert_eq!(
            map.world_to_cell_clamped(WorldPoint::new(-50.0, 500.0)),
            Cell::new(0, 2)
        );
    }

    #[test]
    fn test_nearest_drivable() {
        let map = RoadMap::from_ascii(
            "#####\n\
             #####\n\
             ##..#\n\
             #####",
            1,
        )
        .unwrap();

        assert_eq!(map.nearest_drivable(Cell::new(2, 2), 3), Some(Cell::new(2, 2)));
        assert_eq!(map.nearest_drivable(Cell::new(2, 0), 3), Some(Cell::new(2, 2)));
        assert_eq!(map.nearest_drivable(Cell::new(0, 0), 1), None);
    }

    #[test]
    fn test_ragged_sketch_rejected() {
        assert!(RoadMap::from_ascii("...\n..", 1).is_err());
    }
}
