//! Tile grid geometry.
//!
//! Maps between source pixel coordinates and tile indices. The grid is
//! anchored at a tile grid offset (the pixel position of tile `(0, 0)`'s
//! top-left corner) and covers the source bounds with cells of a fixed size.
//!
//! ```text
//!   origin ─►┌──────┬──────┬────┐
//!            │(0,0) │(1,0) │(2,0│  ◄─ last column clipped to bounds
//!            ├──────┼──────┼────┤
//!            │(0,1) │(1,1) │(2,1│
//!            └──────┴──────┴────┘
//! ```

use crate::geom::{floor_div, PixelRect};
use crate::tile::coord::TileCoord;
use crate::tile::error::TileError;

/// Default edge length of a tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 128;

/// Read-only description of a node's tile grid.
///
/// Derived once from the upstream source at construction. The tile size is
/// never larger than the source bounds: oversize requests are clamped down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGridGeometry {
    bounds: PixelRect,
    origin_x: i32,
    origin_y: i32,
    tile_width: i32,
    tile_height: i32,
    min_tile_x: i32,
    min_tile_y: i32,
    num_x_tiles: i32,
    num_y_tiles: i32,
}

impl TileGridGeometry {
    /// Derive grid geometry for a source.
    ///
    /// # Arguments
    ///
    /// * `bounds` - The source's pixel bounds
    /// * `grid_offset` - Pixel position of tile `(0, 0)`
    /// * `tile_width` / `tile_height` - Requested tile size, clamped to bounds
    ///
    /// # Errors
    ///
    /// Returns `TileError::EmptyBounds` if the source covers no pixels.
    pub fn new(
        bounds: PixelRect,
        grid_offset: (i32, i32),
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self, TileError> {
        if bounds.is_empty() {
            return Err(TileError::EmptyBounds {
                width: bounds.width,
                height: bounds.height,
            });
        }

        let tile_width = (tile_width.min(i32::MAX as u32) as i32).clamp(1, bounds.width);
        let tile_height = (tile_height.min(i32::MAX as u32) as i32).clamp(1, bounds.height);
        let (origin_x, origin_y) = grid_offset;

        let index = |px: i32, origin: i32, size: i32| -> i32 {
            floor_div(px as i64 - origin as i64, size as i64) as i32
        };

        let min_tile_x = index(bounds.x, origin_x, tile_width);
        let max_tile_x = index(bounds.right() - 1, origin_x, tile_width);
        let min_tile_y = index(bounds.y, origin_y, tile_height);
        let max_tile_y = index(bounds.bottom() - 1, origin_y, tile_height);

        Ok(Self {
            bounds,
            origin_x,
            origin_y,
            tile_width,
            tile_height,
            min_tile_x,
            min_tile_y,
            num_x_tiles: max_tile_x - min_tile_x + 1,
            num_y_tiles: max_tile_y - min_tile_y + 1,
        })
    }

    /// Source pixel bounds covered by the grid.
    pub fn bounds(&self) -> PixelRect {
        self.bounds
    }

    /// Pixel position of tile `(0, 0)`.
    pub fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_y)
    }

    pub fn tile_width(&self) -> i32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> i32 {
        self.tile_height
    }

    pub fn min_tile_x(&self) -> i32 {
        self.min_tile_x
    }

    pub fn min_tile_y(&self) -> i32 {
        self.min_tile_y
    }

    pub fn num_x_tiles(&self) -> i32 {
        self.num_x_tiles
    }

    pub fn num_y_tiles(&self) -> i32 {
        self.num_y_tiles
    }

    /// Total number of tiles in the grid.
    pub fn tile_count(&self) -> usize {
        self.num_x_tiles as usize * self.num_y_tiles as usize
    }

    /// Column index of the tile holding pixel column `px`.
    ///
    /// `floor((px - origin_x) / tile_width)`; the result may lie outside the
    /// grid's valid range.
    pub fn x_tile(&self, px: i32) -> i32 {
        floor_div(px as i64 - self.origin_x as i64, self.tile_width as i64) as i32
    }

    /// Row index of the tile holding pixel row `py`.
    pub fn y_tile(&self, py: i32) -> i32 {
        floor_div(py as i64 - self.origin_y as i64, self.tile_height as i64) as i32
    }

    /// True when `coord` names a tile inside the grid.
    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.x >= self.min_tile_x
            && coord.x < self.min_tile_x + self.num_x_tiles
            && coord.y >= self.min_tile_y
            && coord.y < self.min_tile_y + self.num_y_tiles
    }

    /// Validate a coordinate against the grid.
    ///
    /// # Errors
    ///
    /// Returns `TileError::OutOfGrid` for indices outside the grid.
    pub fn check(&self, coord: TileCoord) -> Result<(), TileError> {
        if self.contains(coord) {
            Ok(())
        } else {
            Err(TileError::OutOfGrid {
                x: coord.x,
                y: coord.y,
                min_x: self.min_tile_x,
                min_y: self.min_tile_y,
                num_x: self.num_x_tiles,
                num_y: self.num_y_tiles,
            })
        }
    }

    /// Unclipped grid cell of a tile.
    ///
    /// Cells reaching past the `i32` pixel range are cut at its limits.
    pub fn cell_rect(&self, coord: TileCoord) -> PixelRect {
        let (x, width) = cell_span(self.origin_x, coord.x, self.tile_width);
        let (y, height) = cell_span(self.origin_y, coord.y, self.tile_height);
        PixelRect::new(x, y, width, height)
    }

    /// Pixel footprint of a tile, clipped to the source bounds.
    pub fn tile_rect(&self, coord: TileCoord) -> PixelRect {
        self.cell_rect(coord).intersection(&self.bounds)
    }

    /// Inclusive tile index range covering `rect`, clamped to the grid.
    ///
    /// `rect` is first clipped to the bounds, so every tile in the range has
    /// a footprint that intersects it. Returns `None` when nothing is left,
    /// including for rectangles with no pixels.
    pub fn tile_range(&self, rect: &PixelRect) -> Option<(i32, i32, i32, i32)> {
        let rect = rect.intersection(&self.bounds);
        if rect.is_empty() {
            return None;
        }

        let tx0 = self.x_tile(rect.x).max(self.min_tile_x);
        let ty0 = self.y_tile(rect.y).max(self.min_tile_y);
        let tx1 = self
            .x_tile(rect.x.saturating_add(rect.width).saturating_sub(1))
            .min(self.min_tile_x + self.num_x_tiles - 1);
        let ty1 = self
            .y_tile(rect.y.saturating_add(rect.height).saturating_sub(1))
            .min(self.min_tile_y + self.num_y_tiles - 1);

        if tx1 < tx0 || ty1 < ty0 {
            None
        } else {
            Some((tx0, tx1, ty0, ty1))
        }
    }

    /// Every tile of the grid, row-major.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        TileCoord::row_major(
            self.min_tile_x,
            self.min_tile_x + self.num_x_tiles - 1,
            self.min_tile_y,
            self.min_tile_y + self.num_y_tiles - 1,
        )
    }

    /// Tiles whose footprint may intersect `rect`, row-major.
    pub fn coords_in(&self, rect: &PixelRect) -> Vec<TileCoord> {
        match self.tile_range(rect) {
            Some((tx0, tx1, ty0, ty1)) => TileCoord::row_major(tx0, tx1, ty0, ty1).collect(),
            None => Vec::new(),
        }
    }
}

/// Start and length of cell `index` along one axis, limited to `i32`.
fn cell_span(origin: i32, index: i32, size: i32) -> (i32, i32) {
    let (min, max) = (i64::from(i32::MIN), i64::from(i32::MAX));
    let start = i64::from(origin) + i64::from(index) * i64::from(size);
    let end = (start + i64::from(size)).clamp(min, max);
    let start = start.clamp(min, max);
    (start as i32, (end - start) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: i32, height: i32, tile: u32) -> TileGridGeometry {
        TileGridGeometry::new(PixelRect::from_size(width, height), (0, 0), tile, tile).unwrap()
    }

    #[test]
    fn test_grid_counts_partial_edge_tiles() {
        let g = grid(300, 200, 128);
        assert_eq!(g.num_x_tiles(), 3);
        assert_eq!(g.num_y_tiles(), 2);
        assert_eq!(g.tile_count(), 6);
        assert_eq!(g.tile_rect(TileCoord::new(2, 1)), PixelRect::new(256, 128, 44, 72));
    }

    #[test]
    fn test_oversize_tile_is_clamped_to_bounds() {
        let g = TileGridGeometry::new(PixelRect::from_size(50, 30), (0, 0), 512, 512).unwrap();
        assert_eq!(g.tile_width(), 50);
        assert_eq!(g.tile_height(), 30);
        assert_eq!(g.tile_count(), 1);
    }

    #[test]
    fn test_empty_bounds_rejected() {
        let result = TileGridGeometry::new(PixelRect::from_size(0, 10), (0, 0), 64, 64);
        assert!(matches!(result, Err(TileError::EmptyBounds { .. })));
    }

    #[test]
    fn test_offset_origin_gives_negative_indices() {
        let g = TileGridGeometry::new(PixelRect::new(-10, -10, 100, 100), (0, 0), 64, 64).unwrap();
        assert_eq!(g.min_tile_x(), -1);
        assert_eq!(g.min_tile_y(), -1);
        assert_eq!(g.num_x_tiles(), 3);
        assert_eq!(g.tile_rect(TileCoord::new(-1, -1)), PixelRect::new(-10, -10, 10, 10));
    }

    #[test]
    fn test_check_rejects_outside_coordinates() {
        let g = grid(256, 256, 128);
        assert!(g.check(TileCoord::new(1, 1)).is_ok());
        assert!(matches!(
            g.check(TileCoord::new(2, 0)),
            Err(TileError::OutOfGrid { x: 2, y: 0, .. })
        ));
        assert!(g.check(TileCoord::new(0, -1)).is_err());
    }

    #[test]
    fn test_tile_range_clamps_straddling_rect() {
        let g = grid(256, 256, 64);
        let range = g.tile_range(&PixelRect::new(-100, 200, 150, 500));
        assert_eq!(range, Some((0, 0, 3, 3)));
    }

    #[test]
    fn test_tile_range_outside_grid_is_none() {
        let g = grid(256, 256, 64);
        assert_eq!(g.tile_range(&PixelRect::new(1000, 0, 10, 10)), None);
        assert_eq!(g.tile_range(&PixelRect::new(-50, -50, 10, 10)), None);
    }

    #[test]
    fn test_tile_range_ignores_unclipped_edge_cell() {
        // Tile 3 spans cell 96..128 but only pixels 96..100 exist
        let g = grid(100, 100, 32);
        assert_eq!(g.tile_range(&PixelRect::new(110, 0, 5, 5)), None);
        assert_eq!(g.tile_range(&PixelRect::new(99, 0, 5, 5)), Some((3, 3, 0, 0)));
    }

    #[test]
    fn test_tile_range_zero_width_is_none() {
        let g = grid(256, 256, 64);
        assert_eq!(g.tile_range(&PixelRect::new(10, 10, 0, 10)), None);
    }

    #[test]
    fn test_cell_rect_near_pixel_limits() {
        let g = TileGridGeometry::new(
            PixelRect::new(i32::MAX - 100, 0, 100, 10),
            (i32::MAX - 100, 0),
            64,
            64,
        )
        .unwrap();
        assert_eq!(g.num_x_tiles(), 2);
        assert_eq!(g.cell_rect(TileCoord::new(1, 0)), PixelRect::new(i32::MAX - 36, 0, 36, 10));
        assert_eq!(g.tile_rect(TileCoord::new(1, 0)), PixelRect::new(i32::MAX - 36, 0, 36, 10));

        // Indices far outside the grid do not wrap around
        let g = grid(256, 256, 64);
        let far = g.cell_rect(TileCoord::new(i32::MAX, i32::MIN));
        assert_eq!(far.x, i32::MAX);
        assert_eq!(far.y, i32::MIN);
        assert!(g.tile_rect(TileCoord::new(i32::MAX, i32::MIN)).is_empty());
    }

    #[test]
    fn test_coords_row_major() {
        let g = grid(128, 128, 64);
        let coords: Vec<_> = g.coords().collect();
        assert_eq!(coords[0], TileCoord::new(0, 0));
        assert_eq!(coords[1], TileCoord::new(1, 0));
        assert_eq!(coords[2], TileCoord::new(0, 1));
        assert_eq!(coords.len(), 4);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tiles_partition_bounds(
                x in -500i32..500,
                y in -500i32..500,
                w in 1i32..700,
                h in 1i32..700,
                ox in -64i32..64,
                oy in -64i32..64,
                tile in 1u32..200
            ) {
                let g = TileGridGeometry::new(PixelRect::new(x, y, w, h), (ox, oy), tile, tile)?;
                let covered: u64 = g.coords().map(|c| g.tile_rect(c).area()).sum();
                prop_assert_eq!(covered, g.bounds().area());
                for c in g.coords() {
                    prop_assert!(!g.tile_rect(c).is_empty(), "tile {} has no pixels", c);
                }
            }

            #[test]
            fn test_pixel_maps_to_tile_containing_it(
                w in 1i32..600,
                h in 1i32..600,
                tile in 1u32..128,
                px in 0i32..600,
                py in 0i32..600
            ) {
                prop_assume!(px < w && py < h);
                let g = TileGridGeometry::new(PixelRect::from_size(w, h), (0, 0), tile, tile)?;
                let coord = TileCoord::new(g.x_tile(px), g.y_tile(py));
                prop_assert!(g.contains(coord));
                prop_assert!(g.tile_rect(coord).contains(px, py));
            }
        }
    }
}
