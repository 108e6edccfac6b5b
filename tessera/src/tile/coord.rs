//! Tile grid coordinates.

use std::fmt;

/// Integer index of one cell in a tile grid.
///
/// Coordinates are unique per store. Storage implies no ordering; bulk
/// operations iterate row-major (see [`TileCoord::row_major`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    /// Create a coordinate from grid indices.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Iterate the inclusive index range `[x0, x1] × [y0, y1]` row by row.
    ///
    /// Yields nothing when either range is empty.
    pub fn row_major(x0: i32, x1: i32, y0: i32, y1: i32) -> impl Iterator<Item = TileCoord> {
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| TileCoord { x, y }))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
