//! Error types for tile grid operations.

use thiserror::Error;

use crate::tile::buffer::PixelLayout;

/// Errors that can occur while constructing or querying a tiled node.
#[derive(Debug, Error)]
pub enum TileError {
    /// A tile index outside the node's grid was requested.
    ///
    /// This is a caller contract violation; the node never recovers from it.
    #[error(
        "Tile ({x}, {y}) outside grid: x in [{min_x}, {}), y in [{min_y}, {})",
        .min_x + .num_x,
        .min_y + .num_y
    )]
    OutOfGrid {
        x: i32,
        y: i32,
        min_x: i32,
        min_y: i32,
        num_x: i32,
        num_y: i32,
    },

    /// The upstream source has no pixels to tile.
    #[error("Source bounds are empty: {width}×{height}")]
    EmptyBounds { width: i32, height: i32 },

    /// A buffer with a different sample layout was handed to a source.
    #[error("Pixel layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: PixelLayout,
        actual: PixelLayout,
    },

    /// Decoding an image for a tile source failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
