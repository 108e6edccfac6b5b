//! The tile computation capability.
//!
//! A tiled node owns the grid and the store; what it does not know is how to
//! produce pixels for one tile. That single primitive lives behind
//! [`TileCompute`], implemented once per kind of tiled node.
//!
//! # Implementors
//!
//! - [`SourceCopy`] - Full-tile copy from an upstream [`TileSource`], used by
//!   [`CachingTileNode`](crate::tile::CachingTileNode)

use crate::geom::PixelRect;
use crate::tile::buffer::{PixelLayout, Tile};
use crate::tile::error::TileError;
use crate::tile::source::TileSource;

/// Capability to render one tile region.
///
/// Implementations must be thread-safe (`Send + Sync`) and must tolerate
/// being asked for the same tile more than once: concurrent callers may race
/// to fill the same absent slot.
pub trait TileCompute: Send + Sync {
    /// Pixel bounds the computation covers.
    fn bounds(&self) -> PixelRect;

    /// Pixel position of tile `(0, 0)`.
    fn tile_grid_offset(&self) -> (i32, i32);

    /// Sample layout of produced tiles.
    fn layout(&self) -> PixelLayout;

    /// Preferred tile size when none is chosen by the caller.
    fn tile_size(&self) -> (u32, u32);

    /// Render pixels for `tile.rect()` into `tile`.
    ///
    /// # Errors
    ///
    /// Returns `TileError` if the upstream cannot fill the buffer.
    fn compute_tile(&self, tile: &mut Tile) -> Result<(), TileError>;
}

/// Computes tiles by copying them wholesale from an upstream source.
///
/// No partial or incremental recomputation: every call is a full tile copy.
#[derive(Debug, Clone)]
pub struct SourceCopy<S> {
    source: S,
}

impl<S: TileSource> SourceCopy<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The upstream source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: TileSource> TileCompute for SourceCopy<S> {
    fn bounds(&self) -> PixelRect {
        self.source.bounds()
    }

    fn tile_grid_offset(&self) -> (i32, i32) {
        self.source.tile_grid_offset()
    }

    fn layout(&self) -> PixelLayout {
        self.source.layout()
    }

    fn tile_size(&self) -> (u32, u32) {
        self.source.tile_size()
    }

    fn compute_tile(&self, tile: &mut Tile) -> Result<(), TileError> {
        self.source.copy_into(tile)
    }
}
