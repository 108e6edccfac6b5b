//! Caching tile node: warm a source into the tile store and invalidate
//! regions of it.
//!
//! A [`CachingTileNode`] exists only to put its source's tiles into a
//! (typically shared) store. Every tile is a straight copy of the source.
//! When part of the source document changes, [`CachingTileNode::invalidate_region`]
//! clears exactly the tiles overlapping the changed rectangle; they are
//! recomputed lazily on their next request.

use std::sync::Arc;

use tracing::debug;

use crate::geom::PixelRect;
use crate::tile::buffer::{PixelLayout, Tile};
use crate::tile::compute::SourceCopy;
use crate::tile::coord::TileCoord;
use crate::tile::error::TileError;
use crate::tile::geometry::TileGridGeometry;
use crate::tile::node::TiledRenderNode;
use crate::tile::source::TileSource;
use crate::tile::stats::TileStats;
use crate::tile::store::TileStore;

/// Tiled node that mirrors its source into the tile store.
pub struct CachingTileNode<S> {
    node: TiledRenderNode<SourceCopy<S>>,
}

impl<S: TileSource> CachingTileNode<S> {
    /// Cache `source` using its preferred tile size.
    ///
    /// # Errors
    ///
    /// Returns `TileError::EmptyBounds` if the source covers no pixels.
    pub fn new(source: S, store: Box<dyn TileStore>) -> Result<Self, TileError> {
        Ok(Self {
            node: TiledRenderNode::new(SourceCopy::new(source), store)?,
        })
    }

    /// Cache `source` with an explicit tile size, clamped to the source bounds.
    ///
    /// # Errors
    ///
    /// Returns `TileError::EmptyBounds` if the source covers no pixels.
    pub fn with_tile_size(
        source: S,
        tile_width: u32,
        tile_height: u32,
        store: Box<dyn TileStore>,
    ) -> Result<Self, TileError> {
        Ok(Self {
            node: TiledRenderNode::with_tile_size(
                SourceCopy::new(source),
                tile_width,
                tile_height,
                store,
            )?,
        })
    }

    /// The upstream source.
    pub fn source(&self) -> &S {
        self.node.compute().source()
    }

    /// The underlying tiled node.
    pub fn node(&self) -> &TiledRenderNode<SourceCopy<S>> {
        &self.node
    }

    pub fn geometry(&self) -> &TileGridGeometry {
        self.node.geometry()
    }

    pub fn stats(&self) -> &TileStats {
        self.node.stats()
    }

    /// Fetch a tile, copying it from the source on a miss.
    ///
    /// # Errors
    ///
    /// See [`TiledRenderNode::get_tile`].
    pub fn get_tile(&self, x: i32, y: i32) -> Result<Arc<Tile>, TileError> {
        self.node.get_tile(x, y)
    }

    /// True when the store currently holds the tile.
    pub fn is_cached(&self, x: i32, y: i32) -> bool {
        self.node.is_cached(x, y)
    }

    /// Materialize every tile of the source into the store, row-major.
    ///
    /// Returns the number of tiles that had to be computed.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while copying a tile.
    pub fn warm(&self) -> Result<u64, TileError> {
        let before = self.node.stats().computes();
        for coord in self.node.geometry().coords() {
            self.node.get_tile(coord.x, coord.y)?;
        }
        let computed = self.node.stats().computes() - before;
        debug!(
            tiles = self.node.geometry().tile_count(),
            computed, "Warmed tile cache"
        );
        Ok(computed)
    }

    /// Clear every tile overlapping `rect`.
    ///
    /// The rectangle is converted to an inclusive tile index range
    /// (`floor((coord - origin) / tile_size)`) and clamped to the grid. A
    /// rectangle that straddles the grid edge is clipped; one entirely
    /// outside is a no-op. Nothing is recomputed here.
    ///
    /// Returns the number of tile slots cleared.
    pub fn invalidate_region(&self, rect: &PixelRect) -> usize {
        let geometry = self.node.geometry();
        let Some((tx0, tx1, ty0, ty1)) = geometry.tile_range(rect) else {
            debug!(%rect, "Invalidation outside tile grid ignored");
            return 0;
        };

        let store = self.node.store();
        let mut cleared = 0;
        for coord in TileCoord::row_major(tx0, tx1, ty0, ty1) {
            store.set(coord, None);
            cleared += 1;
        }
        self.node.stats().tiles_invalidated(cleared as u64);
        debug!(%rect, tx0, tx1, ty0, ty1, cleared, "Invalidated tile region");
        cleared
    }

    /// Clear every tile of the grid.
    pub fn invalidate_all(&self) -> usize {
        self.invalidate_region(&self.node.geometry().bounds())
    }
}

impl<S: TileSource> TileSource for CachingTileNode<S> {
    fn bounds(&self) -> PixelRect {
        self.node.bounds()
    }

    fn tile_grid_offset(&self) -> (i32, i32) {
        self.node.tile_grid_offset()
    }

    fn layout(&self) -> PixelLayout {
        self.node.layout()
    }

    fn tile_size(&self) -> (u32, u32) {
        self.node.tile_size()
    }

    fn copy_into(&self, dest: &mut Tile) -> Result<(), TileError> {
        self.node.copy_data(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::source::ImageSource;
    use crate::tile::store::LocalTileStore;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn caching_node(width: u32, height: u32, tile: u32) -> CachingTileNode<ImageSource> {
        let img = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        CachingTileNode::with_tile_size(
            ImageSource::new(DynamicImage::ImageRgba8(img)),
            tile,
            tile,
            Box::new(LocalTileStore::new()),
        )
        .unwrap()
    }

    fn cached_coords(node: &CachingTileNode<ImageSource>) -> Vec<TileCoord> {
        node.geometry()
            .coords()
            .filter(|c| node.is_cached(c.x, c.y))
            .collect()
    }

    #[test]
    fn test_warm_materializes_every_tile() {
        let node = caching_node(100, 60, 32);

        let computed = node.warm().unwrap();

        assert_eq!(computed, 8);
        assert_eq!(cached_coords(&node).len(), 8);
        // A second warm pass is free
        assert_eq!(node.warm().unwrap(), 0);
    }

    #[test]
    fn test_tiles_are_full_copies_of_source() {
        let node = caching_node(100, 60, 32);
        let tile = node.get_tile(1, 1).unwrap();
        assert_eq!(tile.pixel(40, 33), Some(&[40u8, 33, 7, 255][..]));
    }

    #[test]
    fn test_invalidate_clears_only_overlapping_tiles() {
        let node = caching_node(128, 128, 32);
        node.warm().unwrap();

        // Pixels 40..70 × 10..20 touch tile columns 1..=2, row 0
        let cleared = node.invalidate_region(&PixelRect::new(40, 10, 30, 10));

        assert_eq!(cleared, 2);
        assert!(!node.is_cached(1, 0));
        assert!(!node.is_cached(2, 0));
        assert!(node.is_cached(0, 0));
        assert!(node.is_cached(3, 0));
        assert!(node.is_cached(1, 1));
        assert_eq!(cached_coords(&node).len(), 14);
    }

    #[test]
    fn test_invalidate_does_not_recompute() {
        let node = caching_node(64, 64, 32);
        node.warm().unwrap();
        let before = node.stats().computes();

        node.invalidate_region(&PixelRect::new(0, 0, 64, 64));

        assert_eq!(node.stats().computes(), before);
        node.get_tile(0, 0).unwrap();
        assert_eq!(node.stats().computes(), before + 1);
    }

    #[test]
    fn test_invalidate_straddling_rect_is_clipped() {
        let node = caching_node(64, 64, 32);
        node.warm().unwrap();

        let cleared = node.invalidate_region(&PixelRect::new(-500, -500, 520, 520));

        assert_eq!(cleared, 1);
        assert!(!node.is_cached(0, 0));
        assert!(node.is_cached(1, 1));
    }

    #[test]
    fn test_invalidate_outside_grid_is_noop() {
        let node = caching_node(64, 64, 32);
        node.warm().unwrap();

        assert_eq!(node.invalidate_region(&PixelRect::new(200, 200, 10, 10)), 0);
        assert_eq!(node.invalidate_region(&PixelRect::new(-20, 0, 10, 64)), 0);
        assert_eq!(node.invalidate_region(&PixelRect::new(10, 10, 0, 0)), 0);
        assert_eq!(cached_coords(&node).len(), 4);
        assert_eq!(node.stats().snapshot().invalidated, 0);
    }

    #[test]
    fn test_invalidate_all() {
        let node = caching_node(64, 64, 32);
        node.warm().unwrap();
        assert_eq!(node.invalidate_all(), 4);
        assert!(cached_coords(&node).is_empty());
    }

    #[test]
    fn test_caching_node_is_a_source() {
        let node = caching_node(64, 64, 32);
        let mut dest = Tile::new(PixelRect::new(30, 30, 4, 4), PixelLayout::Rgba8);
        node.copy_into(&mut dest).unwrap();
        assert_eq!(dest.pixel(33, 31), Some(&[33u8, 31, 7, 255][..]));
    }
}
