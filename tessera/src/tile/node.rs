//! Tiled render node: lazy, memoized tile production.
//!
//! A [`TiledRenderNode`] presents a rectangular renderable region as a grid
//! of independently cacheable tiles. A tile is computed the first time it is
//! requested and served from the node's [`TileStore`] afterwards, until the
//! store loses it (explicit invalidation or eviction by a shared cache).
//!
//! ```text
//! get_tile(x, y) ──► store.get ──hit──► Arc<Tile>
//!                        │
//!                       miss
//!                        ▼
//!               allocate Tile(rect) ──► compute_tile ──► store.set ──► Arc<Tile>
//! ```

use std::sync::Arc;

use tracing::trace;

use crate::geom::PixelRect;
use crate::tile::buffer::{PixelLayout, Tile};
use crate::tile::compute::TileCompute;
use crate::tile::coord::TileCoord;
use crate::tile::error::TileError;
use crate::tile::geometry::TileGridGeometry;
use crate::tile::source::TileSource;
use crate::tile::stats::TileStats;
use crate::tile::store::TileStore;

/// Renderable region divided into a fixed-size grid of lazily computed tiles.
pub struct TiledRenderNode<C> {
    /// How pixels for one tile are produced.
    compute: C,

    /// Grid layout derived from the computation's bounds.
    geometry: TileGridGeometry,

    /// Tile memo, exclusively owned by this node.
    store: Box<dyn TileStore>,

    /// Compute/hit/miss counters.
    stats: TileStats,
}

impl<C: TileCompute> TiledRenderNode<C> {
    /// Create a node using the computation's preferred tile size.
    ///
    /// # Errors
    ///
    /// Returns `TileError::EmptyBounds` if the upstream covers no pixels.
    pub fn new(compute: C, store: Box<dyn TileStore>) -> Result<Self, TileError> {
        let (tile_width, tile_height) = compute.tile_size();
        Self::with_tile_size(compute, tile_width, tile_height, store)
    }

    /// Create a node with an explicit tile size.
    ///
    /// A tile size larger than the bounds is clamped down to the bounds.
    ///
    /// # Errors
    ///
    /// Returns `TileError::EmptyBounds` if the upstream covers no pixels.
    pub fn with_tile_size(
        compute: C,
        tile_width: u32,
        tile_height: u32,
        store: Box<dyn TileStore>,
    ) -> Result<Self, TileError> {
        let geometry = TileGridGeometry::new(
            compute.bounds(),
            compute.tile_grid_offset(),
            tile_width,
            tile_height,
        )?;
        Ok(Self {
            compute,
            geometry,
            store,
            stats: TileStats::new(),
        })
    }

    /// Grid geometry of this node.
    pub fn geometry(&self) -> &TileGridGeometry {
        &self.geometry
    }

    /// The node's tile store.
    pub fn store(&self) -> &dyn TileStore {
        self.store.as_ref()
    }

    /// Instrumentation counters.
    pub fn stats(&self) -> &TileStats {
        &self.stats
    }

    /// The tile computation.
    pub fn compute(&self) -> &C {
        &self.compute
    }

    /// Clipped pixel footprint of a tile.
    pub fn tile_rect(&self, coord: TileCoord) -> PixelRect {
        self.geometry.tile_rect(coord)
    }

    /// True when the store currently holds the tile; never computes.
    pub fn is_cached(&self, x: i32, y: i32) -> bool {
        self.store.get(TileCoord::new(x, y)).is_some()
    }

    /// Fetch a tile, computing and storing it on a miss.
    ///
    /// This is the only tile-production path. Calling it redundantly is safe:
    /// a racing caller at worst computes the same tile twice and the last
    /// write wins.
    ///
    /// # Errors
    ///
    /// - `TileError::OutOfGrid` if `(x, y)` lies outside the grid
    /// - any error from the tile computation
    pub fn get_tile(&self, x: i32, y: i32) -> Result<Arc<Tile>, TileError> {
        let coord = TileCoord::new(x, y);
        self.geometry.check(coord)?;

        if let Some(tile) = self.store.get(coord) {
            self.stats.tile_hit();
            trace!(x, y, "Tile hit");
            return Ok(tile);
        }

        self.stats.tile_miss();
        let mut tile = Tile::new(self.geometry.tile_rect(coord), self.compute.layout());
        self.compute.compute_tile(&mut tile)?;
        self.stats.tile_computed();
        trace!(x, y, rect = %tile.rect(), "Tile computed");

        let tile = Arc::new(tile);
        // Fire-and-forget: a shared cache may evict this before the next get.
        self.store.set(coord, Some(Arc::clone(&tile)));
        Ok(tile)
    }

    /// Tiles whose footprint intersects `rect`, row-major.
    pub fn tiles_for_region(&self, rect: &PixelRect) -> Vec<TileCoord> {
        self.geometry
            .coords_in(rect)
            .into_iter()
            .filter(|coord| self.geometry.tile_rect(*coord).intersects(rect))
            .collect()
    }

    /// Assemble `dest.rect()` from this node's tiles.
    ///
    /// Missing tiles are computed on the way. Pixels outside the node's
    /// bounds are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `TileError::LayoutMismatch` if `dest` uses another layout, or
    /// any error from computing a missing tile.
    pub fn copy_data(&self, dest: &mut Tile) -> Result<(), TileError> {
        let layout = self.compute.layout();
        if dest.layout() != layout {
            return Err(TileError::LayoutMismatch {
                expected: layout,
                actual: dest.layout(),
            });
        }
        for coord in self.tiles_for_region(&dest.rect()) {
            let tile = self.get_tile(coord.x, coord.y)?;
            tile.copy_overlap_into(dest);
        }
        Ok(())
    }
}

/// A tiled node is itself a source, so tiled nodes chain.
impl<C: TileCompute> TileSource for TiledRenderNode<C> {
    fn bounds(&self) -> PixelRect {
        self.geometry.bounds()
    }

    fn tile_grid_offset(&self) -> (i32, i32) {
        self.geometry.origin()
    }

    fn layout(&self) -> PixelLayout {
        self.compute.layout()
    }

    fn tile_size(&self) -> (u32, u32) {
        (
            self.geometry.tile_width() as u32,
            self.geometry.tile_height() as u32,
        )
    }

    fn copy_into(&self, dest: &mut Tile) -> Result<(), TileError> {
        self.copy_data(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::store::LocalTileStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Gray computation writing `(x + y) % 256` and counting invocations.
    struct CountingCompute {
        bounds: PixelRect,
        calls: AtomicU32,
    }

    impl CountingCompute {
        fn new(width: i32, height: i32) -> Self {
            Self {
                bounds: PixelRect::from_size(width, height),
                calls: AtomicU32::new(0),
            }
        }
    }

    impl TileCompute for CountingCompute {
        fn bounds(&self) -> PixelRect {
            self.bounds
        }

        fn tile_grid_offset(&self) -> (i32, i32) {
            (0, 0)
        }

        fn layout(&self) -> PixelLayout {
            PixelLayout::Gray8
        }

        fn tile_size(&self) -> (u32, u32) {
            (32, 32)
        }

        fn compute_tile(&self, tile: &mut Tile) -> Result<(), TileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rect = tile.rect();
            for row in 0..rect.height {
                for col in 0..rect.width {
                    let idx = (row * rect.width + col) as usize;
                    tile.data_mut()[idx] = ((rect.x + col + rect.y + row) % 256) as u8;
                }
            }
            Ok(())
        }
    }

    fn node(width: i32, height: i32) -> TiledRenderNode<CountingCompute> {
        TiledRenderNode::new(
            CountingCompute::new(width, height),
            Box::new(LocalTileStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_second_get_is_served_from_store() {
        let node = node(100, 100);

        let first = node.get_tile(1, 1).unwrap();
        let second = node.get_tile(1, 1).unwrap();

        assert_eq!(first.data(), second.data());
        assert_eq!(node.compute().calls.load(Ordering::SeqCst), 1);
        assert_eq!(node.stats().computes(), 1);
        let snap = node.stats().snapshot();
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.misses, 1);
    }

    #[test]
    fn test_cleared_tile_is_recomputed() {
        let node = node(100, 100);
        node.get_tile(0, 0).unwrap();

        node.store().set(TileCoord::new(0, 0), None);
        node.get_tile(0, 0).unwrap();

        assert_eq!(node.stats().computes(), 2);
    }

    #[test]
    fn test_edge_tile_is_clipped() {
        let node = node(100, 70);
        let tile = node.get_tile(3, 2).unwrap();
        assert_eq!(tile.rect(), PixelRect::new(96, 64, 4, 6));
        assert_eq!(tile.byte_size(), 24);
    }

    #[test]
    fn test_out_of_grid_fails_fast() {
        let node = node(100, 100);
        assert!(matches!(
            node.get_tile(4, 0),
            Err(TileError::OutOfGrid { x: 4, .. })
        ));
        assert!(node.get_tile(0, -1).is_err());
        assert_eq!(node.stats().computes(), 0);
    }

    #[test]
    fn test_explicit_tile_size_clamped() {
        let node = TiledRenderNode::with_tile_size(
            CountingCompute::new(40, 20),
            1000,
            1000,
            Box::new(LocalTileStore::new()),
        )
        .unwrap();
        assert_eq!(node.geometry().tile_width(), 40);
        assert_eq!(node.geometry().tile_height(), 20);
        assert_eq!(node.geometry().tile_count(), 1);
    }

    #[test]
    fn test_is_cached_does_not_compute() {
        let node = node(64, 64);
        assert!(!node.is_cached(0, 0));
        node.get_tile(0, 0).unwrap();
        assert!(node.is_cached(0, 0));
        assert_eq!(node.stats().computes(), 1);
    }

    #[test]
    fn test_copy_data_spans_tiles() {
        let node = node(100, 100);
        let mut dest = Tile::new(PixelRect::new(30, 30, 4, 4), PixelLayout::Gray8);

        node.copy_data(&mut dest).unwrap();

        // Region straddles four tiles
        assert_eq!(node.stats().computes(), 4);
        assert_eq!(dest.pixel(30, 30), Some(&[60u8][..]));
        assert_eq!(dest.pixel(33, 32), Some(&[65u8][..]));
    }

    #[test]
    fn test_chained_nodes() {
        use crate::tile::compute::SourceCopy;

        let upstream = node(64, 64);
        let downstream = TiledRenderNode::with_tile_size(
            SourceCopy::new(upstream),
            16,
            16,
            Box::new(LocalTileStore::new()),
        )
        .unwrap();

        let tile = downstream.get_tile(1, 1).unwrap();
        assert_eq!(tile.pixel(16, 16), Some(&[32u8][..]));
        assert_eq!(downstream.compute().source().stats().computes(), 1);
    }
}
