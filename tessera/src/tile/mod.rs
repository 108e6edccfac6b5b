//! Tiled rendering with memoized tiles.
//!
//! Rendering a scene produces pixel tiles on demand. Completed tiles are kept
//! in a [`TileStore`] keyed by grid position, and explicit invalidation lets
//! a caller force recomputation of a sub-region without discarding the rest.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   CachingTileNode    │ warm(), invalidate_region()
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐      ┌─────────────────────┐
//! │   TiledRenderNode    │─────►│  TileStore (trait)  │
//! │  geometry + stats    │      └──────────┬──────────┘
//! └──────────┬───────────┘            ┌────┴─────┐
//!            │                        ▼          ▼
//!            ▼                 LocalTileStore  SharedTileStore ──► SharedTileCache
//! ┌──────────────────────┐
//! │ TileCompute (trait)  │ ◄── SourceCopy<S: TileSource>
//! └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tessera::cache::SharedTileCache;
//! use tessera::geom::PixelRect;
//! use tessera::tile::{CachingTileNode, PixmapSource, SharedTileStore};
//!
//! let pixmap = tiny_skia::Pixmap::new(300, 200).unwrap();
//! let cache = Arc::new(SharedTileCache::with_capacity(64 * 1024 * 1024));
//! let node = CachingTileNode::with_tile_size(
//!     PixmapSource::new(pixmap),
//!     128,
//!     128,
//!     Box::new(SharedTileStore::new(cache)),
//! )
//! .unwrap();
//!
//! node.warm().unwrap();
//! let cleared = node.invalidate_region(&PixelRect::new(0, 0, 10, 10));
//! assert_eq!(cleared, 1);
//! ```

mod buffer;
mod caching;
mod compute;
mod coord;
mod error;
mod geometry;
mod node;
mod source;
mod stats;
mod store;

pub use buffer::{PixelLayout, Tile};
pub use caching::CachingTileNode;
pub use compute::{SourceCopy, TileCompute};
pub use coord::TileCoord;
pub use error::TileError;
pub use geometry::{TileGridGeometry, DEFAULT_TILE_SIZE};
pub use node::TiledRenderNode;
pub use source::{ImageSource, PixmapSource, TileSource};
pub use stats::{TileStats, TileStatsSnapshot};
pub use store::{LocalTileStore, SharedTileStore, TileStore};
