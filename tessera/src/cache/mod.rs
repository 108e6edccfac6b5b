//! Shared tile cache.
//!
//! Tiled nodes keep their tiles in a [`TileStore`](crate::tile::TileStore).
//! A store may be private to its node or a window into one
//! [`SharedTileCache`] that many nodes share under a single memory budget.
//!
//! ```text
//! TiledRenderNode ──► SharedTileStore ──┐
//! TiledRenderNode ──► SharedTileStore ──┼──► Arc<dyn TileCache> (moka, bytes-weighted)
//! TiledRenderNode ──► SharedTileStore ──┘
//! ```

mod shared;
mod traits;

pub use shared::SharedTileCache;
pub use traits::{
    EvictionPolicy, GcResult, StoreId, TileCache, TileKey, DEFAULT_SHARED_CACHE_BYTES,
};
