//! Tile stores: the per-node map from grid coordinate to cached tile.
//!
//! A store holds at most one tile per coordinate. Absence is the only
//! invalidity signal; there is no "stale" tile. Two implementations:
//!
//! - [`LocalTileStore`] keeps every tile until it is cleared.
//! - [`SharedTileStore`] translates coordinates into keys of a shared
//!   [`TileCache`] whose eviction policy may drop tiles at any time.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::cache::{StoreId, TileCache, TileKey};
use crate::tile::buffer::Tile;
use crate::tile::coord::TileCoord;

/// Map from tile coordinate to an optional cached tile.
///
/// Operations are idempotent and carry no ordering guarantee across
/// coordinates. Callers must not assume a tile that was just `set` is still
/// present on the next `get`.
pub trait TileStore: Send + Sync {
    /// Look up the tile at `coord`.
    fn get(&self, coord: TileCoord) -> Option<Arc<Tile>>;

    /// Store a tile at `coord`, or clear the slot with `None`.
    fn set(&self, coord: TileCoord, tile: Option<Arc<Tile>>);
}

/// Store that keeps tiles until they are explicitly cleared.
#[derive(Debug, Default)]
pub struct LocalTileStore {
    tiles: DashMap<TileCoord, Arc<Tile>>,
}

impl LocalTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of present tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl TileStore for LocalTileStore {
    fn get(&self, coord: TileCoord) -> Option<Arc<Tile>> {
        self.tiles.get(&coord).map(|entry| Arc::clone(entry.value()))
    }

    fn set(&self, coord: TileCoord, tile: Option<Arc<Tile>>) {
        match tile {
            Some(tile) => {
                self.tiles.insert(coord, tile);
            }
            None => {
                self.tiles.remove(&coord);
            }
        }
    }
}

/// Store backed by a shared tile cache.
///
/// Translates `TileCoord` into `(store id, coord)` keys. Writes are
/// fire-and-forget: the cache's own eviction policy decides how long a tile
/// survives. Dropping the store purges its tiles from the cache.
pub struct SharedTileStore {
    /// The underlying shared cache.
    cache: Arc<dyn TileCache>,

    /// This store's partition of the cache.
    id: StoreId,
}

impl SharedTileStore {
    /// Create a store with a fresh partition of `cache`.
    ///
    /// # Arguments
    ///
    /// * `cache` - The shared cache to back this store
    pub fn new(cache: Arc<dyn TileCache>) -> Self {
        let id = cache.register_store();
        Self { cache, id }
    }

    /// This store's id within the shared cache.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The shared cache behind this store.
    pub fn cache(&self) -> &Arc<dyn TileCache> {
        &self.cache
    }

    fn key(&self, coord: TileCoord) -> TileKey {
        TileKey::new(self.id, coord)
    }
}

impl TileStore for SharedTileStore {
    fn get(&self, coord: TileCoord) -> Option<Arc<Tile>> {
        self.cache.get(&self.key(coord))
    }

    fn set(&self, coord: TileCoord, tile: Option<Arc<Tile>>) {
        let key = self.key(coord);
        match tile {
            Some(tile) => self.cache.insert(key, tile),
            None => {
                trace!(%key, "Clearing shared tile");
                self.cache.remove(&key);
            }
        }
    }
}

impl Drop for SharedTileStore {
    fn drop(&mut self) {
        self.cache.purge_store(self.id);
    }
}
