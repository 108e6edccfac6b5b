//! Core traits for the shared tile cache.
//!
//! Many tiled nodes can back their tile stores with one process-wide cache.
//! The cache owns its eviction policy; nodes only ever see hits and misses.
//!
//! # Design Principles
//!
//! - **Composite keys**: `(store id, tile coordinate)` keeps nodes apart
//! - **Shared tiles**: values are `Arc<Tile>`, cloned out cheaply on a hit
//! - **Self-contained eviction**: providers evict on their own schedule; a
//!   tile that was just inserted may already be gone
//! - **Dyn-compatible**: stores hold `Arc<dyn TileCache>`

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::tile::Tile;
use crate::tile::TileCoord;

/// Default shared cache budget: 256 MiB of tile data.
pub const DEFAULT_SHARED_CACHE_BYTES: u64 = 256 * 1024 * 1024;

/// Identifier of one store inside a shared cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(pub u64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

/// Key of one tile in a shared cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub store: StoreId,
    pub coord: TileCoord,
}

impl TileKey {
    pub fn new(store: StoreId, coord: TileCoord) -> Self {
        Self { store, coord }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile:{}:{}:{}", self.store.0, self.coord.x, self.coord.y)
    }
}

/// Eviction policy of a shared cache.
///
/// Capacity is always enforced; time-based expiry is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Maximum total size of cached tile data in bytes.
    pub max_bytes: u64,
    /// Evict entries this long after insertion.
    pub ttl: Option<Duration>,
    /// Evict entries not read for this long.
    pub idle: Option<Duration>,
}

impl EvictionPolicy {
    /// Capacity-only policy.
    pub fn capacity(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ttl: None,
            idle: None,
        }
    }

    /// Add a time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Add a time-to-idle.
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = Some(idle);
        self
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::capacity(DEFAULT_SHARED_CACHE_BYTES)
    }
}

/// Result of a garbage collection pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GcResult {
    /// Number of entries removed during GC.
    pub entries_removed: usize,
    /// Total bytes freed during GC.
    pub bytes_freed: u64,
    /// Duration of the GC operation in milliseconds.
    pub duration_ms: u64,
}

impl fmt::Display for GcResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GC: removed {} entries, freed {} bytes in {}ms",
            self.entries_removed, self.bytes_freed, self.duration_ms
        )
    }
}

/// Tile cache shared between stores.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; stores on different rendering
/// threads talk to the same cache.
pub trait TileCache: Send + Sync {
    /// Hand out a fresh store id.
    fn register_store(&self) -> StoreId;

    /// Store a tile. Eviction may occur immediately, including of this tile.
    fn insert(&self, key: TileKey, tile: Arc<Tile>);

    /// Look up a tile.
    fn get(&self, key: &TileKey) -> Option<Arc<Tile>>;

    /// Remove a tile. Removing an absent key is a no-op.
    fn remove(&self, key: &TileKey);

    /// Drop every tile belonging to `store`.
    fn purge_store(&self, store: StoreId);

    /// Current weighted size in bytes.
    fn size_bytes(&self) -> u64;

    /// Current number of entries.
    fn entry_count(&self) -> u64;

    /// Configured maximum size in bytes.
    fn max_size_bytes(&self) -> u64;

    /// Run pending maintenance and report what was reclaimed.
    fn gc(&self) -> GcResult;
}
