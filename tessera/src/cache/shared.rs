//! Process-wide tile cache using moka.
//!
//! This provider wraps `moka::sync::Cache` to give tiled nodes a shared,
//! memory-bounded store with automatic eviction.
//!
//! # Why moka?
//!
//! - Lock-free reads (common case)
//! - Concurrent writes without blocking
//! - Weighted capacity, so the budget is in bytes rather than tiles
//! - Optional time-to-live / time-to-idle expiry
//!
//! # Eviction
//!
//! Moka evicts on its own schedule. A store must never assume a tile it just
//! inserted is still resident; a miss simply means "compute it again".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use moka::sync::Cache as MokaCache;
use tracing::{debug, warn};

use crate::cache::traits::{EvictionPolicy, GcResult, StoreId, TileCache, TileKey};
use crate::tile::Tile;

/// Shared tile cache provider using moka.
pub struct SharedTileCache {
    /// The underlying moka cache.
    cache: MokaCache<TileKey, Arc<Tile>>,

    /// Policy the cache was built with.
    policy: EvictionPolicy,

    /// Next store id to hand out.
    next_store: AtomicU64,
}

impl SharedTileCache {
    /// Create a shared cache with the given eviction policy.
    pub fn new(policy: EvictionPolicy) -> Self {
        let mut builder = MokaCache::builder()
            // Weight each entry by its pixel data size
            .weigher(|_key: &TileKey, tile: &Arc<Tile>| -> u32 {
                // moka uses u32 for weights, cap at u32::MAX for very large tiles
                tile.byte_size().min(u32::MAX as usize) as u32
            })
            .max_capacity(policy.max_bytes)
            // Needed for purge_store
            .support_invalidation_closures();

        if let Some(ttl) = policy.ttl {
            builder = builder.time_to_live(ttl);
        }
        if let Some(idle) = policy.idle {
            builder = builder.time_to_idle(idle);
        }

        Self {
            cache: builder.build(),
            policy,
            next_store: AtomicU64::new(1),
        }
    }

    /// Create a shared cache with a capacity-only policy.
    pub fn with_capacity(max_bytes: u64) -> Self {
        Self::new(EvictionPolicy::capacity(max_bytes))
    }

    /// The eviction policy in effect.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }
}

impl Default for SharedTileCache {
    fn default() -> Self {
        Self::new(EvictionPolicy::default())
    }
}

impl TileCache for SharedTileCache {
    fn register_store(&self) -> StoreId {
        StoreId(self.next_store.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, key: TileKey, tile: Arc<Tile>) {
        self.cache.insert(key, tile);
    }

    fn get(&self, key: &TileKey) -> Option<Arc<Tile>> {
        self.cache.get(key)
    }

    fn remove(&self, key: &TileKey) {
        self.cache.invalidate(key);
    }

    fn purge_store(&self, store: StoreId) {
        match self
            .cache
            .invalidate_entries_if(move |key, _tile| key.store == store)
        {
            Ok(_) => debug!(%store, "Purged store from shared tile cache"),
            Err(e) => warn!(%store, error = %e, "Failed to purge store from shared tile cache"),
        }
    }

    fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    fn max_size_bytes(&self) -> u64 {
        self.policy.max_bytes
    }

    fn gc(&self) -> GcResult {
        let start = Instant::now();
        let size_before = self.cache.weighted_size();
        let count_before = self.cache.entry_count();

        // Run pending maintenance tasks (eviction, invalidation closures, etc.)
        self.cache.run_pending_tasks();

        let size_after = self.cache.weighted_size();
        let count_after = self.cache.entry_count();

        GcResult {
            entries_removed: count_before.saturating_sub(count_after) as usize,
            bytes_freed: size_before.saturating_sub(size_after),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}
