//! Tile cache instrumentation.
//!
//! Lock-free counters updated on the tile production path, plus a
//! point-in-time snapshot for display.
//!
//! ```text
//! get_tile ─────► TileStats ─────► TileStatsSnapshot ─────► Views
//!                 (atomic counters)  (point-in-time copy)    (CLI, tests)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one tiled node.
#[derive(Debug, Default)]
pub struct TileStats {
    computes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidated: AtomicU64,
}

impl TileStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation of the tile computation.
    pub fn tile_computed(&self) {
        self.computes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup answered by the store.
    pub fn tile_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup that found the slot absent.
    pub fn tile_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record tiles cleared by a region invalidation.
    pub fn tiles_invalidated(&self, count: u64) {
        self.invalidated.fetch_add(count, Ordering::Relaxed);
    }

    /// Number of `compute_tile` invocations so far.
    pub fn computes(&self) -> u64 {
        self.computes.load(Ordering::Relaxed)
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> TileStatsSnapshot {
        TileStatsSnapshot {
            computes: self.computes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`TileStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TileStatsSnapshot {
    pub computes: u64,
    pub hits: u64,
    pub misses: u64,
    pub invalidated: u64,
}

impl TileStatsSnapshot {
    /// Fraction of lookups served from the store, 0.0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for TileStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "computed {} tiles, {} hits / {} misses ({:.1}% hit rate), {} invalidated",
            self.computes,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.invalidated
        )
    }
}
