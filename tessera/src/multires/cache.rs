//! Sub-tree caches for multi-resolution nodes.
//!
//! Built sub-trees are held under a replaceable retention policy:
//!
//! - [`WeakSubTreeCache`] keeps only weak references. A sub-tree lives as
//!   long as some painter holds it, and is rebuilt after the last strong
//!   reference is dropped.
//! - [`BoundedSubTreeCache`] keeps strong references in a `moka` cache with
//!   a capacity bound and optional time-to-live, approximating soft
//!   references with an explicit eviction policy.
//!
//! Only successful builds are ever stored.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use std::time::Duration;

use moka::sync::Cache;
use parking_lot::Mutex;

use crate::multires::scene::SceneNode;

/// Default capacity of a bounded sub-tree cache.
pub const DEFAULT_SUBTREE_CAPACITY: u64 = 16;

/// Retention policy for built sub-trees, keyed by candidate index.
pub trait SubTreeCache: Send + Sync {
    /// The cached sub-tree for `index`, if still retained.
    fn get(&self, index: usize) -> Option<Arc<SceneNode>>;

    /// Remember a successfully built sub-tree.
    fn put(&self, index: usize, node: &Arc<SceneNode>);

    /// Forget the sub-tree for `index`.
    fn evict(&self, index: usize);

    /// Forget every sub-tree.
    fn clear(&self);

    /// Number of sub-trees currently retrievable.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Weak-reference retention.
#[derive(Debug, Default)]
pub struct WeakSubTreeCache {
    slots: Mutex<HashMap<usize, Weak<SceneNode>>>,
}

impl WeakSubTreeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubTreeCache for WeakSubTreeCache {
    fn get(&self, index: usize) -> Option<Arc<SceneNode>> {
        let mut slots = self.slots.lock();
        let node = slots.get(&index).and_then(Weak::upgrade);
        if node.is_none() {
            slots.remove(&index);
        }
        node
    }

    fn put(&self, index: usize, node: &Arc<SceneNode>) {
        self.slots.lock().insert(index, Arc::downgrade(node));
    }

    fn evict(&self, index: usize) {
        self.slots.lock().remove(&index);
    }

    fn clear(&self) {
        self.slots.lock().clear();
    }

    fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// Strong retention bounded by entry count and optional TTL.
pub struct BoundedSubTreeCache {
    cache: Cache<usize, Arc<SceneNode>>,
    capacity: u64,
}

impl BoundedSubTreeCache {
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            cache: builder.build(),
            capacity,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl Default for BoundedSubTreeCache {
    fn default() -> Self {
        Self::new(DEFAULT_SUBTREE_CAPACITY, None)
    }
}

impl fmt::Debug for BoundedSubTreeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedSubTreeCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl SubTreeCache for BoundedSubTreeCache {
    fn get(&self, index: usize) -> Option<Arc<SceneNode>> {
        self.cache.get(&index)
    }

    fn put(&self, index: usize, node: &Arc<SceneNode>) {
        self.cache.insert(index, Arc::clone(node));
    }

    fn evict(&self, index: usize) {
        self.cache.invalidate(&index);
    }

    fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    fn len(&self) -> usize {
        self.cache.run_pending_tasks();
        self.cache.entry_count() as usize
    }
}

/// Which sub-tree cache a node is built with.
///
/// The default is a bounded cache, so a sub-tree survives between paints
/// even when no caller holds on to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Weak,
    Bounded {
        capacity: u64,
        ttl: Option<Duration>,
    },
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Bounded {
            capacity: DEFAULT_SUBTREE_CAPACITY,
            ttl: None,
        }
    }
}

impl CachePolicy {
    /// Instantiate a fresh cache for this policy.
    pub fn build(&self) -> Box<dyn SubTreeCache> {
        match *self {
            CachePolicy::Weak => Box::new(WeakSubTreeCache::new()),
            CachePolicy::Bounded { capacity, ttl } => {
                Box::new(BoundedSubTreeCache::new(capacity, ttl))
            }
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePolicy::Weak => write!(f, "weak"),
            CachePolicy::Bounded { capacity, ttl: None } => write!(f, "bounded({})", capacity),
            CachePolicy::Bounded {
                capacity,
                ttl: Some(ttl),
            } => write!(f, "bounded({}, ttl {}s)", capacity, ttl.as_secs()),
        }
    }
}

impl FromStr for CachePolicy {
    type Err = String;

    /// Parse the policy name; `bounded` starts with default capacity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weak" => Ok(CachePolicy::Weak),
            "bounded" => Ok(CachePolicy::default()),
            other => Err(format!("unknown cache policy '{}'", other)),
        }
    }
}
