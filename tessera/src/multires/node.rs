//! The multi-resolution image node.
//!
//! Holds an ordered list of [`Candidate`] renditions. Each paint selects the
//! candidate that best fits the current horizontal scale, builds its
//! sub-tree on first use (vector interpretation first, raster second), and
//! keeps successful builds in a [`SubTreeCache`].
//!
//! ```text
//! primitive_paint(transform)
//!        │
//!        ▼
//!  select(transform) ──► index ──► cache.get(index) ──hit──► paint
//!                                        │miss
//!                                        ▼
//!                                 loader.load(locator)
//!                                        │bytes
//!                                        ▼
//!                        vector ──fail──► raster ──fail──► paint nothing
//!                           │ok              │ok
//!                           └──────┬─────────┘
//!                                  ▼
//!                      viewport ─► cache.put ─► paint
//! ```
//!
//! Failures never escape the node: they are logged, counted, and retried on
//! the next paint because failed builds are not cached.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tiny_skia::{PixmapMut, Transform};
use tracing::{debug, trace};
use url::Url;

use crate::geom::ViewRect;
use crate::multires::cache::{CachePolicy, SubTreeCache};
use crate::multires::candidate::Candidate;
use crate::multires::error::InterpretError;
use crate::multires::interpret::{default_interpreters, ContentInterpreter, InterpretationKind};
use crate::multires::loader::ResourceLoader;
use crate::multires::scene::SceneNode;
use crate::multires::select;
use crate::multires::viewport::ViewportSpec;

/// Counters for one multi-resolution node.
#[derive(Debug, Default)]
pub struct MultiResStats {
    vector_builds: AtomicU64,
    raster_builds: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
}

impl MultiResStats {
    fn built(&self, kind: InterpretationKind) {
        let counter = match kind {
            InterpretationKind::Vector => &self.vector_builds,
            InterpretationKind::Raster => &self.raster_builds,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful builds of either kind.
    pub fn builds(&self) -> u64 {
        self.vector_builds.load(Ordering::Relaxed) + self.raster_builds.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MultiResStatsSnapshot {
        MultiResStatsSnapshot {
            vector_builds: self.vector_builds.load(Ordering::Relaxed),
            raster_builds: self.raster_builds.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`MultiResStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MultiResStatsSnapshot {
    pub vector_builds: u64,
    pub raster_builds: u64,
    pub cache_hits: u64,
    pub failures: u64,
}

impl MultiResStatsSnapshot {
    pub fn builds(&self) -> u64 {
        self.vector_builds + self.raster_builds
    }
}

impl fmt::Display for MultiResStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "builds: {} ({} vector, {} raster), cache hits: {}, failures: {}",
            self.builds(),
            self.vector_builds,
            self.raster_builds,
            self.cache_hits,
            self.failures
        )
    }
}

/// One interpretation that did not produce content.
#[derive(Debug)]
pub struct FailedAttempt {
    /// `None` when the resource itself could not be loaded.
    pub kind: Option<InterpretationKind>,
    pub error: InterpretError,
}

impl fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{}: {}", kind, self.error),
            None => write!(f, "load: {}", self.error),
        }
    }
}

/// What happened when a candidate's sub-tree was requested.
#[derive(Debug)]
pub enum BuildOutcome {
    /// Served from the sub-tree cache.
    Cached(Arc<SceneNode>),
    /// Freshly built; `rejected` lists interpretations tried before success.
    Built {
        node: Arc<SceneNode>,
        rejected: Vec<FailedAttempt>,
    },
    /// Every interpretation failed. Nothing was cached.
    Failed {
        locator: Url,
        attempts: Vec<FailedAttempt>,
    },
}

impl BuildOutcome {
    pub fn node(&self) -> Option<&Arc<SceneNode>> {
        match self {
            BuildOutcome::Cached(node) | BuildOutcome::Built { node, .. } => Some(node),
            BuildOutcome::Failed { .. } => None,
        }
    }

    pub fn into_node(self) -> Option<Arc<SceneNode>> {
        match self {
            BuildOutcome::Cached(node) | BuildOutcome::Built { node, .. } => Some(node),
            BuildOutcome::Failed { .. } => None,
        }
    }
}

/// Scene node that paints the best-fit rendition of an image.
pub struct MultiResolutionNode {
    bounds: ViewRect,
    candidates: Vec<Candidate>,
    viewport: ViewportSpec,
    loader: Arc<dyn ResourceLoader>,
    interpreters: Vec<Arc<dyn ContentInterpreter>>,
    cache: Box<dyn SubTreeCache>,
    stats: MultiResStats,
}

impl MultiResolutionNode {
    /// Create a node with the default viewport (`xMidYMid meet`, no clip),
    /// the vector-then-raster interpretation chain, and a bounded sub-tree
    /// cache.
    ///
    /// # Arguments
    ///
    /// * `bounds` - The node's declared bounds in user space
    /// * `candidates` - Renditions in document order; order matters for ties
    /// * `loader` - Fetches candidate bytes
    pub fn new(
        bounds: ViewRect,
        candidates: Vec<Candidate>,
        loader: Arc<dyn ResourceLoader>,
    ) -> Self {
        Self {
            bounds,
            candidates,
            viewport: ViewportSpec::default(),
            loader,
            interpreters: default_interpreters(),
            cache: CachePolicy::default().build(),
            stats: MultiResStats::default(),
        }
    }

    pub fn with_viewport(mut self, viewport: ViewportSpec) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_cache_policy(self, policy: CachePolicy) -> Self {
        self.with_cache(policy.build())
    }

    pub fn with_cache(mut self, cache: Box<dyn SubTreeCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the interpretation chain. Interpreters are tried in order.
    pub fn with_interpreters(mut self, interpreters: Vec<Arc<dyn ContentInterpreter>>) -> Self {
        self.interpreters = interpreters;
        self
    }

    /// Declared bounds, independent of which candidate is active.
    pub fn bounds(&self) -> ViewRect {
        self.bounds
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn viewport(&self) -> &ViewportSpec {
        &self.viewport
    }

    pub fn cache(&self) -> &dyn SubTreeCache {
        self.cache.as_ref()
    }

    pub fn stats(&self) -> &MultiResStats {
        &self.stats
    }

    /// On-screen width of the bounds under `transform`.
    pub fn effective_width(&self, transform: &Transform) -> f64 {
        select::effective_width(self.bounds.width as f64, transform)
    }

    /// Index of the candidate to paint under `transform`.
    pub fn select(&self, transform: &Transform) -> Option<usize> {
        let width = self.effective_width(transform);
        let index = select::select_candidate(&self.candidates, width);
        trace!(width, ?index, "Selected resolution candidate");
        index
    }

    /// Sub-tree for candidate `index`, built on demand.
    ///
    /// Returns `None` if the index is out of range or the build failed.
    pub fn sub_tree(&self, index: usize) -> Option<Arc<SceneNode>> {
        self.build(index)?.into_node()
    }

    /// Fetch or build the sub-tree for candidate `index`, reporting how.
    ///
    /// The resource is loaded once and the same bytes are offered to each
    /// interpretation in order. Only a successful build is cached.
    ///
    /// Returns `None` if the index is out of range.
    pub fn build(&self, index: usize) -> Option<BuildOutcome> {
        let candidate = self.candidates.get(index)?;
        let locator = &candidate.locator;

        if let Some(node) = self.cache.get(index) {
            self.stats.cache_hit();
            trace!(index, %locator, "Sub-tree cache hit");
            return Some(BuildOutcome::Cached(node));
        }

        let bytes = match self.loader.load(locator) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(index, %locator, error = %e, "Candidate resource unavailable");
                self.stats.failed();
                return Some(BuildOutcome::Failed {
                    locator: locator.clone(),
                    attempts: vec![FailedAttempt {
                        kind: None,
                        error: e.into(),
                    }],
                });
            }
        };

        let mut rejected = Vec::new();
        for interpreter in &self.interpreters {
            let kind = interpreter.kind();
            match interpreter.interpret(locator, &bytes) {
                Ok(content) => {
                    let viewport = self.viewport.resolve(&content.view_box(), &self.bounds);
                    let node = Arc::new(SceneNode::new(locator.clone(), content, viewport));
                    self.cache.put(index, &node);
                    self.stats.built(kind);
                    debug!(
                        index,
                        %locator,
                        %kind,
                        fallbacks = rejected.len(),
                        "Built multi-resolution sub-tree"
                    );
                    return Some(BuildOutcome::Built { node, rejected });
                }
                Err(error) => {
                    debug!(index, %locator, %kind, error = %error, "Interpretation failed");
                    rejected.push(FailedAttempt {
                        kind: Some(kind),
                        error,
                    });
                }
            }
        }

        self.stats.failed();
        Some(BuildOutcome::Failed {
            locator: locator.clone(),
            attempts: rejected,
        })
    }

    /// Select, build, and paint the best-fit candidate.
    ///
    /// `transform` maps user space to `target`. Returns the painted sub-tree,
    /// or `None` when there is nothing to paint this frame.
    pub fn primitive_paint(
        &self,
        target: &mut PixmapMut<'_>,
        transform: Transform,
    ) -> Option<Arc<SceneNode>> {
        let index = self.select(&transform)?;
        let node = self.sub_tree(index)?;
        node.paint(target, transform);
        Some(node)
    }
}

impl fmt::Debug for MultiResolutionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiResolutionNode")
            .field("bounds", &self.bounds)
            .field("candidates", &self.candidates.len())
            .field("viewport", &self.viewport)
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multires::loader::MemoryLoader;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tiny_skia::Pixmap;

    const SVG: &[u8] = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="lime"/></svg>"#;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn three_candidates() -> Vec<Candidate> {
        vec![
            Candidate::with_range(url("mem:/low.png"), None, Some(100.0)),
            Candidate::with_range(url("mem:/mid.svg"), Some(100.0), Some(300.0)),
            Candidate::with_range(url("mem:/high.svg"), Some(300.0), None),
        ]
    }

    fn loader() -> Arc<MemoryLoader> {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert(&url("mem:/low.png"), png());
        loader.insert(&url("mem:/mid.svg"), SVG.to_vec());
        loader.insert(&url("mem:/high.svg"), SVG.to_vec());
        loader
    }

    fn node_with(loader: Arc<MemoryLoader>) -> MultiResolutionNode {
        MultiResolutionNode::new(
            ViewRect::from_size(100.0, 100.0),
            three_candidates(),
            loader,
        )
    }

    #[test]
    fn test_select_by_scale() {
        let node = node_with(loader());
        assert_eq!(node.select(&Transform::from_scale(0.5, 0.5)), Some(0));
        assert_eq!(node.select(&Transform::from_scale(2.0, 2.0)), Some(1));
        assert_eq!(node.select(&Transform::from_scale(10.0, 10.0)), Some(2));
    }

    #[test]
    fn test_bounds_are_static() {
        let node = node_with(loader());
        let before = node.bounds();
        let mut target = Pixmap::new(50, 50).unwrap();
        node.primitive_paint(&mut target.as_mut(), Transform::from_scale(0.5, 0.5));
        assert_eq!(node.bounds(), before);
    }

    #[test]
    fn test_vector_then_raster_kinds() {
        let node = node_with(loader());
        assert_eq!(
            node.sub_tree(1).unwrap().kind(),
            InterpretationKind::Vector
        );

        let outcome = node.build(0).unwrap();
        let BuildOutcome::Built { node: built, rejected } = outcome else {
            panic!("expected a fresh build");
        };
        assert_eq!(built.kind(), InterpretationKind::Raster);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].kind, Some(InterpretationKind::Vector));
    }

    #[test]
    fn test_cached_while_held() {
        let node = node_with(loader());
        let first = node.sub_tree(1).unwrap();
        let outcome = node.build(1).unwrap();
        assert!(matches!(outcome, BuildOutcome::Cached(_)));
        assert!(Arc::ptr_eq(&first, outcome.node().unwrap()));
        assert_eq!(node.stats().snapshot().cache_hits, 1);
        assert_eq!(node.stats().builds(), 1);
    }

    #[test]
    fn test_default_cache_keeps_unheld_sub_tree() {
        let node = node_with(loader());
        let mut target = Pixmap::new(50, 50).unwrap();
        for _ in 0..3 {
            node.primitive_paint(&mut target.as_mut(), Transform::from_scale(0.5, 0.5));
        }
        assert_eq!(node.stats().builds(), 1);
        assert_eq!(node.stats().snapshot().cache_hits, 2);
    }

    #[test]
    fn test_weak_cache_rebuilds_unheld_sub_tree() {
        let node = node_with(loader()).with_cache_policy(CachePolicy::Weak);
        let mut target = Pixmap::new(50, 50).unwrap();
        node.primitive_paint(&mut target.as_mut(), Transform::from_scale(0.5, 0.5));
        node.primitive_paint(&mut target.as_mut(), Transform::from_scale(0.5, 0.5));
        assert_eq!(node.stats().builds(), 2);
    }

    #[test]
    fn test_failed_build_is_retried() {
        let loader = Arc::new(MemoryLoader::new());
        let node = node_with(Arc::clone(&loader));

        assert!(node.sub_tree(2).is_none());
        assert_eq!(node.stats().snapshot().failures, 1);

        loader.insert(&url("mem:/high.svg"), SVG.to_vec());
        assert!(node.sub_tree(2).is_some());
        assert_eq!(node.stats().builds(), 1);
    }

    #[test]
    fn test_garbage_bytes_fail_both_interpretations() {
        let loader = loader();
        loader.insert(&url("mem:/mid.svg"), b"not an image".to_vec());
        let node = node_with(loader);

        let Some(BuildOutcome::Failed { attempts, .. }) = node.build(1) else {
            panic!("expected failure");
        };
        let kinds: Vec<_> = attempts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Some(InterpretationKind::Vector),
                Some(InterpretationKind::Raster)
            ]
        );
        assert!(node.cache().is_empty());
    }

    #[test]
    fn test_load_failure_is_single_attempt() {
        let node = node_with(Arc::new(MemoryLoader::new()));
        let Some(BuildOutcome::Failed { attempts, locator }) = node.build(0) else {
            panic!("expected failure");
        };
        assert_eq!(locator.as_str(), "mem:/low.png");
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].kind, None);
        assert!(attempts[0].to_string().starts_with("load: "));
    }

    #[test]
    fn test_out_of_range_index() {
        let node = node_with(loader());
        assert!(node.build(3).is_none());
        assert!(node.sub_tree(99).is_none());
    }

    #[test]
    fn test_empty_candidates_paint_nothing() {
        let node = MultiResolutionNode::new(
            ViewRect::from_size(10.0, 10.0),
            Vec::new(),
            Arc::new(MemoryLoader::new()),
        );
        let mut target = Pixmap::new(10, 10).unwrap();
        assert!(node
            .primitive_paint(&mut target.as_mut(), Transform::identity())
            .is_none());
        assert!(target.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_primitive_paint_draws_selected() {
        let node = node_with(loader());
        let mut target = Pixmap::new(50, 50).unwrap();
        let painted = node
            .primitive_paint(&mut target.as_mut(), Transform::from_scale(0.5, 0.5))
            .unwrap();

        assert_eq!(painted.kind(), InterpretationKind::Raster);
        let px = target.pixel(25, 25).unwrap();
        assert_eq!((px.blue(), px.alpha()), (255, 255));
    }

    #[test]
    fn test_stats_display() {
        let snap = MultiResStatsSnapshot {
            vector_builds: 2,
            raster_builds: 1,
            cache_hits: 5,
            failures: 0,
        };
        assert_eq!(
            snap.to_string(),
            "builds: 3 (2 vector, 1 raster), cache hits: 5, failures: 0"
        );
    }
}
