//! Multi-resolution images with lazy, softly cached sub-trees.
//!
//! A [`MultiResolutionNode`] carries several renditions of one image, each
//! suited to a range of on-screen widths. Painting picks the best fit for
//! the current scale and materializes only that rendition.
//!
//! # Pipeline
//!
//! ```text
//! Candidate[] ──► select ──► ResourceLoader ──► ContentInterpreter[] ──► SceneNode
//!                  (scale)     (bytes)          (vector, then raster)    (viewport + clip)
//!                                                                           │
//!                                                         SubTreeCache ◄────┘
//!                                                     (weak or bounded)
//! ```
//!
//! Resolution selection depends only on scale. Mutations elsewhere in the
//! document invalidate tile regions, never this node's sub-tree cache.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tessera::geom::ViewRect;
//! use tessera::multires::{Candidate, MemoryLoader, MultiResolutionNode};
//! use url::Url;
//!
//! let loader = Arc::new(MemoryLoader::new());
//! let small = Url::parse("mem:/small.svg").unwrap();
//! loader.insert(
//!     &small,
//!     br#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#.to_vec(),
//! );
//!
//! let node = MultiResolutionNode::new(
//!     ViewRect::from_size(64.0, 64.0),
//!     vec![Candidate::with_range(small, None, Some(200.0))],
//!     loader,
//! );
//!
//! let mut canvas = tiny_skia::Pixmap::new(64, 64).unwrap();
//! let painted = node.primitive_paint(&mut canvas.as_mut(), tiny_skia::Transform::identity());
//! assert!(painted.is_some());
//! ```

mod cache;
mod candidate;
mod error;
mod interpret;
mod loader;
mod node;
mod scene;
pub mod select;
mod viewport;

pub use cache::{
    BoundedSubTreeCache, CachePolicy, SubTreeCache, WeakSubTreeCache, DEFAULT_SUBTREE_CAPACITY,
};
pub use candidate::{resolve_locator, Candidate};
pub use error::{InterpretError, LoadError};
pub use interpret::{
    default_interpreters, ContentInterpreter, InterpretationKind, RasterInterpreter,
    VectorInterpreter,
};
pub use loader::{FallbackLoader, FileLoader, MemoryLoader, ResourceLoader};
pub use node::{
    BuildOutcome, FailedAttempt, MultiResStats, MultiResStatsSnapshot, MultiResolutionNode,
};
pub use scene::{SceneContent, SceneNode};
pub use viewport::{
    fit_transform, Align, Clip, ClipOffsets, MeetOrSlice, PreserveAspectRatio, Viewport,
    ViewportSpec,
};
