//! Tessera - tiled raster caching and multi-resolution images
//!
//! This library sits beneath a vector-graphics renderer. It provides:
//!
//! - [`tile`]: tile grids over renderable sources, with memoized tiles and
//!   region invalidation
//! - [`cache`]: a process-wide, byte-bounded tile cache shared by many nodes
//! - [`multires`]: image nodes that pick the best-fit rendition for the
//!   current scale and build it lazily
//! - [`fonts`], [`config`], [`logging`]: startup plumbing

pub mod cache;
pub mod config;
pub mod fonts;
pub mod geom;
pub mod logging;
pub mod multires;
pub mod tile;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
