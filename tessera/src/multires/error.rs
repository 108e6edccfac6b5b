//! Error types for resource loading and content interpretation.
//!
//! None of these escape a [`MultiResolutionNode`](super::MultiResolutionNode)
//! paint: a candidate whose every interpretation fails simply paints nothing.

use thiserror::Error;

/// Errors raised by a [`ResourceLoader`](super::ResourceLoader).
#[derive(Debug, Error)]
pub enum LoadError {
    /// No resource exists at the locator.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The loader does not handle this URL scheme.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Reading the resource failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A locator could not be parsed or resolved.
    #[error("Invalid locator: {0}")]
    InvalidLocator(#[from] url::ParseError),
}

/// Errors raised while interpreting loaded bytes as scene content.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// The bytes are not a usable vector document.
    #[error("Vector interpretation failed: {0}")]
    Vector(#[from] resvg::usvg::Error),

    /// The bytes are not a decodable raster image.
    #[error("Raster interpretation failed: {0}")]
    Raster(#[from] image::ImageError),

    /// The content decoded but has no area.
    #[error("Content has empty size: {width}×{height}")]
    EmptyContent { width: f32, height: f32 },

    /// The resource could not be loaded at all.
    #[error(transparent)]
    Load(#[from] LoadError),
}
