//! Candidate renditions of a multi-resolution image.

use url::Url;

use crate::multires::error::LoadError;

/// One rendition of an image, tagged with the on-screen width range it suits.
///
/// An absent bound leaves that side of the range open. Ranges of different
/// candidates may overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub locator: Url,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
}

impl Candidate {
    /// Candidate with an open range on both sides.
    pub fn new(locator: Url) -> Self {
        Self {
            locator,
            min_width: None,
            max_width: None,
        }
    }

    /// Candidate with explicit bounds.
    pub fn with_range(locator: Url, min_width: Option<f64>, max_width: Option<f64>) -> Self {
        Self {
            locator,
            min_width,
            max_width,
        }
    }

    /// True when `width` lies inside `[min_width, max_width]`.
    pub fn in_range(&self, width: f64) -> bool {
        self.min_width.map_or(true, |min| width >= min)
            && self.max_width.map_or(true, |max| width <= max)
    }
}

/// Resolve a possibly relative locator against a document base URL.
///
/// Absolute references replace the base; relative ones are joined with
/// standard URL resolution, fragments included.
///
/// # Errors
///
/// Returns `LoadError::InvalidLocator` if the reference cannot be resolved.
pub fn resolve_locator(base: &Url, reference: &str) -> Result<Url, LoadError> {
    Ok(base.join(reference)?)
}
