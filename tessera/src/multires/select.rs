//! Resolution selection.
//!
//! Picks the candidate that best fits the on-screen width of the node.
//!
//! The distance measure is deliberately simple. It does not penalize being
//! over an open-ended bound differently from being under it, and open-ended
//! ranges measure from their single bound rather than a midpoint, so they
//! tend to win near that bound. The in-range preference below compensates.

use tiny_skia::Transform;

use crate::multires::candidate::Candidate;

/// Distance reported for a candidate with no bounds at all.
pub const UNBOUNDED_DISTANCE: f64 = 10e10;

/// Horizontal scale factor of a transform: `sqrt(shearX² + scaleX²)`.
pub fn horizontal_scale(transform: &Transform) -> f64 {
    let shear_x = transform.kx as f64;
    let scale_x = transform.sx as f64;
    (shear_x * shear_x + scale_x * scale_x).sqrt()
}

/// Effective on-screen width of a node of `bounds_width` under `transform`.
pub fn effective_width(bounds_width: f64, transform: &Transform) -> f64 {
    bounds_width * horizontal_scale(transform)
}

/// How far `width` is from a candidate's range.
///
/// - both bounds: distance from the range midpoint
/// - one bound: distance from that bound
/// - no bounds: [`UNBOUNDED_DISTANCE`]
pub fn distance(width: f64, min_width: Option<f64>, max_width: Option<f64>) -> f64 {
    match (min_width, max_width) {
        (None, None) => UNBOUNDED_DISTANCE,
        (None, Some(max)) => (width - max).abs(),
        (Some(min), None) => (width - min).abs(),
        (Some(min), Some(max)) => (width - (min + max) / 2.0).abs(),
    }
}

/// Choose a candidate index for `width`.
///
/// Walks the candidates in order, tracking the closest one by
/// [`distance`] (the earliest wins ties). Among candidates whose range
/// contains `width`, the first one found is taken, but a later in-range
/// candidate replaces it when that later candidate is the closest so far.
/// With no in-range candidate, the closest one is used.
///
/// Returns `None` only for an empty candidate list.
pub fn select_candidate(candidates: &[Candidate], width: f64) -> Option<usize> {
    let first = candidates.first()?;
    let mut min_dist = distance(width, first.min_width, first.max_width);
    let mut min_idx = 0;
    let mut chosen: Option<usize> = None;

    for (i, candidate) in candidates.iter().enumerate() {
        let dist = distance(width, candidate.min_width, candidate.max_width);
        if dist < min_dist {
            min_dist = dist;
            min_idx = i;
        }

        if candidate.in_range(width) && (chosen.is_none() || min_idx == i) {
            chosen = Some(i);
        }
    }

    Some(chosen.unwrap_or(min_idx))
}
