//! Geometry shared by the tile grid, its sources, and viewport fitting.
//!
//! Pixel rectangles use half-open spans: a rectangle at `x` with `width` 4
//! covers pixel columns `x..x + 4`. Widths and heights may be zero or
//! negative, in which case the rectangle covers no pixels.
//!
//! [`ViewRect`] is the floating-point counterpart used in user space.

use std::fmt;

/// Integer division rounding towards negative infinity.
///
/// Tile indices for pixels left of (or above) the grid origin must land in
/// negative tiles, which plain `/` would round towards zero.
#[inline]
pub fn floor_div(value: i64, divisor: i64) -> i64 {
    let q = value / divisor;
    if (value % divisor != 0) && ((value < 0) != (divisor < 0)) {
        q - 1
    } else {
        q
    }
}

/// An axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Create a rectangle from origin and size.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of pixels covered, zero for empty rectangles.
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    /// True when the pixel at `(px, py)` lies inside the rectangle.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// True when both rectangles share at least one pixel.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Overlap of two rectangles; empty (zero-sized) when they are disjoint.
    ///
    /// Edges are computed in `i64`, so rectangles reaching past `i32::MAX`
    /// are clipped rather than wrapped.
    pub fn intersection(&self, other: &PixelRect) -> PixelRect {
        let edge = |origin: i32, size: i32| i64::from(origin) + i64::from(size);
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = edge(self.x, self.width).min(edge(other.x, other.width));
        let y1 = edge(self.y, self.height).min(edge(other.y, other.height));
        let width = x1 - i64::from(x0);
        let height = y1 - i64::from(y0);
        if width <= 0 || height <= 0 {
            PixelRect::new(x0, y0, 0, 0)
        } else {
            PixelRect::new(
                x0,
                y0,
                width.min(i64::from(i32::MAX)) as i32,
                height.min(i64::from(i32::MAX)) as i32,
            )
        }
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}×{}@({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// A floating-point rectangle in user space.
///
/// Used for node bounds and natural view boxes, where a zero width or height
/// is legal (and makes the viewport transform degenerate).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// True when the rectangle has no positive area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Convert to a `tiny_skia::Rect`, `None` when empty or not finite.
    pub fn to_skia(&self) -> Option<tiny_skia::Rect> {
        if self.is_empty() {
            return None;
        }
        tiny_skia::Rect::from_xywh(self.x, self.y, self.width, self.height)
    }
}

impl fmt::Display for ViewRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}×{}@({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_rect_empty() {
        assert!(ViewRect::from_size(0.0, 10.0).is_empty());
        assert!(ViewRect::new(1.0, 1.0, 10.0, -1.0).is_empty());
        assert!(ViewRect::from_size(f32::NAN, 1.0).is_empty());
        assert!(!ViewRect::from_size(0.5, 0.5).is_empty());
    }

    #[test]
    fn test_view_rect_to_skia() {
        let r = ViewRect::new(5.0, 6.0, 10.0, 20.0).to_skia().unwrap();
        assert_eq!((r.x(), r.y(), r.width(), r.height()), (5.0, 6.0, 10.0, 20.0));
        assert!(ViewRect::from_size(0.0, 3.0).to_skia().is_none());
    }

    #[test]
    fn test_floor_div_positive() {
        assert_eq!(floor_div(0, 64), 0);
        assert_eq!(floor_div(63, 64), 0);
        assert_eq!(floor_div(64, 64), 1);
    }

    #[test]
    fn test_floor_div_negative() {
        assert_eq!(floor_div(-1, 64), -1);
        assert_eq!(floor_div(-64, 64), -1);
        assert_eq!(floor_div(-65, 64), -2);
    }

    #[test]
    fn test_intersection_overlapping() {
        let a = PixelRect::new(0, 0, 100, 100);
        let b = PixelRect::new(50, 60, 100, 100);
        assert_eq!(a.intersection(&b), PixelRect::new(50, 60, 50, 40));
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_intersection_touching_edges_is_empty() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(10, 0, 10, 10);
        assert!(a.intersection(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_intersection_with_huge_rect() {
        let bounds = PixelRect::from_size(64, 64);
        let huge = PixelRect::new(10, 10, i32::MAX, i32::MAX);
        assert_eq!(huge.intersection(&bounds), PixelRect::new(10, 10, 54, 54));
        assert_eq!(bounds.intersection(&huge), PixelRect::new(10, 10, 54, 54));
        assert_eq!(huge.right(), i32::MAX);

        let far = PixelRect::new(i32::MAX - 5, 0, 100, 10);
        assert_eq!(far.intersection(&far), PixelRect::new(i32::MAX - 5, 0, 100, 10));
        assert!(far.contains(i32::MAX - 1, 0));
        assert!(!far.intersects(&bounds));
    }

    #[test]
    fn test_empty_and_area() {
        assert!(PixelRect::new(0, 0, 0, 5).is_empty());
        assert!(PixelRect::new(0, 0, -3, 5).is_empty());
        assert_eq!(PixelRect::new(0, 0, -3, 5).area(), 0);
        assert_eq!(PixelRect::new(4, 4, 3, 5).area(), 15);
    }

    #[test]
    fn test_display() {
        assert_eq!(PixelRect::new(1, 2, 30, 40).to_string(), "30×40@(1, 2)");
    }
}
