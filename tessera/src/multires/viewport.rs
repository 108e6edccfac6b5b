//! Viewport fitting and overflow clipping.
//!
//! Built content has a natural view box (its intrinsic size). The viewport
//! maps that box into the node's bounds according to a
//! [`PreserveAspectRatio`] rule, then optionally clips overflow.
//!
//! ```text
//!   content space                       user space
//!  ┌────────────┐   fit_transform    ┌──────────────────┐
//!  │ natural    │ ─────────────────► │  ┌──────────┐    │ bounds
//!  │ view box   │                    │  │ content  │    │
//!  └────────────┘ ◄───────────────── │  └──────────┘    │
//!                  inverse (clip)    └──────────────────┘
//! ```
//!
//! The clip is expressed in content space so it moves with the content's
//! transform when painted.

use std::fmt;
use std::str::FromStr;

use tiny_skia::{Path, PathBuilder, Transform};

use crate::geom::ViewRect;

/// Alignment of the view box inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Align {
    /// Stretch independently on both axes.
    None,
    XMinYMin,
    XMidYMin,
    XMaxYMin,
    XMinYMid,
    #[default]
    XMidYMid,
    XMaxYMid,
    XMinYMax,
    XMidYMax,
    XMaxYMax,
}

impl Align {
    /// Fractional anchor on each axis (0 = min, 0.5 = mid, 1 = max).
    fn anchors(self) -> Option<(f32, f32)> {
        let (x, y) = match self {
            Align::None => return None,
            Align::XMinYMin => (0.0, 0.0),
            Align::XMidYMin => (0.5, 0.0),
            Align::XMaxYMin => (1.0, 0.0),
            Align::XMinYMid => (0.0, 0.5),
            Align::XMidYMid => (0.5, 0.5),
            Align::XMaxYMid => (1.0, 0.5),
            Align::XMinYMax => (0.0, 1.0),
            Align::XMidYMax => (0.5, 1.0),
            Align::XMaxYMax => (1.0, 1.0),
        };
        Some((x, y))
    }

    fn keyword(self) -> &'static str {
        match self {
            Align::None => "none",
            Align::XMinYMin => "xMinYMin",
            Align::XMidYMin => "xMidYMin",
            Align::XMaxYMin => "xMaxYMin",
            Align::XMinYMid => "xMinYMid",
            Align::XMidYMid => "xMidYMid",
            Align::XMaxYMid => "xMaxYMid",
            Align::XMinYMax => "xMinYMax",
            Align::XMidYMax => "xMidYMax",
            Align::XMaxYMax => "xMaxYMax",
        }
    }
}

/// Whether the whole view box must fit (`Meet`) or the viewport must be
/// covered (`Slice`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeetOrSlice {
    #[default]
    Meet,
    Slice,
}

/// Aspect-ratio rule, `xMidYMid meet` by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PreserveAspectRatio {
    pub align: Align,
    pub meet_or_slice: MeetOrSlice,
}

impl PreserveAspectRatio {
    pub const fn new(align: Align, meet_or_slice: MeetOrSlice) -> Self {
        Self {
            align,
            meet_or_slice,
        }
    }
}

impl fmt::Display for PreserveAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.align, self.meet_or_slice) {
            (Align::None, _) => write!(f, "none"),
            (align, MeetOrSlice::Meet) => write!(f, "{} meet", align.keyword()),
            (align, MeetOrSlice::Slice) => write!(f, "{} slice", align.keyword()),
        }
    }
}

impl FromStr for PreserveAspectRatio {
    type Err = String;

    /// Parse the attribute syntax, e.g. `"xMinYMax slice"` or `"none"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let align = match words.next() {
            None => return Ok(Self::default()),
            Some("none") => Align::None,
            Some("xMinYMin") => Align::XMinYMin,
            Some("xMidYMin") => Align::XMidYMin,
            Some("xMaxYMin") => Align::XMaxYMin,
            Some("xMinYMid") => Align::XMinYMid,
            Some("xMidYMid") => Align::XMidYMid,
            Some("xMaxYMid") => Align::XMaxYMid,
            Some("xMinYMax") => Align::XMinYMax,
            Some("xMidYMax") => Align::XMidYMax,
            Some("xMaxYMax") => Align::XMaxYMax,
            Some(other) => return Err(format!("unknown alignment '{}'", other)),
        };
        let meet_or_slice = match words.next() {
            None | Some("meet") => MeetOrSlice::Meet,
            Some("slice") => MeetOrSlice::Slice,
            Some(other) => return Err(format!("unknown meet-or-slice '{}'", other)),
        };
        if let Some(extra) = words.next() {
            return Err(format!("unexpected token '{}'", extra));
        }
        Ok(Self::new(align, meet_or_slice))
    }
}

/// Insets of an explicit overflow clip rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipOffsets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// How content is placed into a node's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSpec {
    pub preserve_aspect_ratio: PreserveAspectRatio,
    /// Clip content that overflows the bounds (or the offset rectangle).
    pub overflow_hidden: bool,
    /// Explicit clip insets; `None` clips to the bounds themselves.
    pub clip_offsets: Option<ClipOffsets>,
}

/// Clip region in content space.
#[derive(Debug, Clone)]
pub enum Clip {
    /// Paint only inside this path.
    Shape(Path),
    /// The clip rectangle has no area; nothing is painted.
    Empty,
}

/// Resolved placement of content inside a node.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub transform: Transform,
    pub clip: Option<Clip>,
}

/// Transform mapping `view_box` into a `width × height` viewport at the origin.
///
/// A view box with no area maps to a zero scale.
pub fn fit_transform(
    view_box: &ViewRect,
    par: &PreserveAspectRatio,
    width: f32,
    height: f32,
) -> Transform {
    if view_box.is_empty() {
        return Transform::from_scale(0.0, 0.0);
    }

    let sx = width / view_box.width;
    let sy = height / view_box.height;

    let Some((ax, ay)) = par.align.anchors() else {
        return Transform::from_row(
            sx,
            0.0,
            0.0,
            sy,
            -view_box.x * sx,
            -view_box.y * sy,
        );
    };

    let s = match par.meet_or_slice {
        MeetOrSlice::Meet => sx.min(sy),
        MeetOrSlice::Slice => sx.max(sy),
    };
    let tx = -view_box.x * s + (width - view_box.width * s) * ax;
    let ty = -view_box.y * s + (height - view_box.height * s) * ay;
    Transform::from_row(s, 0.0, 0.0, s, tx, ty)
}

/// Inverse of `t`, or `None` for a singular or non-finite transform.
///
/// `Transform::invert` does not check the determinant of scale/translate
/// transforms.
fn invert(t: Transform) -> Option<Transform> {
    let det = f64::from(t.sx) * f64::from(t.sy) - f64::from(t.kx) * f64::from(t.ky);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inverse = t.invert()?;
    [inverse.sx, inverse.ky, inverse.kx, inverse.sy, inverse.tx, inverse.ty]
        .iter()
        .all(|v| v.is_finite())
        .then_some(inverse)
}

impl ViewportSpec {
    /// Place content with natural box `view_box` into `bounds`.
    ///
    /// The fit transform is followed by a translation to the bounds origin.
    /// With overflow hidden, the clip rectangle is carried into content
    /// space through the inverse transform; when the transform cannot be
    /// inverted the clip is dropped and the content paints unclipped.
    pub fn resolve(&self, view_box: &ViewRect, bounds: &ViewRect) -> Viewport {
        let transform = fit_transform(
            view_box,
            &self.preserve_aspect_ratio,
            bounds.width,
            bounds.height,
        )
        .post_translate(bounds.x, bounds.y);

        let clip = if self.overflow_hidden {
            self.content_clip(bounds, transform)
        } else {
            None
        };

        Viewport { transform, clip }
    }

    /// Clip rectangle in user space.
    pub fn clip_rect(&self, bounds: &ViewRect) -> ViewRect {
        match self.clip_offsets {
            None => *bounds,
            Some(o) => ViewRect::new(
                bounds.x + o.left,
                bounds.y + o.top,
                bounds.width - o.right - o.left,
                bounds.height - o.bottom - o.top,
            ),
        }
    }

    fn content_clip(&self, bounds: &ViewRect, transform: Transform) -> Option<Clip> {
        let inverse = invert(transform)?;
        let Some(rect) = self.clip_rect(bounds).to_skia() else {
            return Some(Clip::Empty);
        };
        let path = PathBuilder::from_rect(rect).transform(inverse)?;
        Some(Clip::Shape(path))
    }
}
