//! Built scene sub-trees.
//!
//! A [`SceneNode`] is the materialized form of one candidate: its content
//! (a parsed vector document or a decoded raster image) together with the
//! viewport transform and optional clip that place it inside the owning
//! node's bounds. Sub-trees are immutable once built and shared via `Arc`.

use std::sync::Arc;

use resvg::usvg;
use tiny_skia::{FillRule, FilterQuality, Mask, Pixmap, PixmapMut, PixmapPaint, Transform};
use url::Url;

use crate::geom::ViewRect;
use crate::multires::interpret::InterpretationKind;
use crate::multires::viewport::{Clip, Viewport};

/// Paintable content of a sub-tree.
#[derive(Clone)]
pub enum SceneContent {
    Vector(Arc<usvg::Tree>),
    /// Premultiplied RGBA pixels.
    Raster(Arc<Pixmap>),
}

impl SceneContent {
    pub fn kind(&self) -> InterpretationKind {
        match self {
            SceneContent::Vector(_) => InterpretationKind::Vector,
            SceneContent::Raster(_) => InterpretationKind::Raster,
        }
    }

    /// Intrinsic width and height.
    pub fn natural_size(&self) -> (f32, f32) {
        match self {
            SceneContent::Vector(tree) => (tree.size().width(), tree.size().height()),
            SceneContent::Raster(pixmap) => (pixmap.width() as f32, pixmap.height() as f32),
        }
    }

    /// The implicit view box: the natural size anchored at the origin.
    pub fn view_box(&self) -> ViewRect {
        let (width, height) = self.natural_size();
        ViewRect::from_size(width, height)
    }
}

impl std::fmt::Debug for SceneContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.natural_size();
        f.debug_struct("SceneContent")
            .field("kind", &self.kind())
            .field("width", &width)
            .field("height", &height)
            .finish()
    }
}

/// A built, positioned sub-tree for one candidate.
#[derive(Debug, Clone)]
pub struct SceneNode {
    locator: Url,
    content: SceneContent,
    viewport: Viewport,
}

impl SceneNode {
    pub fn new(locator: Url, content: SceneContent, viewport: Viewport) -> Self {
        Self {
            locator,
            content,
            viewport,
        }
    }

    /// Locator of the candidate this sub-tree was built from.
    pub fn locator(&self) -> &Url {
        &self.locator
    }

    pub fn content(&self) -> &SceneContent {
        &self.content
    }

    pub fn kind(&self) -> InterpretationKind {
        self.content.kind()
    }

    /// Content-to-user transform.
    pub fn transform(&self) -> Transform {
        self.viewport.transform
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.viewport.clip.as_ref()
    }

    /// Paint into `target`, with `base` mapping user space to the target.
    pub fn paint(&self, target: &mut PixmapMut<'_>, base: Transform) {
        let transform = self.viewport.transform.post_concat(base);

        let mask = match self.viewport.clip.as_ref() {
            None => None,
            Some(Clip::Empty) => return,
            Some(Clip::Shape(path)) => {
                let Some(mut mask) = Mask::new(target.width(), target.height()) else {
                    return;
                };
                mask.fill_path(path, FillRule::Winding, true, transform);
                Some(mask)
            }
        };

        match &self.content {
            SceneContent::Raster(pixmap) => {
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                target.draw_pixmap(0, 0, (**pixmap).as_ref(), &paint, transform, mask.as_ref());
            }
            SceneContent::Vector(tree) => match mask {
                None => resvg::render(tree, transform, target),
                Some(mask) => {
                    // resvg has no mask parameter; render aside and composite
                    let Some(mut layer) = Pixmap::new(target.width(), target.height()) else {
                        return;
                    };
                    resvg::render(tree, transform, &mut layer.as_mut());
                    target.draw_pixmap(
                        0,
                        0,
                        layer.as_ref(),
                        &PixmapPaint::default(),
                        Transform::identity(),
                        Some(&mask),
                    );
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multires::viewport::ViewportSpec;
    use tiny_skia::ColorU8;

    fn red_raster(width: u32, height: u32) -> SceneContent {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        SceneContent::Raster(Arc::new(pixmap))
    }

    fn node(content: SceneContent, spec: ViewportSpec, bounds: ViewRect) -> SceneNode {
        let viewport = spec.resolve(&content.view_box(), &bounds);
        SceneNode::new(Url::parse("mem:/x").unwrap(), content, viewport)
    }

    fn alpha_at(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
        pixmap.pixel(x, y).unwrap().alpha()
    }

    #[test]
    fn test_raster_paints_inside_bounds() {
        let n = node(
            red_raster(10, 10),
            ViewportSpec::default(),
            ViewRect::new(10.0, 10.0, 20.0, 20.0),
        );
        let mut target = Pixmap::new(40, 40).unwrap();
        n.paint(&mut target.as_mut(), Transform::identity());

        assert_eq!(alpha_at(&target, 20, 20), 255);
        assert_eq!(alpha_at(&target, 5, 5), 0);
        assert_eq!(alpha_at(&target, 35, 35), 0);
    }

    #[test]
    fn test_slice_overflow_is_clipped() {
        // 20×10 content sliced into a 10×10 box overflows horizontally
        let spec = ViewportSpec {
            preserve_aspect_ratio: "xMinYMin slice".parse().unwrap(),
            overflow_hidden: true,
            clip_offsets: None,
        };
        let n = node(red_raster(20, 10), spec, ViewRect::from_size(10.0, 10.0));
        let mut target = Pixmap::new(30, 30).unwrap();
        n.paint(&mut target.as_mut(), Transform::identity());

        assert_eq!(alpha_at(&target, 5, 5), 255);
        assert_eq!(alpha_at(&target, 15, 5), 0);
    }

    #[test]
    fn test_slice_overflow_without_clip_spills() {
        let spec = ViewportSpec {
            preserve_aspect_ratio: "xMinYMin slice".parse().unwrap(),
            ..ViewportSpec::default()
        };
        let n = node(red_raster(20, 10), spec, ViewRect::from_size(10.0, 10.0));
        let mut target = Pixmap::new(30, 30).unwrap();
        n.paint(&mut target.as_mut(), Transform::identity());

        assert_eq!(alpha_at(&target, 15, 5), 255);
    }

    #[test]
    fn test_empty_clip_paints_nothing() {
        let spec = ViewportSpec {
            overflow_hidden: true,
            clip_offsets: Some(crate::multires::viewport::ClipOffsets {
                top: 20.0,
                right: 0.0,
                bottom: 20.0,
                left: 0.0,
            }),
            ..ViewportSpec::default()
        };
        let n = node(red_raster(10, 10), spec, ViewRect::from_size(20.0, 20.0));
        let mut target = Pixmap::new(20, 20).unwrap();
        n.paint(&mut target.as_mut(), Transform::identity());

        assert!(target.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_vector_paints_with_base_transform() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="blue"/></svg>"#;
        let tree = usvg::Tree::from_data(svg, &usvg::Options::default()).unwrap();
        let n = node(
            SceneContent::Vector(Arc::new(tree)),
            ViewportSpec::default(),
            ViewRect::from_size(10.0, 10.0),
        );
        let mut target = Pixmap::new(40, 40).unwrap();
        n.paint(&mut target.as_mut(), Transform::from_scale(2.0, 2.0));

        let px = target.pixel(15, 15).unwrap();
        assert_eq!(
            ColorU8::from_rgba(px.red(), px.green(), px.blue(), px.alpha()),
            ColorU8::from_rgba(0, 0, 255, 255)
        );
        assert_eq!(alpha_at(&target, 25, 25), 0);
    }

    #[test]
    fn test_content_view_box() {
        assert_eq!(red_raster(7, 3).view_box(), ViewRect::from_size(7.0, 3.0));
        assert_eq!(red_raster(7, 3).kind(), InterpretationKind::Raster);
    }
}
