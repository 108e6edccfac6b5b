//! Content interpreters.
//!
//! The same loaded bytes are offered to each interpreter in order until one
//! of them accepts. The default chain tries a vector document first and a
//! raster image second.

use std::fmt;
use std::sync::Arc;

use resvg::usvg;
use serde::Serialize;
use tiny_skia::{ColorU8, Pixmap};
use tracing::trace;
use url::Url;

use crate::multires::error::InterpretError;
use crate::multires::scene::SceneContent;

/// Which interpretation produced a sub-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationKind {
    Vector,
    Raster,
}

impl fmt::Display for InterpretationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpretationKind::Vector => write!(f, "vector"),
            InterpretationKind::Raster => write!(f, "raster"),
        }
    }
}

/// Turns raw resource bytes into paintable content.
pub trait ContentInterpreter: Send + Sync {
    fn kind(&self) -> InterpretationKind;

    /// Interpret `bytes` loaded from `locator`.
    ///
    /// # Errors
    ///
    /// Returns an `InterpretError` if the bytes are not content of this kind.
    fn interpret(&self, locator: &Url, bytes: &[u8]) -> Result<SceneContent, InterpretError>;
}

/// Parses the bytes as an SVG document.
#[derive(Debug, Default, Clone)]
pub struct VectorInterpreter;

impl ContentInterpreter for VectorInterpreter {
    fn kind(&self) -> InterpretationKind {
        InterpretationKind::Vector
    }

    fn interpret(&self, locator: &Url, bytes: &[u8]) -> Result<SceneContent, InterpretError> {
        let mut options = usvg::Options::default();
        // Relative image references inside the document resolve next to it
        if let Ok(path) = locator.to_file_path() {
            if let Some(dir) = path.parent() {
                options.resources_dir = Some(dir.to_path_buf());
            }
        }

        let tree = usvg::Tree::from_data(bytes, &options)?;
        let size = tree.size();
        trace!(
            %locator,
            width = size.width(),
            height = size.height(),
            "Parsed vector document"
        );
        Ok(SceneContent::Vector(Arc::new(tree)))
    }
}

/// Decodes the bytes as a raster image into a premultiplied pixmap.
#[derive(Debug, Default, Clone)]
pub struct RasterInterpreter;

impl ContentInterpreter for RasterInterpreter {
    fn kind(&self) -> InterpretationKind {
        InterpretationKind::Raster
    }

    fn interpret(&self, locator: &Url, bytes: &[u8]) -> Result<SceneContent, InterpretError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut pixmap = Pixmap::new(width, height).ok_or(InterpretError::EmptyContent {
            width: width as f32,
            height: height as f32,
        })?;

        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        trace!(%locator, width, height, "Decoded raster image");
        Ok(SceneContent::Raster(Arc::new(pixmap)))
    }
}

/// The standard interpretation order: vector, then raster.
pub fn default_interpreters() -> Vec<Arc<dyn ContentInterpreter>> {
    vec![Arc::new(VectorInterpreter), Arc::new(RasterInterpreter)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    const SVG: &[u8] =
        br#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect width="40" height="20" fill="red"/></svg>"#;

    fn locator() -> Url {
        Url::parse("mem:/content").unwrap()
    }

    fn png_bytes(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(px));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_vector_interprets_svg() {
        let content = VectorInterpreter.interpret(&locator(), SVG).unwrap();
        assert_eq!(content.kind(), InterpretationKind::Vector);
        assert_eq!(content.natural_size(), (40.0, 20.0));
    }

    #[test]
    fn test_vector_rejects_png() {
        let err = VectorInterpreter
            .interpret(&locator(), &png_bytes(2, 2, [0, 0, 0, 255]))
            .unwrap_err();
        assert!(matches!(err, InterpretError::Vector(_)));
    }

    #[test]
    fn test_raster_decodes_png_premultiplied() {
        let bytes = png_bytes(3, 2, [200, 100, 50, 128]);
        let content = RasterInterpreter.interpret(&locator(), &bytes).unwrap();
        assert_eq!(content.kind(), InterpretationKind::Raster);
        assert_eq!(content.natural_size(), (3.0, 2.0));

        let SceneContent::Raster(pixmap) = content else {
            panic!("expected raster content");
        };
        let px = pixmap.pixel(1, 1).unwrap();
        assert_eq!(px.alpha(), 128);
        assert!(px.red() <= 128);
    }

    #[test]
    fn test_raster_rejects_svg() {
        let err = RasterInterpreter.interpret(&locator(), SVG).unwrap_err();
        assert!(matches!(err, InterpretError::Raster(_)));
    }

    #[test]
    fn test_default_order() {
        let kinds: Vec<_> = default_interpreters().iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec![InterpretationKind::Vector, InterpretationKind::Raster]
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(InterpretationKind::Vector.to_string(), "vector");
        assert_eq!(InterpretationKind::Raster.to_string(), "raster");
    }
}
