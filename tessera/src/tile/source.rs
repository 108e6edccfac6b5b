//! Upstream renderable sources consumed by tiled nodes.
//!
//! A source knows its pixel bounds, its tile grid anchor, its sample layout,
//! and how to copy any region of itself into a caller-supplied buffer. Tiled
//! nodes never assume a source is cached; every `copy_into` may recompute.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbaImage};
use tiny_skia::Pixmap;

use crate::geom::PixelRect;
use crate::tile::buffer::{blit, PixelLayout, Tile};
use crate::tile::error::TileError;
use crate::tile::geometry::DEFAULT_TILE_SIZE;

/// A rectangular renderable region that can paint into a tile buffer.
///
/// Implementations must be thread-safe (`Send + Sync`); tiled nodes may be
/// read from several rendering threads.
pub trait TileSource: Send + Sync {
    /// Pixel bounds of the source.
    fn bounds(&self) -> PixelRect;

    /// Pixel position of tile `(0, 0)` in the source's preferred grid.
    fn tile_grid_offset(&self) -> (i32, i32) {
        (0, 0)
    }

    /// Sample layout of the source's pixels.
    fn layout(&self) -> PixelLayout;

    /// Preferred tile size, used when the caller does not choose one.
    fn tile_size(&self) -> (u32, u32) {
        (DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE)
    }

    /// Fill `dest` with this source's pixels for `dest.rect()`.
    ///
    /// Pixels of `dest` outside the source bounds are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `TileError::LayoutMismatch` if `dest` uses another layout.
    fn copy_into(&self, dest: &mut Tile) -> Result<(), TileError>;
}

fn check_layout(expected: PixelLayout, dest: &Tile) -> Result<(), TileError> {
    if dest.layout() == expected {
        Ok(())
    } else {
        Err(TileError::LayoutMismatch {
            expected,
            actual: dest.layout(),
        })
    }
}

#[derive(Debug, Clone)]
enum ImagePixels {
    Rgba(RgbaImage),
    Gray(GrayImage),
}

/// Source backed by a decoded image.
///
/// Luminance images stay single-channel; everything else is converted to
/// straight RGBA8.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pixels: ImagePixels,
    origin: (i32, i32),
    grid_offset: (i32, i32),
    tile_size: (u32, u32),
}

impl ImageSource {
    /// Wrap a decoded image positioned at `(0, 0)`.
    pub fn new(image: DynamicImage) -> Self {
        let pixels = match image {
            DynamicImage::ImageLuma8(gray) => ImagePixels::Gray(gray),
            other => ImagePixels::Rgba(other.to_rgba8()),
        };
        Self {
            pixels,
            origin: (0, 0),
            grid_offset: (0, 0),
            tile_size: (DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE),
        }
    }

    /// Decode an image file.
    ///
    /// # Errors
    ///
    /// Returns `TileError::Image` if the file cannot be read or decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TileError> {
        Ok(Self::new(image::open(path)?))
    }

    /// Place the image's top-left pixel at `(x, y)`.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    /// Anchor the preferred tile grid at `(x, y)`.
    pub fn with_grid_offset(mut self, x: i32, y: i32) -> Self {
        self.grid_offset = (x, y);
        self
    }

    /// Set the preferred tile size.
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_size = (width, height);
        self
    }

    fn raw(&self) -> &[u8] {
        match &self.pixels {
            ImagePixels::Rgba(img) => img.as_raw(),
            ImagePixels::Gray(img) => img.as_raw(),
        }
    }
}

impl TileSource for ImageSource {
    fn bounds(&self) -> PixelRect {
        let (width, height) = match &self.pixels {
            ImagePixels::Rgba(img) => img.dimensions(),
            ImagePixels::Gray(img) => img.dimensions(),
        };
        PixelRect::new(self.origin.0, self.origin.1, width as i32, height as i32)
    }

    fn tile_grid_offset(&self) -> (i32, i32) {
        self.grid_offset
    }

    fn layout(&self) -> PixelLayout {
        match self.pixels {
            ImagePixels::Rgba(_) => PixelLayout::Rgba8,
            ImagePixels::Gray(_) => PixelLayout::Gray8,
        }
    }

    fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }

    fn copy_into(&self, dest: &mut Tile) -> Result<(), TileError> {
        check_layout(self.layout(), dest)?;
        blit(self.raw(), self.bounds(), self.layout().bytes_per_pixel(), dest);
        Ok(())
    }
}

/// Source backed by a premultiplied RGBA pixmap, typically the output of a
/// vector rasterization pass.
#[derive(Debug, Clone)]
pub struct PixmapSource {
    pixmap: Pixmap,
    origin: (i32, i32),
    tile_size: (u32, u32),
}

impl PixmapSource {
    /// Wrap a pixmap positioned at `(0, 0)`.
    pub fn new(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            origin: (0, 0),
            tile_size: (DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE),
        }
    }

    /// Place the pixmap's top-left pixel at `(x, y)`.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    /// Set the preferred tile size.
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_size = (width, height);
        self
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

impl TileSource for PixmapSource {
    fn bounds(&self) -> PixelRect {
        PixelRect::new(
            self.origin.0,
            self.origin.1,
            self.pixmap.width() as i32,
            self.pixmap.height() as i32,
        )
    }

    fn layout(&self) -> PixelLayout {
        PixelLayout::Rgba8
    }

    fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }

    fn copy_into(&self, dest: &mut Tile) -> Result<(), TileError> {
        check_layout(PixelLayout::Rgba8, dest)?;
        blit(self.pixmap.data(), self.bounds(), 4, dest);
        Ok(())
    }
}
