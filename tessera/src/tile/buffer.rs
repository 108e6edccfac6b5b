//! Owned pixel buffers for individual tiles.

use crate::geom::PixelRect;

/// Sample layout shared by every tile of one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Four 8-bit channels per pixel (RGBA, straight or premultiplied as the
    /// source defines).
    Rgba8,
    /// One 8-bit luminance channel per pixel.
    Gray8,
}

impl PixelLayout {
    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgba8 => 4,
            PixelLayout::Gray8 => 1,
        }
    }
}

/// Pixel buffer covering one tile's footprint.
///
/// `rect` is the tile's clipped footprint in source pixel space; edge tiles
/// of a grid may be narrower or shorter than the nominal tile size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    rect: PixelRect,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Tile {
    /// Allocate a zero-filled tile for the given footprint.
    pub fn new(rect: PixelRect, layout: PixelLayout) -> Self {
        let len = rect.area() as usize * layout.bytes_per_pixel();
        Self {
            rect,
            layout,
            data: vec![0; len],
        }
    }

    /// Pixel footprint in source space.
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Sample layout of the buffer.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn width(&self) -> u32 {
        self.rect.width.max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.rect.height.max(0) as u32
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width() as usize * self.layout.bytes_per_pixel()
    }

    /// Raw sample bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw sample bytes, row-major.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Size of the sample data in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Bytes of the pixel at absolute source coordinates, if inside the tile.
    pub fn pixel(&self, px: i32, py: i32) -> Option<&[u8]> {
        if !self.rect.contains(px, py) {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let offset = (py - self.rect.y) as usize * self.stride() + (px - self.rect.x) as usize * bpp;
        self.data.get(offset..offset + bpp)
    }

    /// Copy the overlap between this tile and `dest` into `dest`.
    ///
    /// Both buffers must share a layout; pixels of `dest` outside this tile
    /// are left untouched.
    pub fn copy_overlap_into(&self, dest: &mut Tile) {
        debug_assert_eq!(self.layout, dest.layout);
        blit(&self.data, self.rect, self.layout.bytes_per_pixel(), dest);
    }
}

/// Copy pixels from a tightly packed row-major buffer covering `src_rect`
/// into the overlapping part of `dest`.
pub(crate) fn blit(src: &[u8], src_rect: PixelRect, bpp: usize, dest: &mut Tile) {
    let overlap = src_rect.intersection(&dest.rect);
    if overlap.is_empty() {
        return;
    }
    let span = overlap.width as usize * bpp;
    let src_stride = src_rect.width as usize * bpp;
    let dst_stride = dest.stride();
    let sx = (overlap.x - src_rect.x) as usize * bpp;
    let dx = (overlap.x - dest.rect.x) as usize * bpp;
    for row in 0..overlap.height {
        let sy = (overlap.y + row - src_rect.y) as usize;
        let dy = (overlap.y + row - dest.rect.y) as usize;
        let from = sy * src_stride + sx;
        let to = dy * dst_stride + dx;
        dest.data[to..to + span].copy_from_slice(&src[from..from + span]);
    }
}
