use std::ops::{Deref, DerefMut};

use super::PixelFormat;

/// Mutable drawing handle into a [`RasterSurface`](super::RasterSurface).
///
/// Obtaining one marks the surface dirty. The handle derefs to the raw pixel
/// bytes (row-major, top row first, no row padding) and can be wrapped as a
/// `tiny_skia::PixmapMut` for shape drawing.
pub struct Drawable<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<'a> Drawable<'a> {
    pub(super) fn new(pixels: &'a mut [u8], width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            pixels,
            width,
            height,
            format,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Resets every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Wraps the buffer for `tiny-skia` drawing.
    ///
    /// `tiny-skia` only rasterizes premultiplied RGBA, so this returns `None`
    /// for [`PixelFormat::Bgra8`] surfaces.
    pub fn pixmap(&mut self) -> Option<tiny_skia::PixmapMut<'_>> {
        if self.format != PixelFormat::Rgba8 {
            return None;
        }
        tiny_skia::PixmapMut::from_bytes(self.pixels, self.width, self.height)
    }
}

impl Deref for Drawable<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.pixels
    }
}

impl DerefMut for Drawable<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use crate::raster::{PixelFormat, RasterSurface};

    #[test]
    fn pixmap_draws_into_surface_bytes() {
        let mut surface = RasterSurface::new(16, 16, PixelFormat::Rgba8).unwrap();

        {
            let mut d = surface.borrow_drawable();
            let mut pixmap = d.pixmap().unwrap();
            pixmap.fill(tiny_skia::Color::WHITE);
        }

        assert!(surface.pixels().iter().all(|&b| b == 0xff));
    }

    #[test]
    fn pixmap_unavailable_for_bgra() {
        let mut surface = RasterSurface::new(4, 4, PixelFormat::Bgra8).unwrap();
        assert!(surface.borrow_drawable().pixmap().is_none());
    }

    #[test]
    fn clear_zeroes_all_bytes() {
        let mut surface = RasterSurface::new(3, 2, PixelFormat::Bgra8).unwrap();
        let mut d = surface.borrow_drawable();
        d.fill(0xaa);
        d.clear();
        assert!(d.iter().all(|&b| b == 0));
        assert_eq!(d.bytes_per_row(), 12);
    }
}
