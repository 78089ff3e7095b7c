use super::{AllocationError, Drawable, PixelFormat};

/// Fixed-size CPU pixel buffer with conservative dirty tracking.
///
/// Invariant: `pixels.len() == width * height * format.bytes_per_pixel()`.
///
/// The surface cannot tell whether a caller actually wrote through the
/// drawable handle, so every [`borrow_drawable`](Self::borrow_drawable) marks it
/// dirty.
#[derive(Debug)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
    dirty: bool,
}

impl RasterSurface {
    /// Allocates a zeroed (transparent black) surface.
    ///
    /// A fresh surface is dirty: its contents have never been uploaded.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, AllocationError> {
        let pixels = alloc_zeroed(width, height, format)?;
        Ok(Self {
            width,
            height,
            format,
            pixels,
            dirty: true,
        })
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
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// Read-only view of the pixels. Does not mark the surface dirty.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns a mutable drawing handle and marks the surface dirty.
    pub fn borrow_drawable(&mut self) -> Drawable<'_> {
        self.dirty = true;
        Drawable::new(&mut self.pixels, self.width, self.height, self.format)
    }

    /// Replaces the buffer with a zeroed one of the new size.
    ///
    /// Previous contents are discarded. On error the surface is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), AllocationError> {
        let pixels = alloc_zeroed(width, height, self.format)?;
        self.pixels = pixels;
        self.width = width;
        self.height = height;
        self.dirty = true;
        Ok(())
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Only the compositor clears the flag, right after an upload.
    #[inline]
    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

fn byte_len(width: u32, height: u32, format: PixelFormat) -> Result<usize, AllocationError> {
    if width == 0 || height == 0 {
        return Err(AllocationError::ZeroSize { width, height });
    }

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(format.bytes_per_pixel()))
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or(AllocationError::TooLarge { width, height })
}

fn alloc_zeroed(width: u32, height: u32, format: PixelFormat) -> Result<Vec<u8>, AllocationError> {
    let len = byte_len(width, height, format)?;

    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| AllocationError::OutOfMemory { width, height })?;
    pixels.resize(len, 0);

    Ok(pixels)
}
