use winit::window::{Window, WindowId};

use crate::raster::{Drawable, RasterSurface};

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Inner size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Context passed to every [`Sketch`](super::Sketch) callback.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    surface: &'a mut RasterSurface,
    cursor: Option<(f32, f32)>,
}

impl<'a> FrameCtx<'a> {
    pub(crate) fn new(
        window: WindowCtx<'a>,
        surface: &'a mut RasterSurface,
        cursor: Option<(f32, f32)>,
    ) -> Self {
        Self {
            window,
            surface,
            cursor,
        }
    }

    /// Drawing handle into the raster surface. Marks it dirty.
    pub fn canvas(&mut self) -> Drawable<'_> {
        self.surface.borrow_drawable()
    }

    /// Surface size in pixels. Does not mark the surface dirty.
    pub fn size(&self) -> (u32, u32) {
        self.surface.size()
    }

    /// Last known cursor position in surface pixels, if the cursor is inside
    /// the window.
    pub fn cursor(&self) -> Option<(f32, f32)> {
        self.cursor
    }
}
