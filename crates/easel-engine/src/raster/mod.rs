//! CPU raster surface.
//!
//! A `RasterSurface` is a fixed-size pixel buffer that application code draws
//! into. Every borrow of the drawable handle marks the surface dirty; the
//! compositor uploads dirty surfaces once per frame.

mod drawable;
mod error;
mod format;
mod surface;

pub use drawable::Drawable;
pub use error::AllocationError;
pub use format::PixelFormat;
pub use surface::RasterSurface;
