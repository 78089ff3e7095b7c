//! Contract between the window runtime and the sketch that draws.
//!
//! The runtime owns the event loop and the compositor; a [`Sketch`] only ever
//! sees a [`FrameCtx`] through which it borrows the drawing surface.

mod app;
mod ctx;

pub use app::{AppControl, Sketch};
pub use ctx::{FrameCtx, WindowCtx};
