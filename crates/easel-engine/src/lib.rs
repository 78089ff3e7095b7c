//! Easel engine crate.
//!
//! Draw into a CPU raster surface, see it on screen: the surface is uploaded
//! to a GPU texture when dirty and drawn as one full-viewport quad per frame.

pub mod compositor;
pub mod core;
pub mod device;
pub mod logging;
pub mod raster;
pub mod window;
