//! Surface compositor.
//!
//! Maps a [`RasterSurface`](crate::raster::RasterSurface) onto a full-viewport
//! textured quad:
//! - static quad geometry, one sampler binding and one shader program are
//!   created once at construction
//! - the surface is re-uploaded only when it is dirty
//! - one indexed draw per frame
//!
//! The frame logic is written against [`GpuBackend`]; [`WgpuBackend`] is the
//! production implementation.

mod backend;
#[allow(clippy::module_inception)]
mod compositor;
mod error;
mod init;
mod quad;
mod shader;
mod wgpu_backend;

#[cfg(test)]
mod recording;

pub use backend::{
    ClearColor, DrawCall, FilterMode, FrameStart, GpuBackend, SamplerConfig, TextureDesc,
    TextureImage, WrapMode,
};
pub use compositor::{Compositor, FrameStatus};
pub use error::CompositorError;
pub use init::{CompositorConfig, DiagnosticSink};
pub use quad::{QuadVertex, QUAD_INDICES, QUAD_VERTICES};
pub use shader::{
    log_diagnostic, Severity, ShaderDiagnostic, ShaderStage, FRAGMENT_ENTRY, FRAGMENT_WGSL,
    VERTEX_ENTRY, VERTEX_WGSL,
};
pub use wgpu_backend::WgpuBackend;
