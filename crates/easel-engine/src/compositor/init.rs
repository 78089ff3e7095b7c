use std::fmt;
use std::sync::Arc;

use crate::raster::PixelFormat;

use super::backend::{ClearColor, SamplerConfig};
use super::shader::{log_diagnostic, ShaderDiagnostic};

/// Receives every shader compiler message produced at construction.
pub type DiagnosticSink = Arc<dyn Fn(&ShaderDiagnostic) + Send + Sync>;

/// Compositor configuration.
#[derive(Clone)]
pub struct CompositorConfig {
    /// Background the color buffer is cleared to before the quad is drawn.
    pub clear_color: ClearColor,

    /// Byte layout of the raster surface (and of the texture it is uploaded to).
    pub pixel_format: PixelFormat,

    /// Texture sampling. Linear filtering with clamp-to-edge wrapping by default
    /// so edge texels never blend with the opposite side of the image.
    pub sampler: SamplerConfig,

    /// Shader compiler message sink. Defaults to the `log` facade.
    pub diagnostics: DiagnosticSink,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            clear_color: ClearColor::BLACK,
            pixel_format: PixelFormat::default(),
            sampler: SamplerConfig::default(),
            diagnostics: Arc::new(log_diagnostic),
        }
    }
}

impl fmt::Debug for CompositorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositorConfig")
            .field("clear_color", &self.clear_color)
            .field("pixel_format", &self.pixel_format)
            .field("sampler", &self.sampler)
            .finish_non_exhaustive()
    }
}
