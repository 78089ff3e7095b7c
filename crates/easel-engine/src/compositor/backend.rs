use crate::raster::{PixelFormat, RasterSurface};

use super::quad::QuadVertex;
use super::shader::{ShaderDiagnostic, ShaderStage};

/// Graphics API seam used by [`Compositor`](super::Compositor).
///
/// Handles are owned values: every `create_*` result is handed back through
/// exactly one `release_*` call (or consumed by `link_program` for stages).
/// All calls happen on the thread that owns the graphics context.
pub trait GpuBackend {
    type Buffer;
    type Binding;
    type Stage;
    type Program;
    type Texture;

    /// Largest texture edge the device accepts.
    fn max_texture_dimension(&self) -> u32;

    fn create_vertex_buffer(&mut self, vertices: &[QuadVertex]) -> Self::Buffer;

    fn create_index_buffer(&mut self, indices: &[u16]) -> Self::Buffer;

    /// Creates the texture binding state (layout + sampler).
    fn create_binding(&mut self, sampler: SamplerConfig) -> Self::Binding;

    /// Compiles one stage. Compiler messages are returned, never raised.
    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> (Self::Stage, Vec<ShaderDiagnostic>);

    /// Links both stages into a program with source-alpha blending.
    ///
    /// The stages are consumed whether or not linking succeeds. On failure the
    /// link log is returned.
    fn link_program(
        &mut self,
        vertex: Self::Stage,
        fragment: Self::Stage,
        binding: &Self::Binding,
    ) -> Result<Self::Program, String>;

    fn create_texture(&mut self, desc: TextureDesc, binding: &Self::Binding) -> Self::Texture;

    /// Uploads the whole image.
    ///
    /// When the image size differs from the texture store, the store is
    /// reallocated first.
    fn upload_texture(
        &mut self,
        texture: &mut Self::Texture,
        binding: &Self::Binding,
        image: TextureImage<'_>,
    );

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Starts a frame and clears the color buffer.
    fn begin_frame(&mut self, clear: ClearColor) -> FrameStart;

    /// Binds vertex state, program and texture, draws, then unbinds.
    fn draw_indexed(&mut self, call: DrawCall<'_, Self>);

    fn end_frame(&mut self);

    fn release_buffer(&mut self, buffer: Self::Buffer);
    fn release_binding(&mut self, binding: Self::Binding);
    fn release_program(&mut self, program: Self::Program);
    fn release_texture(&mut self, texture: Self::Texture);
}

/// Outcome of [`GpuBackend::begin_frame`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStart {
    /// A frame is open; draw calls may follow.
    Ready,
    /// Transient failure; nothing is open for this tick.
    Skip,
    /// The device cannot present anymore.
    Lost,
}

/// Everything one indexed draw needs.
pub struct DrawCall<'a, B: GpuBackend + ?Sized> {
    pub vertex_buffer: &'a B::Buffer,
    pub index_buffer: &'a B::Buffer,
    pub binding: &'a B::Binding,
    pub program: &'a B::Program,
    pub texture: &'a B::Texture,
    pub index_count: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl TextureDesc {
    pub fn of(surface: &RasterSurface) -> Self {
        Self {
            width: surface.width(),
            height: surface.height(),
            format: surface.format(),
        }
    }
}

/// Borrowed pixel data for one upload. Rows are tightly packed.
#[derive(Debug, Copy, Clone)]
pub struct TextureImage<'a> {
    pub desc: TextureDesc,
    pub bytes_per_row: u32,
    pub pixels: &'a [u8],
}

impl<'a> TextureImage<'a> {
    pub fn from_surface(surface: &'a RasterSurface) -> Self {
        Self {
            desc: TextureDesc::of(surface),
            bytes_per_row: surface.bytes_per_row() as u32,
            pixels: surface.pixels(),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SamplerConfig {
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

/// Straight-alpha clear color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const BLACK: ClearColor = ClearColor { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    #[inline]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<ClearColor> for wgpu::Color {
    fn from(c: ClearColor) -> Self {
        wgpu::Color { r: c.r, g: c.g, b: c.b, a: c.a }
    }
}
