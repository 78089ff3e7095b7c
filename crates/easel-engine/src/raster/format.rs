/// Byte layout of a raster surface.
///
/// Both layouts are 8 bits per channel, 4 bytes per pixel, premultiplied alpha.
/// The GPU texture is created with the matching byte order so uploads are a
/// straight copy.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// R, G, B, A. The layout `tiny-skia` rasterizes into.
    #[default]
    Rgba8,
    /// B, G, R, A.
    Bgra8,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        4
    }

    /// Texture format with the same byte order.
    ///
    /// `srgb` selects the sRGB-decoding variant, used when the swapchain itself
    /// is sRGB so that the encoded bytes reach the screen unchanged.
    pub fn texture_format(self, srgb: bool) -> wgpu::TextureFormat {
        match (self, srgb) {
            (PixelFormat::Rgba8, false) => wgpu::TextureFormat::Rgba8Unorm,
            (PixelFormat::Rgba8, true) => wgpu::TextureFormat::Rgba8UnormSrgb,
            (PixelFormat::Bgra8, false) => wgpu::TextureFormat::Bgra8Unorm,
            (PixelFormat::Bgra8, true) => wgpu::TextureFormat::Bgra8UnormSrgb,
        }
    }
}
