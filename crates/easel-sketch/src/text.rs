//! Text drawing for the sketch: fontdue rasterizes glyphs, tiny-skia
//! composites them onto the canvas.

use std::path::Path;

use tiny_skia::{PixmapMut, PixmapPaint, PremultipliedColorU8, Transform};

const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct TextPainter {
    font: fontdue::Font,
}

impl TextPainter {
    /// Loads the first readable font from the usual system locations.
    pub fn from_system_font() -> Option<Self> {
        let painter = load_first(FONT_PATHS.iter().map(Path::new));
        match &painter {
            Some(_) => log::debug!("text font loaded"),
            None => log::warn!("no system font found; key labels will not be drawn"),
        }
        painter
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()) {
            Ok(font) => Some(Self { font }),
            Err(e) => {
                log::warn!("font parse error: {e}");
                None
            }
        }
    }

    /// Horizontal advance of `text` at `px` pixels.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, px).advance_width)
            .sum()
    }

    /// Draws `text` horizontally centred on `cx` with its baseline at
    /// `baseline`, in white at the given alpha.
    pub fn draw_centered(
        &self,
        pixmap: &mut PixmapMut<'_>,
        text: &str,
        cx: f32,
        baseline: f32,
        px: f32,
        alpha: u8,
    ) {
        let mut pen_x = cx - self.measure(text, px) / 2.0;

        for c in text.chars() {
            let (metrics, coverage) = self.font.rasterize(c, px);

            if let Some(glyph) = glyph_pixmap(metrics.width as u32, metrics.height as u32, &coverage, alpha) {
                let x = pen_x + metrics.xmin as f32;
                let y = baseline - metrics.height as f32 - metrics.ymin as f32;
                pixmap.draw_pixmap(
                    x.round() as i32,
                    y.round() as i32,
                    glyph.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }

            pen_x += metrics.advance_width;
        }
    }
}

fn load_first<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Option<TextPainter> {
    paths
        .into_iter()
        .filter_map(|p| std::fs::read(p).ok())
        .find_map(|bytes| TextPainter::from_bytes(&bytes))
}

/// White glyph with `coverage` scaled by `alpha`, premultiplied.
///
/// Returns `None` for empty glyphs (spaces).
fn glyph_pixmap(width: u32, height: u32, coverage: &[u8], alpha: u8) -> Option<tiny_skia::Pixmap> {
    let mut glyph = tiny_skia::Pixmap::new(width, height)?;
    for (dst, &cov) in glyph.pixels_mut().iter_mut().zip(coverage) {
        let a = ((cov as u16 * alpha as u16 + 127) / 255) as u8;
        if let Some(px) = PremultipliedColorU8::from_rgba(a, a, a, a) {
            *dst = px;
        }
    }
    Some(glyph)
}
