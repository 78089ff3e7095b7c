//! The demo sketch: a dot per frame, a label per key, a square per click.

use easel_engine::core::{AppControl, FrameCtx, Sketch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiny_skia::{FillRule, Paint, PathBuilder, PixmapMut, Rect, Transform};
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::text::TextPainter;

const DOT_RADIUS: f32 = 5.0;
const DOT_ALPHA: u8 = 100;
const SQUARE_SIZE: f32 = 50.0;
const SQUARE_ALPHA: u8 = 100;
const LABEL_PX: f32 = 24.0;
const LABEL_ALPHA: u8 = 255;

pub struct Doodle {
    rng: StdRng,
    text: Option<TextPainter>,
}

impl Doodle {
    pub fn new(text: Option<TextPainter>) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            text,
        }
    }

    fn random_point(&mut self, (w, h): (u32, u32)) -> (f32, f32) {
        (
            self.rng.gen_range(0..w.max(1)) as f32,
            self.rng.gen_range(0..h.max(1)) as f32,
        )
    }
}

impl Sketch for Doodle {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let (x, y) = self.random_point(ctx.size());

        let mut canvas = ctx.canvas();
        if let Some(mut pixmap) = canvas.pixmap() {
            fill_circle(&mut pixmap, x, y, DOT_RADIUS, DOT_ALPHA);
        }

        AppControl::Continue
    }

    fn on_key(&mut self, ctx: &mut FrameCtx<'_>, event: &KeyEvent) -> AppControl {
        if event.state != ElementState::Pressed {
            return AppControl::Continue;
        }

        let label = key_label(event.physical_key);
        log::info!("key down: {label} ({:?})", event.physical_key);

        let (x, y) = self.random_point(ctx.size());
        let mut canvas = ctx.canvas();

        if let (Some(text), Some(mut pixmap)) = (self.text.as_ref(), canvas.pixmap()) {
            text.draw_centered(&mut pixmap, &label, x, y, LABEL_PX, LABEL_ALPHA);
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::F1) => {
                canvas.clear();
                AppControl::Continue
            }
            PhysicalKey::Code(KeyCode::Escape) => AppControl::Exit,
            _ => AppControl::Continue,
        }
    }

    fn on_mouse_down(&mut self, ctx: &mut FrameCtx<'_>, button: MouseButton) -> AppControl {
        let (x, y) = press_position(ctx.cursor());
        log::info!("mouse down: {button:?} at ({x}, {y})");

        let mut canvas = ctx.canvas();
        if let Some(mut pixmap) = canvas.pixmap() {
            fill_square(&mut pixmap, x, y, SQUARE_SIZE, SQUARE_ALPHA);
        }

        AppControl::Continue
    }
}

/// Human-readable key name: `KeyA` → `A`, `Digit1` → `1`, `F1` → `F1`.
fn key_label(key: PhysicalKey) -> String {
    match key {
        PhysicalKey::Code(code) => {
            let name = format!("{code:?}");
            match name.strip_prefix("Key").or_else(|| name.strip_prefix("Digit")) {
                Some(short) if !short.is_empty() => short.to_string(),
                _ => name,
            }
        }
        PhysicalKey::Unidentified(_) => "Unknown".to_string(),
    }
}

/// Where a click lands: the last cursor position, or the window origin when
/// no cursor move has been reported yet.
fn press_position(cursor: Option<(f32, f32)>) -> (f32, f32) {
    cursor.unwrap_or((0.0, 0.0))
}

fn white(alpha: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, alpha);
    paint.anti_alias = true;
    paint
}

fn fill_circle(pixmap: &mut PixmapMut<'_>, x: f32, y: f32, radius: f32, alpha: u8) {
    if let Some(path) = PathBuilder::from_circle(x, y, radius) {
        pixmap.fill_path(&path, &white(alpha), FillRule::Winding, Transform::identity(), None);
    }
}

fn fill_square(pixmap: &mut PixmapMut<'_>, x: f32, y: f32, size: f32, alpha: u8) {
    if let Some(rect) = Rect::from_xywh(x, y, size, size) {
        pixmap.fill_rect(rect, &white(alpha), Transform::identity(), None);
    }
}
