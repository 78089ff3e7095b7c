use winit::event::{KeyEvent, MouseButton};

use super::ctx::FrameCtx;

/// Control directive returned by sketch callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by drawing code.
///
/// Every callback receives a [`FrameCtx`]; borrowing its canvas marks the
/// surface for re-upload on the next rendered frame.
pub trait Sketch {
    /// Called once, after the window and compositor exist.
    fn on_load(&mut self, ctx: &mut FrameCtx<'_>) {
        let _ = ctx;
    }

    /// Called for keyboard input (presses, releases and repeats).
    fn on_key(&mut self, ctx: &mut FrameCtx<'_>, event: &KeyEvent) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }

    /// Called when a mouse button is pressed. The cursor position is
    /// available through [`FrameCtx::cursor`].
    fn on_mouse_down(&mut self, ctx: &mut FrameCtx<'_>, button: MouseButton) -> AppControl {
        let _ = (ctx, button);
        AppControl::Continue
    }

    /// Called once per frame, before the surface is composited.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
