use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::compositor::{Compositor, CompositorConfig, CompositorError, FrameStatus, WgpuBackend};
use crate::core::{AppControl, FrameCtx, Sketch, WindowCtx};
use crate::device::{Gpu, GpuInit};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "easel".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `sketch` until the window closes or a
    /// callback returns [`AppControl::Exit`].
    ///
    /// A failure that stops the loop (window or compositor setup, resize,
    /// render) is returned as the error.
    pub fn run<S>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        compositor_config: CompositorConfig,
        sketch: S,
    ) -> Result<()>
    where
        S: Sketch + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, compositor_config, sketch);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.into_result()
    }
}

#[self_referencing]
struct WindowEntry {
    cursor: Option<(f32, f32)>,

    window: Window,

    /// `None` once torn down.
    #[borrows(window)]
    #[not_covariant]
    compositor: Option<Compositor<WgpuBackend<'this>>>,
}

impl WindowEntry {
    fn dispatch<S, F>(&mut self, sketch: &mut S, f: F) -> AppControl
    where
        S: Sketch,
        F: FnOnce(&mut S, &mut FrameCtx<'_>) -> AppControl,
    {
        self.with_mut(|fields| {
            let Some(compositor) = fields.compositor.as_mut() else {
                return AppControl::Continue;
            };
            let mut ctx = FrameCtx::new(
                WindowCtx {
                    id: fields.window.id(),
                    window: fields.window,
                },
                compositor.surface_mut(),
                *fields.cursor,
            );
            f(sketch, &mut ctx)
        })
    }

    fn render(&mut self) -> Result<FrameStatus, CompositorError> {
        self.with_compositor_mut(|c| match c.as_mut() {
            Some(c) => c.render(),
            None => Ok(FrameStatus::Skipped),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), CompositorError> {
        self.with_compositor_mut(|c| match c.as_mut() {
            Some(c) => c.on_framebuffer_resize((size.width, size.height)),
            None => Ok(()),
        })
    }

    fn teardown(&mut self) {
        self.with_compositor_mut(|c| {
            if let Some(c) = c.take() {
                drop(c.teardown());
            }
        });
    }

    fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }
}

fn build_compositor<'w>(
    window: &'w Window,
    gpu_init: GpuInit,
    config: CompositorConfig,
) -> Result<Option<Compositor<WgpuBackend<'w>>>> {
    let gpu = pollster::block_on(Gpu::new(window, gpu_init))?;
    let size = gpu.size();
    let compositor = Compositor::new(WgpuBackend::new(gpu), (size.width, size.height), config)
        .context("failed to set up compositor")?;
    Ok(Some(compositor))
}

/// Framebuffer size an event asks the surface to follow.
///
/// Scale factor changes are followed by a `Resized` carrying the new size, so
/// only that event reallocates the surface.
fn framebuffer_resize(event: &WindowEvent) -> Option<PhysicalSize<u32>> {
    match event {
        WindowEvent::Resized(size) => Some(*size),
        _ => None,
    }
}

struct AppState<S>
where
    S: Sketch + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    compositor_config: CompositorConfig,
    sketch: S,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    /// First error that stopped the loop.
    fatal: Option<anyhow::Error>,
}

impl<S> AppState<S>
where
    S: Sketch + 'static,
{
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        compositor_config: CompositorConfig,
        sketch: S,
    ) -> Self {
        Self {
            config,
            gpu_init,
            compositor_config,
            sketch,
            entry: None,
            exit_requested: false,
            fatal: None,
        }
    }

    /// Keeps the first fatal error; later ones are only logged.
    fn record_fatal(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
    }

    fn into_result(self) -> Result<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let compositor_config = self.compositor_config.clone();

        let entry = WindowEntryTryBuilder {
            cursor: None,
            window,
            compositor_builder: |w| build_compositor(w, gpu_init, compositor_config),
        }
        .try_build()?;

        self.entry = Some(entry);
        Ok(())
    }

    /// Tears the compositor down and stops the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.entry.take() {
            entry.teardown();
            log::info!("window closed");
        }
        self.exit_requested = true;
        event_loop.exit();
    }
}

impl<S> ApplicationHandler for AppState<S>
where
    S: Sketch + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_entry(event_loop) {
            self.record_fatal(e.context("window setup failed"));
            self.shutdown(event_loop);
            return;
        }

        let sketch = &mut self.sketch;
        if let Some(entry) = self.entry.as_mut() {
            entry.dispatch(sketch, |s, ctx| {
                s.on_load(ctx);
                AppControl::Continue
            });
            entry.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // The sketch animates every frame, so redraw continuously.
        if let Some(entry) = self.entry.as_ref() {
            entry.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let (sketch, entry) = (&mut self.sketch, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        let mut fatal = None;
        let control = match &event {
            WindowEvent::CloseRequested => AppControl::Exit,

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                match framebuffer_resize(&event) {
                    Some(new_size) => match entry.resize(new_size) {
                        Ok(()) => {
                            entry.request_redraw();
                            AppControl::Continue
                        }
                        Err(e) => {
                            fatal = Some(anyhow!(e).context(format!(
                                "resize to {}x{} failed",
                                new_size.width, new_size.height
                            )));
                            AppControl::Exit
                        }
                    },
                    None => AppControl::Continue,
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let pos = (position.x as f32, position.y as f32);
                entry.with_cursor_mut(|c| *c = Some(pos));
                AppControl::Continue
            }

            WindowEvent::CursorLeft { .. } => {
                entry.with_cursor_mut(|c| *c = None);
                AppControl::Continue
            }

            WindowEvent::KeyboardInput { event: key, .. } => {
                entry.dispatch(sketch, |s, ctx| s.on_key(ctx, key))
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => entry.dispatch(sketch, |s, ctx| s.on_mouse_down(ctx, *button)),

            WindowEvent::RedrawRequested => {
                match entry.dispatch(sketch, |s, ctx| s.on_frame(ctx)) {
                    AppControl::Exit => AppControl::Exit,
                    AppControl::Continue => match entry.render() {
                        Ok(_) => AppControl::Continue,
                        Err(e) => {
                            fatal = Some(anyhow!(e).context("render failed"));
                            AppControl::Exit
                        }
                    },
                }
            }

            _ => AppControl::Continue,
        };

        if let Some(err) = fatal {
            self.record_fatal(err);
        }
        if control == AppControl::Exit {
            self.shutdown(event_loop);
        }
    }
}
