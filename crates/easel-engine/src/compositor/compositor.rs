use crate::raster::{AllocationError, Drawable, RasterSurface};

use super::backend::{DrawCall, FrameStart, GpuBackend, TextureDesc, TextureImage};
use super::error::CompositorError;
use super::init::{CompositorConfig, DiagnosticSink};
use super::quad::{QUAD_INDICES, QUAD_VERTICES};
use super::shader::ShaderStage;

/// Result of a [`Compositor::render`] call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// The quad was drawn and presented. `uploaded` is true when the surface
    /// was dirty and its pixels were sent to the texture this frame.
    Presented { uploaded: bool },
    /// No frame could be acquired; the surface stays dirty if it was.
    Skipped,
}

/// GPU objects owned by a compositor. Created together, released together.
struct GpuResources<B: GpuBackend> {
    vertex_buffer: B::Buffer,
    index_buffer: B::Buffer,
    binding: B::Binding,
    program: B::Program,
    texture: B::Texture,
}

/// Displays a [`RasterSurface`] through a full-viewport textured quad.
///
/// Lifecycle: [`new`](Self::new) → any number of [`render`](Self::render) /
/// [`on_framebuffer_resize`](Self::on_framebuffer_resize) →
/// [`teardown`](Self::teardown).
pub struct Compositor<B: GpuBackend> {
    backend: B,
    resources: GpuResources<B>,
    surface: RasterSurface,
    viewport: (u32, u32),
    config: CompositorConfig,
}

impl<B: GpuBackend> Compositor<B> {
    /// Allocates the surface and every GPU object, then uploads the initial
    /// (blank) surface.
    ///
    /// Sizes are validated before the first GPU call, so an allocation failure
    /// leaves nothing behind. A link failure releases what was already created.
    pub fn new(
        mut backend: B,
        viewport: (u32, u32),
        config: CompositorConfig,
    ) -> Result<Self, CompositorError> {
        let (width, height) = viewport;
        check_texture_limit(&backend, width, height)?;
        let mut surface = RasterSurface::new(width, height, config.pixel_format)?;

        let vertex_buffer = backend.create_vertex_buffer(&QUAD_VERTICES);
        let index_buffer = backend.create_index_buffer(&QUAD_INDICES);
        let binding = backend.create_binding(config.sampler);

        let program = match build_program(&mut backend, &binding, &config.diagnostics) {
            Ok(program) => program,
            Err(e) => {
                backend.release_binding(binding);
                backend.release_buffer(index_buffer);
                backend.release_buffer(vertex_buffer);
                return Err(e);
            }
        };

        let mut texture = backend.create_texture(TextureDesc::of(&surface), &binding);
        backend.upload_texture(&mut texture, &binding, TextureImage::from_surface(&surface));
        surface.clear_dirty();

        backend.set_viewport(width, height);

        log::info!(
            "compositor ready: {width}x{height} {:?} surface",
            config.pixel_format
        );

        Ok(Self {
            backend,
            resources: GpuResources {
                vertex_buffer,
                index_buffer,
                binding,
                program,
                texture,
            },
            surface,
            viewport,
            config,
        })
    }

    /// Drawing handle into the surface. Marks it dirty.
    pub fn drawable(&mut self) -> Drawable<'_> {
        self.surface.borrow_drawable()
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// Mutable surface access for the runtime, which hands out drawing
    /// handles through `FrameCtx`.
    pub(crate) fn surface_mut(&mut self) -> &mut RasterSurface {
        &mut self.surface
    }

    /// Current viewport in physical pixels.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Draws one frame.
    ///
    /// Clears, uploads the surface if dirty (at most once per dirty period),
    /// then issues a single indexed draw of the quad.
    pub fn render(&mut self) -> Result<FrameStatus, CompositorError> {
        match self.backend.begin_frame(self.config.clear_color) {
            FrameStart::Ready => {}
            FrameStart::Skip => {
                log::trace!("frame skipped");
                return Ok(FrameStatus::Skipped);
            }
            FrameStart::Lost => return Err(CompositorError::DeviceLost),
        }

        let uploaded = self.upload_if_dirty();

        let res = &self.resources;
        self.backend.draw_indexed(DrawCall {
            vertex_buffer: &res.vertex_buffer,
            index_buffer: &res.index_buffer,
            binding: &res.binding,
            program: &res.program,
            texture: &res.texture,
            index_count: QUAD_INDICES.len() as u32,
        });

        self.backend.end_frame();

        Ok(FrameStatus::Presented { uploaded })
    }

    /// Follows a framebuffer size change.
    ///
    /// The surface is reallocated at the new size (contents are lost) and the
    /// next [`render`](Self::render) uploads it. A zero-sized framebuffer, as
    /// reported for minimized windows, is ignored.
    pub fn on_framebuffer_resize(&mut self, size: (u32, u32)) -> Result<(), CompositorError> {
        let (width, height) = size;
        if width == 0 || height == 0 {
            log::debug!("ignoring zero-sized framebuffer {width}x{height}");
            return Ok(());
        }

        check_texture_limit(&self.backend, width, height)?;
        self.surface.resize(width, height)?;

        self.backend.set_viewport(width, height);
        self.viewport = size;

        log::debug!("framebuffer resized to {width}x{height}");
        Ok(())
    }

    /// Releases every GPU object and returns the backend.
    pub fn teardown(self) -> B {
        let Self {
            mut backend,
            resources,
            ..
        } = self;

        backend.release_texture(resources.texture);
        backend.release_program(resources.program);
        backend.release_binding(resources.binding);
        backend.release_buffer(resources.index_buffer);
        backend.release_buffer(resources.vertex_buffer);

        log::debug!("compositor resources released");
        backend
    }

    fn upload_if_dirty(&mut self) -> bool {
        if !self.surface.is_dirty() {
            return false;
        }

        let image = TextureImage::from_surface(&self.surface);
        log::trace!("uploading {}x{} surface", image.desc.width, image.desc.height);

        let res = &mut self.resources;
        self.backend.upload_texture(&mut res.texture, &res.binding, image);
        self.surface.clear_dirty();
        true
    }
}

fn check_texture_limit<B: GpuBackend>(
    backend: &B,
    width: u32,
    height: u32,
) -> Result<(), AllocationError> {
    let max = backend.max_texture_dimension();
    if width > max || height > max {
        return Err(AllocationError::TooLarge { width, height });
    }
    Ok(())
}

fn build_program<B: GpuBackend>(
    backend: &mut B,
    binding: &B::Binding,
    sink: &DiagnosticSink,
) -> Result<B::Program, CompositorError> {
    let vertex = compile(backend, ShaderStage::Vertex, sink);
    let fragment = compile(backend, ShaderStage::Fragment, sink);

    backend
        .link_program(vertex, fragment, binding)
        .map_err(|log| CompositorError::ShaderLink { log })
}

fn compile<B: GpuBackend>(backend: &mut B, stage: ShaderStage, sink: &DiagnosticSink) -> B::Stage {
    let (compiled, diagnostics) = backend.compile_stage(stage, stage.source());
    for d in &diagnostics {
        sink(d);
    }
    compiled
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::compositor::recording::{Event, RecordingBackend};
    use crate::compositor::{
        ClearColor, FilterMode, SamplerConfig, Severity, ShaderDiagnostic, WrapMode,
    };

    fn compositor(w: u32, h: u32) -> (Compositor<RecordingBackend>, RecordingBackend) {
        let backend = RecordingBackend::default();
        let probe = backend.clone();
        let c = Compositor::new(backend, (w, h), CompositorConfig::default()).unwrap();
        {
            let mut log = probe.log_mut();
            log.events.clear();
            log.uploads.clear();
        }
        (c, probe)
    }

    fn draw_circle(c: &mut Compositor<RecordingBackend>) {
        let mut d = c.drawable();
        let mut pixmap = d.pixmap().unwrap();
        let circle = tiny_skia::PathBuilder::from_circle(400.0, 300.0, 5.0).unwrap();
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(255, 255, 255, 100);
        pixmap.fill_path(
            &circle,
            &paint,
            tiny_skia::FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn new_uploads_initial_surface_and_sets_viewport() {
        let backend = RecordingBackend::default();
        let probe = backend.clone();
        let c = Compositor::new(backend, (800, 600), CompositorConfig::default()).unwrap();

        let log = probe.log();
        assert_eq!(log.uploads, vec![(800, 600)]);
        assert_eq!(log.viewports, vec![(800, 600)]);
        assert_eq!(log.live(), 5);
        assert!(!c.surface().is_dirty());
    }

    #[test]
    fn zero_size_fails_before_any_gpu_call() {
        for size in [(0, 600), (800, 0)] {
            let backend = RecordingBackend::default();
            let probe = backend.clone();

            let err = Compositor::new(backend, size, CompositorConfig::default()).err().unwrap();

            assert!(matches!(
                err,
                CompositorError::Allocation(AllocationError::ZeroSize { .. })
            ));
            let log = probe.log();
            assert_eq!(log.created, 0);
            assert_eq!(log.released, 0);
        }
    }

    #[test]
    fn oversized_surface_is_rejected() {
        let backend = RecordingBackend::default().with_max_texture(1024);
        let probe = backend.clone();

        let err = Compositor::new(backend, (2048, 16), CompositorConfig::default()).err().unwrap();

        assert!(matches!(
            err,
            CompositorError::Allocation(AllocationError::TooLarge { width: 2048, height: 16 })
        ));
        assert_eq!(probe.log().created, 0);
    }

    #[test]
    fn link_failure_releases_partial_resources() {
        let backend = RecordingBackend::default().failing_link("missing entry point");
        let probe = backend.clone();

        let err = Compositor::new(backend, (64, 64), CompositorConfig::default()).err().unwrap();

        match err {
            CompositorError::ShaderLink { log } => assert_eq!(log, "missing entry point"),
            other => panic!("unexpected error: {other:?}"),
        }
        let log = probe.log();
        assert!(log.created > 0);
        assert_eq!(log.created, log.released);
        assert_eq!(log.stages_compiled, log.stages_consumed);
    }

    #[test]
    fn compiler_warnings_reach_sink_and_do_not_fail() {
        let warning = ShaderDiagnostic {
            stage: ShaderStage::Fragment,
            severity: Severity::Warning,
            message: "unused binding".to_string(),
            location: Some((1, 1)),
        };
        let backend = RecordingBackend::default().with_diagnostic(warning.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let config = CompositorConfig {
            diagnostics: Arc::new(move |d: &ShaderDiagnostic| {
                sink_seen.lock().unwrap().push(d.clone())
            }),
            ..CompositorConfig::default()
        };

        assert!(Compositor::new(backend, (4, 4), config).is_ok());
        assert_eq!(*seen.lock().unwrap(), vec![warning]);
    }

    #[test]
    fn default_binding_samples_linear_clamped() {
        let (_c, probe) = compositor(16, 16);

        assert_eq!(
            probe.log().samplers,
            vec![SamplerConfig {
                filter: FilterMode::Linear,
                wrap: WrapMode::ClampToEdge,
            }]
        );
    }

    #[test]
    fn configured_sampler_reaches_binding() {
        let backend = RecordingBackend::default();
        let probe = backend.clone();
        let sampler = SamplerConfig {
            filter: FilterMode::Nearest,
            wrap: WrapMode::Repeat,
        };
        let config = CompositorConfig {
            sampler,
            ..CompositorConfig::default()
        };

        Compositor::new(backend, (8, 8), config).unwrap();

        assert_eq!(probe.log().samplers, vec![sampler]);
    }

    // ── render / dirty tracking ───────────────────────────────────────────

    #[test]
    fn render_uploads_only_when_dirty() {
        let (mut c, probe) = compositor(32, 32);

        assert_eq!(c.render().unwrap(), FrameStatus::Presented { uploaded: false });

        let _ = c.drawable();
        assert!(c.surface().is_dirty());
        assert_eq!(c.render().unwrap(), FrameStatus::Presented { uploaded: true });
        assert!(!c.surface().is_dirty());

        assert_eq!(c.render().unwrap(), FrameStatus::Presented { uploaded: false });
        assert_eq!(probe.log().count(Event::Upload), 1);
        assert_eq!(probe.log().draws, vec![6, 6, 6]);
    }

    #[test]
    fn many_borrows_between_frames_upload_once() {
        let (mut c, probe) = compositor(16, 16);

        for _ in 0..10 {
            c.drawable()[0] = 0xff;
        }
        c.render().unwrap();

        assert_eq!(probe.log().count(Event::Upload), 1);
    }

    #[test]
    fn frame_order_is_clear_upload_draw_present() {
        let (mut c, probe) = compositor(8, 8);
        let _ = c.drawable();

        c.render().unwrap();

        assert_eq!(
            probe.log().events,
            vec![Event::Clear, Event::Upload, Event::Draw, Event::Present]
        );
    }

    #[test]
    fn skipped_frame_keeps_surface_dirty() {
        let (mut c, probe) = compositor(8, 8);
        let _ = c.drawable();

        probe.set_frame_start(FrameStart::Skip);
        assert_eq!(c.render().unwrap(), FrameStatus::Skipped);
        assert!(c.surface().is_dirty());
        assert_eq!(probe.log().count(Event::Upload), 0);

        probe.set_frame_start(FrameStart::Ready);
        assert_eq!(c.render().unwrap(), FrameStatus::Presented { uploaded: true });
    }

    #[test]
    fn lost_device_is_an_error() {
        let (mut c, probe) = compositor(8, 8);
        probe.set_frame_start(FrameStart::Lost);
        assert!(matches!(c.render(), Err(CompositorError::DeviceLost)));
        assert_eq!(probe.log().draws.len(), 0);
    }

    #[test]
    fn every_frame_clears_to_opaque_black_by_default() {
        let (mut c, probe) = compositor(8, 8);

        c.render().unwrap();
        probe.set_frame_start(FrameStart::Skip);
        c.render().unwrap();
        probe.set_frame_start(FrameStart::Ready);
        c.render().unwrap();

        assert_eq!(probe.log().clears, vec![ClearColor::BLACK; 3]);
        assert_eq!(ClearColor::BLACK, ClearColor::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn configured_clear_color_reaches_frames() {
        let backend = RecordingBackend::default();
        let probe = backend.clone();
        let grey = ClearColor::new(0.2, 0.2, 0.2, 1.0);
        let config = CompositorConfig {
            clear_color: grey,
            ..CompositorConfig::default()
        };
        let mut c = Compositor::new(backend, (8, 8), config).unwrap();

        c.render().unwrap();
        c.render().unwrap();

        assert_eq!(probe.log().clears, vec![grey, grey]);
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_marks_dirty_and_updates_viewport() {
        let (mut c, probe) = compositor(100, 100);
        c.drawable().fill(0x40);
        c.render().unwrap();

        c.on_framebuffer_resize((200, 50)).unwrap();

        assert!(c.surface().is_dirty());
        assert_eq!(c.surface().byte_len(), 200 * 50 * 4);
        assert!(c.surface().pixels().iter().all(|&b| b == 0));
        assert_eq!(c.viewport(), (200, 50));
        assert_eq!(probe.log().viewports.last(), Some(&(200, 50)));
    }

    #[test]
    fn zero_sized_framebuffer_is_ignored() {
        let (mut c, probe) = compositor(100, 80);

        c.on_framebuffer_resize((0, 0)).unwrap();

        assert_eq!(c.viewport(), (100, 80));
        assert_eq!(c.surface().size(), (100, 80));
        assert_eq!(probe.log().viewports, vec![(100, 80)]);
    }

    #[test]
    fn oversized_resize_keeps_previous_state() {
        let backend = RecordingBackend::default().with_max_texture(512);
        let mut c = Compositor::new(backend, (256, 256), CompositorConfig::default()).unwrap();

        let err = c.on_framebuffer_resize((1024, 256)).unwrap_err();

        assert!(matches!(err, CompositorError::Allocation(AllocationError::TooLarge { .. })));
        assert_eq!(c.surface().size(), (256, 256));
        assert_eq!(c.viewport(), (256, 256));
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn teardown_releases_everything() {
        let (mut c, probe) = compositor(64, 48);
        let _ = c.drawable();
        c.render().unwrap();
        c.on_framebuffer_resize((32, 32)).unwrap();
        c.render().unwrap();

        let _backend = c.teardown();

        let log = probe.log();
        assert_eq!(log.created, 5);
        assert_eq!(log.released, 5);
        assert_eq!(log.live(), 0);
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn draw_render_resize_scenario() {
        let (mut c, probe) = compositor(800, 600);

        draw_circle(&mut c);
        c.render().unwrap();
        {
            let log = probe.log();
            assert_eq!(log.uploads, vec![(800, 600)]);
            assert_eq!(log.draws, vec![6]);
        }
        // The circle landed in the uploaded buffer.
        let center = (300 * 800 + 400) * 4;
        assert_ne!(c.surface().pixels()[center + 3], 0);

        c.render().unwrap();
        {
            let log = probe.log();
            assert_eq!(log.uploads.len(), 1);
            assert_eq!(log.draws, vec![6, 6]);
        }

        c.on_framebuffer_resize((1024, 768)).unwrap();
        c.render().unwrap();
        {
            let log = probe.log();
            assert_eq!(log.uploads, vec![(800, 600), (1024, 768)]);
            assert_eq!(log.texture_reallocations, 1);
            assert_eq!(log.viewports.last(), Some(&(1024, 768)));
            assert_eq!(log.draws, vec![6, 6, 6]);
        }
    }
}
