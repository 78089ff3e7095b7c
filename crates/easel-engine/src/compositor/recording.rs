//! Counting test double for [`GpuBackend`].

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use super::backend::{
    ClearColor, DrawCall, FrameStart, GpuBackend, SamplerConfig, TextureDesc, TextureImage,
};
use super::quad::QuadVertex;
use super::shader::{ShaderDiagnostic, ShaderStage};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    Clear,
    Upload,
    Draw,
    Present,
}

#[derive(Debug, Default)]
pub struct RecordLog {
    /// Buffers, bindings, programs and textures created / released.
    pub created: u32,
    pub released: u32,

    pub stages_compiled: u32,
    pub stages_consumed: u32,

    /// Sampler of every `create_binding` call.
    pub samplers: Vec<SamplerConfig>,
    /// Clear color of every `begin_frame` call, acquired or not.
    pub clears: Vec<ClearColor>,

    pub uploads: Vec<(u32, u32)>,
    pub texture_reallocations: u32,
    pub viewports: Vec<(u32, u32)>,
    /// Index count of every draw.
    pub draws: Vec<u32>,
    pub events: Vec<Event>,
}

impl RecordLog {
    pub fn live(&self) -> i64 {
        self.created as i64 - self.released as i64
    }

    pub fn count(&self, event: Event) -> usize {
        self.events.iter().filter(|&&e| e == event).count()
    }
}

struct Shared {
    log: RecordLog,
    frame_start: FrameStart,
    max_texture: u32,
    link_error: Option<String>,
    diagnostics: Vec<ShaderDiagnostic>,
    in_frame: bool,
}

/// Backend that records calls instead of touching a GPU.
///
/// Clones share state, so a test keeps one clone as a probe after handing the
/// other to a compositor.
#[derive(Clone)]
pub struct RecordingBackend {
    shared: Rc<RefCell<Shared>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                log: RecordLog::default(),
                frame_start: FrameStart::Ready,
                max_texture: 8192,
                link_error: None,
                diagnostics: Vec::new(),
                in_frame: false,
            })),
        }
    }
}

impl RecordingBackend {
    pub fn with_max_texture(self, max: u32) -> Self {
        self.shared.borrow_mut().max_texture = max;
        self
    }

    pub fn failing_link(self, log: &str) -> Self {
        self.shared.borrow_mut().link_error = Some(log.to_string());
        self
    }

    /// Every compiled stage matching `diagnostic.stage` reports it.
    pub fn with_diagnostic(self, diagnostic: ShaderDiagnostic) -> Self {
        self.shared.borrow_mut().diagnostics.push(diagnostic);
        self
    }

    pub fn set_frame_start(&self, start: FrameStart) {
        self.shared.borrow_mut().frame_start = start;
    }

    pub fn log(&self) -> Ref<'_, RecordLog> {
        Ref::map(self.shared.borrow(), |s| &s.log)
    }

    pub fn log_mut(&self) -> RefMut<'_, RecordLog> {
        RefMut::map(self.shared.borrow_mut(), |s| &mut s.log)
    }

    fn created(&mut self) -> u32 {
        let mut s = self.shared.borrow_mut();
        s.log.created += 1;
        s.log.created
    }

    fn released(&mut self) {
        self.shared.borrow_mut().log.released += 1;
    }
}

pub struct Handle(#[allow(dead_code)] u32);

pub struct StageHandle(ShaderStage);

pub struct TextureHandle {
    size: (u32, u32),
}

impl GpuBackend for RecordingBackend {
    type Buffer = Handle;
    type Binding = Handle;
    type Stage = StageHandle;
    type Program = Handle;
    type Texture = TextureHandle;

    fn max_texture_dimension(&self) -> u32 {
        self.shared.borrow().max_texture
    }

    fn create_vertex_buffer(&mut self, vertices: &[QuadVertex]) -> Handle {
        assert_eq!(vertices.len(), 4);
        Handle(self.created())
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Handle {
        assert_eq!(indices.len(), 6);
        Handle(self.created())
    }

    fn create_binding(&mut self, sampler: SamplerConfig) -> Handle {
        self.shared.borrow_mut().log.samplers.push(sampler);
        Handle(self.created())
    }

    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        _source: &str,
    ) -> (StageHandle, Vec<ShaderDiagnostic>) {
        let mut s = self.shared.borrow_mut();
        s.log.stages_compiled += 1;
        let diagnostics = s
            .diagnostics
            .iter()
            .filter(|d| d.stage == stage)
            .cloned()
            .collect();
        (StageHandle(stage), diagnostics)
    }

    fn link_program(
        &mut self,
        vertex: StageHandle,
        fragment: StageHandle,
        _binding: &Handle,
    ) -> Result<Handle, String> {
        assert_eq!(vertex.0, ShaderStage::Vertex);
        assert_eq!(fragment.0, ShaderStage::Fragment);
        let link_error = {
            let mut s = self.shared.borrow_mut();
            s.log.stages_consumed += 2;
            s.link_error.clone()
        };
        match link_error {
            Some(log) => Err(log),
            None => Ok(Handle(self.created())),
        }
    }

    fn create_texture(&mut self, desc: TextureDesc, _binding: &Handle) -> TextureHandle {
        self.created();
        TextureHandle {
            size: (desc.width, desc.height),
        }
    }

    fn upload_texture(&mut self, texture: &mut TextureHandle, _binding: &Handle, image: TextureImage<'_>) {
        let size = (image.desc.width, image.desc.height);
        assert_eq!(
            image.pixels.len(),
            image.bytes_per_row as usize * image.desc.height as usize
        );

        let mut s = self.shared.borrow_mut();
        if texture.size != size {
            texture.size = size;
            s.log.texture_reallocations += 1;
        }
        s.log.uploads.push(size);
        s.log.events.push(Event::Upload);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.shared.borrow_mut().log.viewports.push((width, height));
    }

    fn begin_frame(&mut self, clear: ClearColor) -> FrameStart {
        let mut s = self.shared.borrow_mut();
        assert!(!s.in_frame, "frame already open");
        s.log.clears.push(clear);
        if s.frame_start == FrameStart::Ready {
            s.in_frame = true;
            s.log.events.push(Event::Clear);
        }
        s.frame_start
    }

    fn draw_indexed(&mut self, call: DrawCall<'_, Self>) {
        let mut s = self.shared.borrow_mut();
        assert!(s.in_frame, "draw outside of a frame");
        s.log.draws.push(call.index_count);
        s.log.events.push(Event::Draw);
    }

    fn end_frame(&mut self) {
        let mut s = self.shared.borrow_mut();
        assert!(s.in_frame, "end_frame without begin_frame");
        s.in_frame = false;
        s.log.events.push(Event::Present);
    }

    fn release_buffer(&mut self, _buffer: Handle) {
        self.released();
    }

    fn release_binding(&mut self, _binding: Handle) {
        self.released();
    }

    fn release_program(&mut self, _program: Handle) {
        self.released();
    }

    fn release_texture(&mut self, _texture: TextureHandle) {
        self.released();
    }
}
