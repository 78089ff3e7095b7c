use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};

use super::backend::{
    ClearColor, DrawCall, FilterMode, FrameStart, GpuBackend, SamplerConfig, TextureDesc,
    TextureImage, WrapMode,
};
use super::quad::QuadVertex;
use super::shader::{Severity, ShaderDiagnostic, ShaderStage};

/// [`GpuBackend`] on top of wgpu.
///
/// In wgpu the vertex attribute layout lives in the render pipeline, so the
/// compositor's "binding" handle is the texture bind group layout plus sampler,
/// and each texture carries its own bind group.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    viewport: (u32, u32),
    frame: Option<GpuFrame>,
}

pub struct WgpuBinding {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

pub struct WgpuStage {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
    failed: bool,
}

pub struct WgpuTexture {
    desc: TextureDesc,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        let size = gpu.size();
        Self {
            gpu,
            viewport: (size.width, size.height),
            frame: None,
        }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    fn texture_format(&self, desc: TextureDesc) -> wgpu::TextureFormat {
        desc.format.texture_format(self.gpu.surface_format().is_srgb())
    }

    fn allocate_texture(&self, desc: TextureDesc, binding: &WgpuBinding) -> WgpuTexture {
        let device = self.gpu.device();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel surface texture"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.texture_format(desc),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel surface bind group"),
            layout: &binding.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&binding.sampler),
                },
            ],
        });

        WgpuTexture {
            desc,
            texture,
            bind_group,
        }
    }
}

impl<'w> GpuBackend for WgpuBackend<'w> {
    type Buffer = wgpu::Buffer;
    type Binding = WgpuBinding;
    type Stage = WgpuStage;
    type Program = wgpu::RenderPipeline;
    type Texture = WgpuTexture;

    fn max_texture_dimension(&self) -> u32 {
        self.gpu.device().limits().max_texture_dimension_2d
    }

    fn create_vertex_buffer(&mut self, vertices: &[QuadVertex]) -> wgpu::Buffer {
        self.gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("easel quad vbo"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> wgpu::Buffer {
        self.gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("easel quad ibo"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
    }

    fn create_binding(&mut self, sampler: SamplerConfig) -> WgpuBinding {
        let device = self.gpu.device();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("easel surface bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let filter = match sampler.filter {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        };
        let wrap = match sampler.wrap {
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("easel surface sampler"),
            address_mode_u: wrap,
            address_mode_v: wrap,
            address_mode_w: wrap,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        WgpuBinding { layout, sampler }
    }

    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> (WgpuStage, Vec<ShaderDiagnostic>) {
        let label = match stage {
            ShaderStage::Vertex => "easel quad vertex shader",
            ShaderStage::Fragment => "easel quad fragment shader",
        };

        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let info = pollster::block_on(module.get_compilation_info());
        let diagnostics: Vec<ShaderDiagnostic> = info
            .messages
            .into_iter()
            .map(|m| ShaderDiagnostic {
                stage,
                severity: match m.message_type {
                    wgpu::CompilationMessageType::Error => Severity::Error,
                    wgpu::CompilationMessageType::Warning => Severity::Warning,
                    wgpu::CompilationMessageType::Info => Severity::Info,
                },
                message: m.message,
                location: m.location.map(|l| (l.line_number, l.line_position)),
            })
            .collect();

        let failed = diagnostics.iter().any(ShaderDiagnostic::is_error);
        (WgpuStage { stage, module, failed }, diagnostics)
    }

    fn link_program(
        &mut self,
        vertex: WgpuStage,
        fragment: WgpuStage,
        binding: &WgpuBinding,
    ) -> Result<wgpu::RenderPipeline, String> {
        let failed: Vec<String> = [&vertex, &fragment]
            .iter()
            .filter(|s| s.failed)
            .map(|s| format!("{} stage did not compile", s.stage))
            .collect();
        if !failed.is_empty() {
            return Err(failed.join("; "));
        }

        let device = self.gpu.device();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel quad pipeline layout"),
            bind_group_layouts: &[&binding.layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("easel quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(ShaderStage::Vertex.entry_point()),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(ShaderStage::Fragment.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // Stage modules are no longer needed once the pipeline exists.
        drop(vertex);
        drop(fragment);

        Ok(pipeline)
    }

    fn create_texture(&mut self, desc: TextureDesc, binding: &WgpuBinding) -> WgpuTexture {
        self.allocate_texture(desc, binding)
    }

    fn upload_texture(
        &mut self,
        texture: &mut WgpuTexture,
        binding: &WgpuBinding,
        image: TextureImage<'_>,
    ) {
        if texture.desc != image.desc {
            log::debug!(
                "reallocating surface texture {}x{} -> {}x{}",
                texture.desc.width,
                texture.desc.height,
                image.desc.width,
                image.desc.height
            );
            let old = std::mem::replace(texture, self.allocate_texture(image.desc, binding));
            old.texture.destroy();
        }

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.bytes_per_row),
                rows_per_image: Some(image.desc.height),
            },
            wgpu::Extent3d {
                width: image.desc.width,
                height: image.desc.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        if self.gpu.size() != PhysicalSize::new(width, height) {
            self.gpu.resize(PhysicalSize::new(width, height));
        }
    }

    fn begin_frame(&mut self, clear: ClearColor) -> FrameStart {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface error: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => FrameStart::Lost,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        FrameStart::Skip
                    }
                };
            }
        };

        // Clear pass; dropped before the draw pass borrows the encoder.
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("easel clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.frame = Some(frame);
        FrameStart::Ready
    }

    fn draw_indexed(&mut self, call: DrawCall<'_, Self>) {
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("draw issued outside of a frame; ignored");
            return;
        };

        let target = frame.surface_texture.texture.size();
        let width = self.viewport.0.min(target.width);
        let height = self.viewport.1.min(target.height);

        // Pass scope is the binding scope: all state is released when it ends.
        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("easel quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        rpass.set_pipeline(call.program);
        rpass.set_bind_group(0, &call.texture.bind_group, &[]);
        rpass.set_vertex_buffer(0, call.vertex_buffer.slice(..));
        rpass.set_index_buffer(call.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..call.index_count, 0, 0..1);
    }

    fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.gpu.submit(frame);
        }
    }

    fn release_buffer(&mut self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }

    fn release_binding(&mut self, binding: WgpuBinding) {
        drop(binding);
    }

    fn release_program(&mut self, program: wgpu::RenderPipeline) {
        drop(program);
    }

    fn release_texture(&mut self, texture: WgpuTexture) {
        texture.texture.destroy();
    }
}
