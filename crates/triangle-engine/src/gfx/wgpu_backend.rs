use std::ops::Range;

use anyhow::{Context, Result};
use slotmap::SlotMap;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};

use super::backend::GfxBackend;
use super::types::{
    Backend, Bindings, BufferDesc, BufferHandle, BufferUsage, LoadAction, Pass, PipelineDesc,
    PipelineHandle, PrimitiveType, ShaderDesc, ShaderHandle, Swapchain, VertexFormat,
};

struct Shader {
    module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
}

/// Commands recorded between `begin_pass` and `end_pass`.
enum PassCommand {
    ApplyPipeline(PipelineHandle),
    ApplyBindings(Bindings),
    Draw { base_element: u32, num_elements: u32, num_instances: u32 },
}

struct OpenPass {
    pass: Pass,
    commands: Vec<PassCommand>,
}

/// [`GfxBackend`] rendering to a window surface through wgpu.
///
/// Pass commands are buffered and encoded into a single `wgpu::RenderPass` at
/// `end_pass`, so handles only need to be resolved once per pass.
pub struct WgpuBackend<'w> {
    window: &'w Window,
    gpu: Gpu<'w>,

    shaders: SlotMap<ShaderHandle, Shader>,
    buffers: SlotMap<BufferHandle, wgpu::Buffer>,
    pipelines: SlotMap<PipelineHandle, wgpu::RenderPipeline>,

    /// Acquired swapchain image; `None` when the frame is being skipped.
    frame: Option<GpuFrame>,
    pass: Option<OpenPass>,

    lost: bool,
}

impl<'w> WgpuBackend<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let gpu = Gpu::new(window, init).await?;
        Ok(Self {
            window,
            gpu,
            shaders: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            frame: None,
            pass: None,
            lost: false,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// True once the surface hit an unrecoverable error.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    fn encode_pass(&mut self, open: OpenPass) {
        let Some(frame) = self.frame.as_mut() else { return };

        let action = open.pass.action.color;
        let load = match action.load {
            LoadAction::Clear => wgpu::LoadOp::Clear(wgpu::Color {
                r: action.clear_value.r as f64,
                g: action.clear_value.g as f64,
                b: action.clear_value.b as f64,
                a: action.clear_value.a as f64,
            }),
            // DontCare has no wgpu equivalent on every backend; Load is always valid.
            LoadAction::Load | LoadAction::DontCare => wgpu::LoadOp::Load,
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("triangle swapchain pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut have_pipeline = false;
        for cmd in open.commands {
            match cmd {
                PassCommand::ApplyPipeline(h) => match self.pipelines.get(h) {
                    Some(p) => {
                        rpass.set_pipeline(p);
                        have_pipeline = true;
                    }
                    None => {
                        log::warn!("apply_pipeline: unknown pipeline {h:?}");
                        have_pipeline = false;
                    }
                },
                PassCommand::ApplyBindings(b) => {
                    for (slot, h) in b.vertex_buffers.iter().enumerate() {
                        let Some(h) = h else { continue };
                        match self.buffers.get(*h) {
                            Some(buf) => rpass.set_vertex_buffer(slot as u32, buf.slice(..)),
                            None => log::warn!("apply_bindings: unknown buffer {h:?}"),
                        }
                    }
                }
                PassCommand::Draw { base_element, num_elements, num_instances } => {
                    if !have_pipeline {
                        log::warn!("draw without a valid pipeline; skipped");
                        continue;
                    }
                    let Some(elements) = element_range(base_element, num_elements) else {
                        log::warn!("draw range {base_element}+{num_elements} overflows; skipped");
                        continue;
                    };
                    rpass.draw(elements, 0..num_instances);
                }
            }
        }
    }
}

impl GfxBackend for WgpuBackend<'_> {
    fn backend(&self) -> Backend {
        match self.gpu.adapter_info().backend {
            wgpu::Backend::Vulkan => Backend::Vulkan,
            wgpu::Backend::Metal => Backend::Metal,
            wgpu::Backend::Dx12 => Backend::Dx12,
            wgpu::Backend::Gl => Backend::Gl,
            wgpu::Backend::BrowserWebGpu => Backend::WebGpu,
            _ => Backend::Headless,
        }
    }

    fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle> {
        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: desc.label,
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });

        let handle = self.shaders.insert(Shader {
            module,
            vertex_entry: desc.vertex_entry.to_owned(),
            fragment_entry: desc.fragment_entry.to_owned(),
        });
        Ok(handle)
    }

    fn make_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle> {
        desc.validate()?;
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        };

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: desc.label,
                contents: desc.data,
                usage,
            });

        Ok(self.buffers.insert(buffer))
    }

    fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle> {
        desc.layout.validate()?;
        let shader = self
            .shaders
            .get(desc.shader)
            .with_context(|| format!("unknown shader {:?}", desc.shader))?;

        let attributes: Vec<wgpu::VertexAttribute> = desc
            .layout
            .attributes()
            .into_iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format(a.format),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect();

        let buffer_layout = wgpu::VertexBufferLayout {
            array_stride: desc.layout.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        };

        let device = self.gpu.device();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: desc.label,
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: desc.label,
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: &shader.module,
                entry_point: Some(shader.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &[buffer_layout],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader.module,
                entry_point: Some(shader.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: primitive_topology(desc.primitive),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(self.pipelines.insert(pipeline))
    }

    fn swapchain(&self) -> Swapchain {
        let size = self.gpu.size();
        Swapchain {
            width: size.width,
            height: size.height,
            sample_count: 1,
        }
    }

    fn begin_pass(&mut self, pass: &Pass) {
        if self.pass.is_some() {
            log::warn!("begin_pass while a pass is open; previous pass discarded");
        }

        if self.frame.is_none() && pass.swapchain.width > 0 && pass.swapchain.height > 0 {
            match self.gpu.begin_frame() {
                Ok(frame) => self.frame = Some(frame),
                Err(err) => {
                    if self.gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal {
                        log::error!("surface is unrecoverable");
                        self.lost = true;
                    }
                }
            }
        }

        self.pass = Some(OpenPass { pass: *pass, commands: Vec::new() });
    }

    fn apply_pipeline(&mut self, pipeline: PipelineHandle) {
        match self.pass.as_mut() {
            Some(open) => open.commands.push(PassCommand::ApplyPipeline(pipeline)),
            None => log::warn!("apply_pipeline outside a pass; ignored"),
        }
    }

    fn apply_bindings(&mut self, bindings: &Bindings) {
        match self.pass.as_mut() {
            Some(open) => open.commands.push(PassCommand::ApplyBindings(*bindings)),
            None => log::warn!("apply_bindings outside a pass; ignored"),
        }
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        match self.pass.as_mut() {
            Some(open) => open.commands.push(PassCommand::Draw {
                base_element,
                num_elements,
                num_instances,
            }),
            None => log::warn!("draw outside a pass; ignored"),
        }
    }

    fn end_pass(&mut self) {
        match self.pass.take() {
            Some(open) => self.encode_pass(open),
            None => log::warn!("end_pass without begin_pass; ignored"),
        }
    }

    fn commit(&mut self) {
        if self.pass.is_some() {
            log::warn!("commit with an open pass; pass discarded");
            self.pass = None;
        }

        // No frame means it was skipped at acquisition.
        if let Some(frame) = self.frame.take() {
            self.window.pre_present_notify();
            self.gpu.submit(frame);
        }
    }

    fn shutdown(&mut self) {
        self.pass = None;
        self.frame = None;
        self.pipelines.clear();
        self.buffers.clear();
        self.shaders.clear();
        log::debug!("gfx resources released");
    }
}

/// Vertex index range of a draw; `None` if it does not fit in `u32`.
fn element_range(base_element: u32, num_elements: u32) -> Option<Range<u32>> {
    base_element.checked_add(num_elements).map(|end| base_element..end)
}

fn vertex_format(f: VertexFormat) -> wgpu::VertexFormat {
    match f {
        VertexFormat::Float => wgpu::VertexFormat::Float32,
        VertexFormat::Float2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float4 => wgpu::VertexFormat::Float32x4,
    }
}

fn primitive_topology(p: PrimitiveType) -> wgpu::PrimitiveTopology {
    match p {
        PrimitiveType::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
    }
}
