use anyhow::{Context, Result};
use slotmap::SlotMap;

use super::backend::GfxBackend;
use super::types::{
    Backend, Bindings, BufferDesc, BufferHandle, BufferUsage, Pass, PipelineDesc, PipelineHandle,
    PrimitiveType, ShaderDesc, ShaderHandle, Swapchain, VertexLayout,
};

/// Per-frame call observed by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginPass(Pass),
    ApplyPipeline(PipelineHandle),
    ApplyBindings(Bindings),
    Draw {
        base_element: u32,
        num_elements: u32,
        num_instances: u32,
    },
    EndPass,
    Commit,
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct RecordedShader {
    pub label: Option<String>,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

#[derive(Debug, Clone)]
pub struct RecordedBuffer {
    pub label: Option<String>,
    pub usage: BufferUsage,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RecordedPipeline {
    pub label: Option<String>,
    pub shader: ShaderHandle,
    pub layout: VertexLayout,
    pub primitive: PrimitiveType,
}

/// Headless backend that keeps every resource and call in memory.
///
/// Buffer contents are copied on creation so they can be read back.
#[derive(Debug)]
pub struct RecordingBackend {
    swapchain: Swapchain,
    shaders: SlotMap<ShaderHandle, RecordedShader>,
    buffers: SlotMap<BufferHandle, RecordedBuffer>,
    pipelines: SlotMap<PipelineHandle, RecordedPipeline>,
    commands: Vec<Command>,
    frames_committed: u64,
    shut_down: bool,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            swapchain: Swapchain { width, height, sample_count: 1 },
            shaders: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            commands: Vec::new(),
            frames_committed: 0,
            shut_down: false,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns and clears the command log.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Uploaded contents of `buffer`, or `None` if it does not exist.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.data.as_slice())
    }

    pub fn buffer(&self, buffer: BufferHandle) -> Option<&RecordedBuffer> {
        self.buffers.get(buffer)
    }

    pub fn shader(&self, shader: ShaderHandle) -> Option<&RecordedShader> {
        self.shaders.get(shader)
    }

    pub fn pipeline(&self, pipeline: PipelineHandle) -> Option<&RecordedPipeline> {
        self.pipelines.get(pipeline)
    }

    /// Number of live shaders, buffers and pipelines.
    pub fn live_resources(&self) -> usize {
        self.shaders.len() + self.buffers.len() + self.pipelines.len()
    }

    pub fn frames_committed(&self) -> u64 {
        self.frames_committed
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Draw calls in the log, as `(base_element, num_elements, num_instances)`.
    pub fn draws(&self) -> Vec<(u32, u32, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                Command::Draw { base_element, num_elements, num_instances } => {
                    Some((base_element, num_elements, num_instances))
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl GfxBackend for RecordingBackend {
    fn backend(&self) -> Backend {
        Backend::Headless
    }

    fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle> {
        anyhow::ensure!(!desc.source.is_empty(), "shader source is empty");
        let handle = self.shaders.insert(RecordedShader {
            label: desc.label.map(str::to_owned),
            vertex_entry: desc.vertex_entry.to_owned(),
            fragment_entry: desc.fragment_entry.to_owned(),
        });
        Ok(handle)
    }

    fn make_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle> {
        desc.validate()?;
        let handle = self.buffers.insert(RecordedBuffer {
            label: desc.label.map(str::to_owned),
            usage: desc.usage,
            data: desc.data.to_vec(),
        });
        Ok(handle)
    }

    fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle> {
        self.shaders
            .get(desc.shader)
            .with_context(|| format!("unknown shader {:?}", desc.shader))?;
        desc.layout.validate()?;

        let handle = self.pipelines.insert(RecordedPipeline {
            label: desc.label.map(str::to_owned),
            shader: desc.shader,
            layout: desc.layout.clone(),
            primitive: desc.primitive,
        });
        Ok(handle)
    }

    fn swapchain(&self) -> Swapchain {
        self.swapchain
    }

    fn begin_pass(&mut self, pass: &Pass) {
        self.commands.push(Command::BeginPass(*pass));
    }

    fn apply_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(Command::ApplyPipeline(pipeline));
    }

    fn apply_bindings(&mut self, bindings: &Bindings) {
        self.commands.push(Command::ApplyBindings(*bindings));
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        self.commands.push(Command::Draw { base_element, num_elements, num_instances });
    }

    fn end_pass(&mut self) {
        self.commands.push(Command::EndPass);
    }

    fn commit(&mut self) {
        self.commands.push(Command::Commit);
        self.frames_committed += 1;
    }

    fn shutdown(&mut self) {
        self.shaders.clear();
        self.buffers.clear();
        self.pipelines.clear();
        self.commands.push(Command::Shutdown);
        self.shut_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Color, PassAction, VertexFormat};

    fn shader(gfx: &mut RecordingBackend) -> ShaderHandle {
        gfx.make_shader(&ShaderDesc {
            label: Some("test"),
            source: "@vertex fn vs_main() {}",
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
        })
        .unwrap()
    }

    #[test]
    fn buffer_contents_are_copied() {
        let mut gfx = RecordingBackend::default();
        let data = [1u8, 2, 3, 4];
        let h = gfx
            .make_buffer(&BufferDesc { label: Some("vb"), usage: BufferUsage::Vertex, data: &data })
            .unwrap();
        assert_eq!(gfx.buffer_contents(h), Some(&data[..]));
        assert_eq!(gfx.buffer(h).unwrap().label.as_deref(), Some("vb"));
    }

    #[test]
    fn pipeline_with_unknown_shader_fails() {
        let mut gfx = RecordingBackend::default();
        let real = shader(&mut gfx);
        gfx.shutdown();

        let res = gfx.make_pipeline(&PipelineDesc {
            label: None,
            shader: real,
            layout: VertexLayout::new().attr(0, VertexFormat::Float2),
            primitive: PrimitiveType::Triangles,
        });
        assert!(res.is_err());
    }

    #[test]
    fn frame_calls_are_logged_in_order() {
        let mut gfx = RecordingBackend::new(320, 240);
        let pass = Pass {
            action: PassAction::clear(Color::rgba(1.0, 0.0, 0.0, 1.0)),
            swapchain: gfx.swapchain(),
        };
        gfx.begin_pass(&pass);
        gfx.draw(0, 6, 2);
        gfx.end_pass();
        gfx.commit();

        assert_eq!(
            gfx.commands(),
            &[
                Command::BeginPass(pass),
                Command::Draw { base_element: 0, num_elements: 6, num_instances: 2 },
                Command::EndPass,
                Command::Commit,
            ]
        );
        assert_eq!(gfx.frames_committed(), 1);
        assert_eq!(pass.swapchain.width, 320);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut gfx = RecordingBackend::default();
        shader(&mut gfx);
        gfx.make_buffer(&BufferDesc { label: None, usage: BufferUsage::Index, data: &[0, 1] })
            .unwrap();
        assert_eq!(gfx.live_resources(), 2);

        gfx.shutdown();
        assert_eq!(gfx.live_resources(), 0);
        assert!(gfx.is_shut_down());
        assert_eq!(gfx.take_commands(), vec![Command::Shutdown]);
        assert!(gfx.commands().is_empty());
    }

    #[test]
    fn released_handles_do_not_resolve() {
        let mut gfx = RecordingBackend::default();
        let buf = gfx
            .make_buffer(&BufferDesc { label: None, usage: BufferUsage::Vertex, data: &[1, 2, 3, 4] })
            .unwrap();
        gfx.shutdown();
        assert!(gfx.buffer_contents(buf).is_none());

        let again = gfx
            .make_buffer(&BufferDesc { label: None, usage: BufferUsage::Vertex, data: &[5, 6, 7, 8] })
            .unwrap();
        assert_ne!(again, buf);
        assert!(gfx.buffer_contents(buf).is_none());
    }
}
