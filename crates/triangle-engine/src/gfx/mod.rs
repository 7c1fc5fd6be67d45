//! Handle-based graphics API.
//!
//! Applications create shaders, buffers and pipelines once and get back
//! opaque handles; each frame they open a pass, apply state, draw and commit.
//! [`GfxBackend`] is the seam: [`WgpuBackend`] renders to a window,
//! [`RecordingBackend`] keeps everything in memory for tests and readback.

mod backend;
mod recording;
mod types;
mod wgpu_backend;

pub use backend::GfxBackend;
pub use recording::{Command, RecordedBuffer, RecordedPipeline, RecordedShader, RecordingBackend};
pub use types::{
    Backend, Bindings, BufferDesc, BufferHandle, BufferUsage, Color, ColorAction, LoadAction, Pass,
    PassAction, PipelineDesc, PipelineHandle, PrimitiveType, ShaderDesc, ShaderHandle, Swapchain,
    VertexAttr, VertexFormat, VertexLayout, MAX_VERTEX_ATTRIBUTES, MAX_VERTEX_BUFFERS,
};
pub use wgpu_backend::WgpuBackend;
