use anyhow::Result;

use super::types::{
    Backend, Bindings, BufferDesc, BufferHandle, Pass, PipelineDesc, PipelineHandle, ShaderDesc,
    ShaderHandle, Swapchain,
};

/// Immediate-mode graphics API used by applications.
///
/// Resource creation is fallible and returns opaque handles. Per-frame calls
/// follow a fixed order:
///
/// `begin_pass` → (`apply_pipeline` | `apply_bindings` | `draw`)* → `end_pass` → `commit`
///
/// Per-frame calls never report errors to the caller; a backend logs and drops
/// anything it cannot execute.
pub trait GfxBackend {
    /// GPU API currently in use.
    fn backend(&self) -> Backend;

    fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle>;

    fn make_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle>;

    fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle>;

    /// Current swapchain target.
    fn swapchain(&self) -> Swapchain;

    fn begin_pass(&mut self, pass: &Pass);

    fn apply_pipeline(&mut self, pipeline: PipelineHandle);

    fn apply_bindings(&mut self, bindings: &Bindings);

    /// Draws `num_elements` vertices starting at `base_element`, `num_instances` times.
    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32);

    fn end_pass(&mut self);

    /// Submits the frame and presents it.
    fn commit(&mut self);

    /// Releases every resource created through this backend.
    fn shutdown(&mut self);
}
