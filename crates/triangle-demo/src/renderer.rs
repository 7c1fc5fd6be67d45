use anyhow::{bail, Result};

use triangle_engine::core::{App, AppControl, FrameCtx};
use triangle_engine::gfx::{
    Bindings, BufferDesc, BufferUsage, Color, GfxBackend, Pass, PassAction, PipelineDesc,
    PipelineHandle, PrimitiveType, ShaderDesc,
};
use triangle_engine::input::{InputEvent, Key};

use crate::vertex::{Vertex, TRIANGLE_VERTICES};

pub const CLEAR_COLOR: Color = Color::rgba(0.2, 0.3, 0.3, 1.0);

const SHADER_SRC: &str = include_str!("shaders/triangle.wgsl");

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Uninitialized,
    Running,
    /// Quit requested or cleaned up. Terminal.
    ShuttingDown,
}

/// GPU objects created at init and read every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub pipeline: PipelineHandle,
    pub bindings: Bindings,
    pub pass_action: PassAction,
}

/// Draws a single vertex-colored triangle on a cleared background.
#[derive(Debug)]
pub struct TriangleRenderer {
    phase: Phase,
    state: Option<RenderState>,
    released: bool,
}

impl TriangleRenderer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            state: None,
            released: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> Option<&RenderState> {
        self.state.as_ref()
    }

    fn build_state(gfx: &mut dyn GfxBackend) -> Result<RenderState> {
        log::info!("gfx backend: {:?}", gfx.backend());

        let shader = gfx.make_shader(&ShaderDesc {
            label: Some("triangle-shader"),
            source: SHADER_SRC,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
        })?;

        let vertex_buffer = gfx.make_buffer(&BufferDesc {
            label: Some("triangle-vertices"),
            usage: BufferUsage::Vertex,
            data: bytemuck::cast_slice(&TRIANGLE_VERTICES),
        })?;

        let pipeline = gfx.make_pipeline(&PipelineDesc {
            label: Some("triangle-pipeline"),
            shader,
            layout: Vertex::layout(),
            primitive: PrimitiveType::Triangles,
        })?;

        Ok(RenderState {
            pipeline,
            bindings: Bindings::with_vertex_buffer(vertex_buffer),
            pass_action: PassAction::clear(CLEAR_COLOR),
        })
    }
}

impl Default for TriangleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl App for TriangleRenderer {
    fn init(&mut self, gfx: &mut dyn GfxBackend) -> Result<()> {
        if self.phase != Phase::Uninitialized {
            bail!("renderer already initialized (phase {:?})", self.phase);
        }

        let state = Self::build_state(gfx)?;
        log::debug!("render state ready: pipeline {:#x}", state.pipeline.id());
        self.state = Some(state);
        self.phase = Phase::Running;
        Ok(())
    }

    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(state) = self.state.as_ref() else {
            return AppControl::Continue;
        };

        let gfx = &mut *ctx.gfx;
        let pass = Pass {
            action: state.pass_action,
            swapchain: gfx.swapchain(),
        };
        gfx.begin_pass(&pass);
        gfx.apply_pipeline(state.pipeline);
        gfx.apply_bindings(&state.bindings);
        gfx.draw(0, 3, 1);
        gfx.end_pass();
        gfx.commit();

        log::trace!("frame {} dt {:.4}", ctx.time.frame_index, ctx.time.dt);
        AppControl::Continue
    }

    fn event(&mut self, event: &InputEvent) -> AppControl {
        if event.is_key_down(Key::Escape) {
            log::info!("escape pressed; quitting");
            self.phase = Phase::ShuttingDown;
            return AppControl::Exit;
        }
        AppControl::Continue
    }

    fn cleanup(&mut self, gfx: &mut dyn GfxBackend) {
        if self.released {
            return;
        }
        gfx.shutdown();
        self.released = true;
        self.phase = Phase::ShuttingDown;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use triangle_engine::gfx::{Command, LoadAction, RecordingBackend, VertexFormat};
    use triangle_engine::input::{KeyState, Modifiers};
    use triangle_engine::time::FrameClock;

    use super::*;

    fn running() -> (TriangleRenderer, RecordingBackend) {
        let mut gfx = RecordingBackend::new(800, 600);
        let mut r = TriangleRenderer::new();
        r.init(&mut gfx).unwrap();
        (r, gfx)
    }

    fn run_frames(r: &mut TriangleRenderer, gfx: &mut RecordingBackend, n: usize) {
        let mut clock = FrameClock::with_clamps(Duration::ZERO, Duration::from_millis(250));
        for _ in 0..n {
            let mut ctx = FrameCtx { gfx: &mut *gfx, time: clock.tick() };
            assert_eq!(r.frame(&mut ctx), AppControl::Continue);
        }
    }

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, modifiers: Modifiers::default(), repeat: false }
    }

    // ── init ──────────────────────────────────────────────────────────────

    #[test]
    fn init_populates_valid_handles() {
        let (r, gfx) = running();
        assert_eq!(r.phase(), Phase::Running);

        let state = r.state().unwrap();
        assert!(state.pipeline.is_valid());
        let vb = state.bindings.vertex_buffers[0].unwrap();
        assert!(vb.is_valid());
        assert!(gfx.pipeline(state.pipeline).is_some());
        assert!(gfx.buffer(vb).is_some());
    }

    #[test]
    fn second_init_is_rejected_and_state_kept() {
        let (mut r, mut gfx) = running();
        let before = r.state().cloned();
        assert!(r.init(&mut gfx).is_err());
        assert_eq!(r.state().cloned(), before);
    }

    #[test]
    fn pipeline_binds_position_and_color() {
        let (r, gfx) = running();
        let pip = gfx.pipeline(r.state().unwrap().pipeline).unwrap();
        assert_eq!(pip.label.as_deref(), Some("triangle-pipeline"));
        assert_eq!(pip.primitive, PrimitiveType::Triangles);

        let attrs = pip.layout.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].format, VertexFormat::Float3);
        assert_eq!(attrs[1].format, VertexFormat::Float4);
        assert_eq!(pip.layout.stride(), 28);

        let shader = gfx.shader(pip.shader).unwrap();
        assert_eq!(shader.vertex_entry, "vs_main");
        assert_eq!(shader.fragment_entry, "fs_main");
    }

    #[test]
    fn uploaded_vertices_read_back_exactly() {
        let (r, gfx) = running();
        let vb = r.state().unwrap().bindings.vertex_buffers[0].unwrap();
        assert_eq!(gfx.buffer(vb).unwrap().label.as_deref(), Some("triangle-vertices"));

        let floats: Vec<f32> = gfx
            .buffer_contents(vb)
            .unwrap()
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        #[rustfmt::skip]
        let expected = [
            -0.5, -0.5, 0.0,   1.0, 0.0, 0.0, 1.0,
             0.5, -0.5, 0.0,   0.0, 1.0, 0.0, 1.0,
             0.0,  0.5, 0.0,   0.0, 0.0, 1.0, 1.0,
        ];
        assert_eq!(floats, expected);
    }

    /// Recording backend that refuses to create buffers.
    struct NoBuffers(RecordingBackend);

    impl GfxBackend for NoBuffers {
        fn backend(&self) -> triangle_engine::gfx::Backend {
            self.0.backend()
        }
        fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<triangle_engine::gfx::ShaderHandle> {
            self.0.make_shader(desc)
        }
        fn make_buffer(&mut self, _desc: &BufferDesc<'_>) -> Result<triangle_engine::gfx::BufferHandle> {
            bail!("out of device memory")
        }
        fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle> {
            self.0.make_pipeline(desc)
        }
        fn swapchain(&self) -> triangle_engine::gfx::Swapchain {
            self.0.swapchain()
        }
        fn begin_pass(&mut self, pass: &Pass) {
            self.0.begin_pass(pass)
        }
        fn apply_pipeline(&mut self, pipeline: PipelineHandle) {
            self.0.apply_pipeline(pipeline)
        }
        fn apply_bindings(&mut self, bindings: &Bindings) {
            self.0.apply_bindings(bindings)
        }
        fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
            self.0.draw(base_element, num_elements, num_instances)
        }
        fn end_pass(&mut self) {
            self.0.end_pass()
        }
        fn commit(&mut self) {
            self.0.commit()
        }
        fn shutdown(&mut self) {
            self.0.shutdown()
        }
    }

    #[test]
    fn failed_resource_creation_is_an_error() {
        let mut gfx = NoBuffers(RecordingBackend::default());
        let mut r = TriangleRenderer::new();

        let err = r.init(&mut gfx).unwrap_err();
        assert!(err.to_string().contains("out of device memory"));
        assert_eq!(r.phase(), Phase::Uninitialized);
        assert!(r.state().is_none());
    }

    // ── frame ─────────────────────────────────────────────────────────────

    #[test]
    fn frame_issues_pass_and_single_draw() {
        let (mut r, mut gfx) = running();
        run_frames(&mut r, &mut gfx, 1);

        let state = r.state().unwrap().clone();
        assert_eq!(
            gfx.commands(),
            &[
                Command::BeginPass(Pass {
                    action: state.pass_action,
                    swapchain: gfx.swapchain(),
                }),
                Command::ApplyPipeline(state.pipeline),
                Command::ApplyBindings(state.bindings),
                Command::Draw { base_element: 0, num_elements: 3, num_instances: 1 },
                Command::EndPass,
                Command::Commit,
            ]
        );
    }

    #[test]
    fn every_frame_draws_three_vertices_once() {
        let (mut r, mut gfx) = running();
        run_frames(&mut r, &mut gfx, 10);

        assert_eq!(gfx.frames_committed(), 10);
        assert_eq!(gfx.draws(), vec![(0, 3, 1); 10]);
    }

    #[test]
    fn clear_color_never_changes() {
        let (mut r, mut gfx) = running();
        run_frames(&mut r, &mut gfx, 5);

        let passes: Vec<Pass> = gfx
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::BeginPass(p) => Some(*p),
                _ => None,
            })
            .collect();

        assert_eq!(passes.len(), 5);
        for p in passes {
            assert_eq!(p.action.color.load, LoadAction::Clear);
            assert_eq!(p.action.color.clear_value, Color::rgba(0.2, 0.3, 0.3, 1.0));
        }
    }

    #[test]
    fn frame_before_init_draws_nothing() {
        let mut gfx = RecordingBackend::default();
        let mut r = TriangleRenderer::new();
        run_frames(&mut r, &mut gfx, 2);
        assert!(gfx.commands().is_empty());
    }

    // ── event ─────────────────────────────────────────────────────────────

    #[test]
    fn escape_requests_quit_every_time() {
        let (mut r, _gfx) = running();
        assert_eq!(r.event(&key(Key::Escape, KeyState::Pressed)), AppControl::Exit);
        assert_eq!(r.phase(), Phase::ShuttingDown);
        assert_eq!(r.event(&key(Key::Escape, KeyState::Pressed)), AppControl::Exit);
    }

    #[test]
    fn other_input_is_ignored() {
        let (mut r, _gfx) = running();
        let ignored = [
            key(Key::Escape, KeyState::Released),
            key(Key::Space, KeyState::Pressed),
            key(Key::Q, KeyState::Pressed),
            InputEvent::Focused(false),
            InputEvent::ModifiersChanged(Modifiers { ctrl: true, ..Default::default() }),
        ];
        for ev in &ignored {
            assert_eq!(r.event(ev), AppControl::Continue);
            assert_eq!(r.phase(), Phase::Running);
        }
    }

    // ── cleanup ───────────────────────────────────────────────────────────

    #[test]
    fn cleanup_releases_once() {
        let (mut r, mut gfx) = running();
        run_frames(&mut r, &mut gfx, 1);
        gfx.take_commands();

        r.cleanup(&mut gfx);
        assert!(gfx.is_shut_down());
        assert_eq!(gfx.live_resources(), 0);
        assert_eq!(r.phase(), Phase::ShuttingDown);

        r.cleanup(&mut gfx);
        assert_eq!(gfx.commands(), &[Command::Shutdown]);
    }

    #[test]
    fn cleanup_after_quit_request() {
        let (mut r, mut gfx) = running();
        r.event(&key(Key::Escape, KeyState::Pressed));
        r.cleanup(&mut gfx);
        assert!(gfx.is_shut_down());
    }
}
