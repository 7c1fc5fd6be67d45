use anyhow::Result;

use crate::gfx::GfxBackend;
use crate::input::InputEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application callbacks, invoked on the event loop thread.
///
/// Order: `init` once, then `frame` once per redraw and `event` zero or more
/// times between frames, then `cleanup` once.
pub trait App {
    /// Creates GPU resources. An error aborts the runtime.
    fn init(&mut self, gfx: &mut dyn GfxBackend) -> Result<()>;

    /// Renders one frame.
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Handles one input event.
    fn event(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Releases GPU resources before the backend is dropped.
    fn cleanup(&mut self, gfx: &mut dyn GfxBackend) {
        gfx.shutdown();
    }
}
