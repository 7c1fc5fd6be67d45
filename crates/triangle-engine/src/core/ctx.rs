use crate::gfx::GfxBackend;
use crate::time::FrameTime;

/// Per-frame context passed to `App::frame`.
pub struct FrameCtx<'a> {
    pub gfx: &'a mut dyn GfxBackend,
    pub time: FrameTime,
}
