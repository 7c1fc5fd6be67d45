//! Contract between the runtime and the application.
//!
//! The runtime owns the event loop, the window and the graphics backend; the
//! application supplies four callbacks and receives the backend by reference.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
