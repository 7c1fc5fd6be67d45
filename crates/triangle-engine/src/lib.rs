//! Triangle engine crate.
//!
//! Window, input and GPU plumbing behind a small handle-based graphics API.
//! Applications implement `core::App` and hand it to `window::Runtime`.

pub mod core;
pub mod device;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod time;
pub mod window;
