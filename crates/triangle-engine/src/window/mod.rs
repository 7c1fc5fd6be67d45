//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, wires them to the
//! graphics backend and drives the `core::App` callbacks.

mod host;
mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
