//! Keyboard input.
//!
//! Public types do not expose winit; the runtime translates platform events
//! through `platform::winit`.

pub(crate) mod platform;
mod types;

pub use types::{InputEvent, Key, KeyState, Modifiers};
