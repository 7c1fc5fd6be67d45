/// Keyboard key identifier.
///
/// Keys without a dedicated variant map to `Key::Unknown` carrying the
/// platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        modifiers: Modifiers,
        /// True for auto-repeat presses.
        repeat: bool,
    },

    ModifiersChanged(Modifiers),

    Focused(bool),
}

impl InputEvent {
    /// True for a press of `key`, auto-repeats included.
    pub fn is_key_down(&self, key: Key) -> bool {
        matches!(self, InputEvent::Key { key: k, state: KeyState::Pressed, .. } if *k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key { key, state, modifiers: Modifiers::default(), repeat }
    }

    #[test]
    fn key_down_matches_presses_of_that_key() {
        assert!(key(Key::Escape, KeyState::Pressed, false).is_key_down(Key::Escape));
        assert!(key(Key::Escape, KeyState::Pressed, true).is_key_down(Key::Escape));
        assert!(!key(Key::Escape, KeyState::Released, false).is_key_down(Key::Escape));
        assert!(!key(Key::Q, KeyState::Pressed, false).is_key_down(Key::Escape));
    }

    #[test]
    fn non_key_events_are_never_key_down() {
        assert!(!InputEvent::Focused(true).is_key_down(Key::Escape));
        assert!(!InputEvent::ModifiersChanged(Modifiers::default()).is_key_down(Key::Escape));
    }
}
