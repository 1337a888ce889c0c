//! Pointer and keyboard input as seen by window callbacks

use bitflags::bitflags;

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    /// Left mouse button
    #[default]
    Left,
    /// Middle mouse button (wheel click)
    Middle,
    /// Right mouse button
    Right,
    /// Any additional button, by toolkit index
    Other(u8),
}

/// Whether a button went down or up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    /// Button pressed
    Pressed,
    /// Button released
    #[default]
    Released,
}

bitflags! {
    /// Keyboard modifiers active while a mouse button changed state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Either shift key
        const SHIFT = 0b001;
        /// Either control key
        const CONTROL = 0b010;
        /// Either alt key
        const ALT = 0b100;
    }
}

/// A mouse button transition with the pointer position at that moment
///
/// Windows keep the latest one as their pointer state; drag handling then
/// updates `x`/`y` as the pointer moves so the next motion event yields a
/// delta relative to the previous position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseEvent {
    /// Pointer x in window coordinates
    pub x: i32,
    /// Pointer y in window coordinates
    pub y: i32,
    /// Pressed or released
    pub state: ButtonState,
    /// Which button changed
    pub button: MouseButton,
    /// Modifier keys held at the time
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a mouse event
    pub fn new(x: i32, y: i32, state: ButtonState, button: MouseButton, modifiers: Modifiers) -> Self {
        Self { x, y, state, button, modifiers }
    }

    /// Whether `button` is currently held according to this event
    pub fn is_held(&self, button: MouseButton) -> bool {
        self.button == button && self.state == ButtonState::Pressed
    }
}
