/// Keys the viewer reacts to.
///
/// Everything else arrives as `Key::Unknown` with the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    Unknown(u32),
}

impl Key {
    /// Screen-space pan direction of an arrow key: +x right, +y up.
    pub fn arrow_direction(self) -> Option<(f32, f32)> {
        match self {
            Self::ArrowUp => Some((0.0, 1.0)),
            Self::ArrowDown => Some((0.0, -1.0)),
            Self::ArrowLeft => Some((-1.0, 0.0)),
            Self::ArrowRight => Some((1.0, 0.0)),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Back, forward and vendor buttons.
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
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

impl Modifiers {
    /// Shift, Ctrl or Meta turn a left-button drag into a pan.
    pub fn pans(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse wheel delta. Positive `y` scrolls away from the user.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    /// Logical pixels, from touchpads and high-resolution wheels.
    Pixel { x: f32, y: f32 },
}

impl MouseWheelDelta {
    /// Vertical component in lines, converting pixels at `pixels_per_line`.
    pub fn lines_y(&self, pixels_per_line: f32) -> f32 {
        match *self {
            Self::Line { y, .. } => y,
            Self::Pixel { y, .. } => y / pixels_per_line.max(1.0),
        }
    }
}

/// Pointer position in logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerMoveEvent {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerButtonEvent {
    pub button: MouseButton,
    pub state: MouseButtonState,
    /// Pointer position at the time of the press/release, logical pixels.
    pub x: f32,
    pub y: f32,
    pub modifiers: Modifiers,
}

/// Window input, independent of the windowing backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ModifiersChanged(Modifiers),

    Key {
        key: Key,
        state: KeyState,
        modifiers: Modifiers,
        repeat: bool,
    },

    PointerMoved(PointerMoveEvent),
    PointerButton(PointerButtonEvent),

    MouseWheel {
        delta: MouseWheelDelta,
        modifiers: Modifiers,
    },

    PointerLeft,
    Focused(bool),
}

impl InputEvent {
    /// True for a non-repeat press of `key`.
    pub fn is_key_press(&self, key: Key) -> bool {
        matches!(
            self,
            InputEvent::Key { key: k, state: KeyState::Pressed, repeat: false, .. } if *k == key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers::default(),
            repeat,
        }
    }

    #[test]
    fn key_press_ignores_repeats_and_releases() {
        assert!(key(Key::Escape, KeyState::Pressed, false).is_key_press(Key::Escape));
        assert!(!key(Key::Escape, KeyState::Pressed, true).is_key_press(Key::Escape));
        assert!(!key(Key::Escape, KeyState::Released, false).is_key_press(Key::Escape));
        assert!(!key(Key::ArrowUp, KeyState::Pressed, false).is_key_press(Key::Escape));
    }

    #[test]
    fn pixel_wheel_converts_to_lines() {
        assert_eq!(MouseWheelDelta::Line { x: 0.0, y: -2.0 }.lines_y(100.0), -2.0);
        assert_eq!(MouseWheelDelta::Pixel { x: 0.0, y: 50.0 }.lines_y(100.0), 0.5);
    }

    #[test]
    fn only_arrows_have_directions() {
        assert_eq!(Key::ArrowLeft.arrow_direction(), Some((-1.0, 0.0)));
        assert_eq!(Key::Escape.arrow_direction(), None);
    }

    #[test]
    fn alt_alone_does_not_pan() {
        assert!(!Modifiers { alt: true, ..Default::default() }.pans());
        assert!(Modifiers { meta: true, ..Default::default() }.pans());
    }
}
