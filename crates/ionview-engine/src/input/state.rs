use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, PointerButtonEvent};

/// Snapshot of what is held down, updated from every translated event.
///
/// The runtime reads `pointer_pos` and `modifiers` back when translating
/// button and wheel events, which carry neither on most platforms.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Logical pixels; `None` while the pointer is outside the window.
    pub pointer_pos: Option<(f32, f32)>,

    keys: HashSet<Key>,
    buttons: u8,
}

fn button_bit(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Right => 1 << 1,
        MouseButton::Middle => 1 << 2,
        MouseButton::Other(_) => 1 << 3,
    }
}

impl InputState {
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(focused) => {
                self.focused = *focused;
                if !focused {
                    // Releases happen elsewhere once focus is gone.
                    self.keys.clear();
                    self.buttons = 0;
                }
            }

            InputEvent::PointerMoved(p) => self.pointer_pos = Some((p.x, p.y)),
            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key { key, state, modifiers, .. } => {
                self.modifiers = *modifiers;
                match state {
                    KeyState::Pressed => self.keys.insert(*key),
                    KeyState::Released => self.keys.remove(key),
                };
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;
                match state {
                    MouseButtonState::Pressed => self.buttons |= button_bit(*button),
                    MouseButtonState::Released => self.buttons &= !button_bit(*button),
                }
            }

            InputEvent::MouseWheel { modifiers, .. } => self.modifiers = *modifiers,
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons & button_bit(button) != 0
    }

    /// True while any mouse button is held, i.e. during an orbit drag.
    pub fn dragging(&self) -> bool {
        self.buttons != 0
    }
}
