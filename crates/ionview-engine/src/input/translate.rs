use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use super::{
    InputEvent, InputState, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta,
    PointerButtonEvent, PointerMoveEvent,
};

/// Maps a winit window event onto an [`InputEvent`].
///
/// `scale_factor` converts physical positions to logical pixels. Button and
/// wheel events take pointer position and modifiers from `state`.
pub(crate) fn translate_window_event(
    scale_factor: f64,
    state: &InputState,
    event: &WindowEvent,
) -> Option<InputEvent> {
    let ev = match event {
        WindowEvent::ModifiersChanged(m) => InputEvent::ModifiersChanged(modifiers(m.state())),
        WindowEvent::Focused(focused) => InputEvent::Focused(*focused),
        WindowEvent::CursorLeft { .. } => InputEvent::PointerLeft,

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = logical(*position, scale_factor);
            InputEvent::PointerMoved(PointerMoveEvent { x, y })
        }

        WindowEvent::MouseInput {
            state: pressed, button, ..
        } => {
            let (x, y) = state.pointer_pos.unwrap_or_default();
            InputEvent::PointerButton(PointerButtonEvent {
                button: mouse_button(*button),
                state: match pressed {
                    ElementState::Pressed => MouseButtonState::Pressed,
                    ElementState::Released => MouseButtonState::Released,
                },
                x,
                y,
                modifiers: state.modifiers,
            })
        }

        WindowEvent::MouseWheel { delta, .. } => InputEvent::MouseWheel {
            delta: wheel_delta(*delta, scale_factor),
            modifiers: state.modifiers,
        },

        WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
            key: key(event.physical_key),
            state: match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            },
            modifiers: state.modifiers,
            repeat: event.repeat,
        },

        _ => return None,
    };
    Some(ev)
}

fn logical(pos: PhysicalPosition<f64>, scale_factor: f64) -> (f32, f32) {
    let p = pos.to_logical::<f64>(scale_factor);
    (p.x as f32, p.y as f32)
}

fn wheel_delta(delta: MouseScrollDelta, scale_factor: f64) -> MouseWheelDelta {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x, y },
        MouseScrollDelta::PixelDelta(p) => {
            let (x, y) = logical(p, scale_factor);
            MouseWheelDelta::Pixel { x, y }
        }
    }
}

fn modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn mouse_button(b: WinitButton) -> MouseButton {
    match b {
        WinitButton::Left => MouseButton::Left,
        WinitButton::Right => MouseButton::Right,
        WinitButton::Middle => MouseButton::Middle,
        WinitButton::Back => MouseButton::Other(3),
        WinitButton::Forward => MouseButton::Other(4),
        WinitButton::Other(code) => MouseButton::Other(code),
    }
}

fn key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        // Native scancodes have no portable numeric form.
        return Key::Unknown(0);
    };
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,
        other => Key::Unknown(other as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidpi_positions_become_logical() {
        assert_eq!(logical(PhysicalPosition::new(200.0, 100.0), 2.0), (100.0, 50.0));
    }

    #[test]
    fn pixel_wheel_deltas_are_scaled() {
        let d = wheel_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 240.0)), 2.0);
        assert_eq!(d, MouseWheelDelta::Pixel { x: 0.0, y: 120.0 });
        let d = wheel_delta(MouseScrollDelta::LineDelta(0.0, -1.0), 2.0);
        assert_eq!(d, MouseWheelDelta::Line { x: 0.0, y: -1.0 });
    }

    #[test]
    fn arrow_and_escape_keys_are_named() {
        assert_eq!(key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);
        assert_eq!(key(PhysicalKey::Code(KeyCode::ArrowLeft)), Key::ArrowLeft);
        assert_eq!(key(PhysicalKey::Code(KeyCode::ShiftRight)), Key::Shift);
        assert!(matches!(key(PhysicalKey::Code(KeyCode::KeyA)), Key::Unknown(_)));
    }

    #[test]
    fn extra_buttons_fold_into_other() {
        assert_eq!(mouse_button(WinitButton::Back), MouseButton::Other(3));
        assert_eq!(mouse_button(WinitButton::Middle), MouseButton::Middle);
    }

    #[test]
    fn window_only_events_are_dropped() {
        let state = InputState::default();
        let ev = translate_window_event(1.0, &state, &WindowEvent::Focused(true));
        assert_eq!(ev, Some(InputEvent::Focused(true)));
        assert_eq!(translate_window_event(1.0, &state, &WindowEvent::CloseRequested), None);
    }
}
