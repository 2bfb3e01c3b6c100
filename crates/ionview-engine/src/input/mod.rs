//! Window input for the orbit camera.
//!
//! `InputEvent` carries no winit types; the window runtime translates
//! platform events and keeps `InputState` current before the viewer sees them.

mod state;
mod translate;
mod types;

pub use state::InputState;
pub use types::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta, PointerButtonEvent,
    PointerMoveEvent,
};

pub(crate) use translate::translate_window_event;
