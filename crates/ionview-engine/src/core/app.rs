use crate::device::Gpu;
use crate::input::{InputEvent, InputState};
use crate::schedule::FrameHost;

use super::ctx::{FrameCtx, StartCtx, WindowCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the window runtime.
///
/// The runtime redraws only while a frame request is pending; an app that
/// never calls `request_frame` receives no `on_frame` callbacks.
pub trait App {
    /// Called once, after the window and GPU are ready.
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called for every translated input event, after `input` has been updated.
    fn on_input(&mut self, event: &InputEvent, input: &InputState) -> AppControl {
        let _ = (event, input);
        AppControl::Continue
    }

    /// Called after the surface has been reconfigured for a new size.
    fn on_resize(&mut self, window: &WindowCtx<'_>, gpu: &Gpu<'_>) {
        let _ = (window, gpu);
    }

    /// Called once per delivered frame request.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once before the runtime exits. Pending requests should be withdrawn here.
    fn on_stop(&mut self, frames: &mut dyn FrameHost) {
        let _ = frames;
    }
}
