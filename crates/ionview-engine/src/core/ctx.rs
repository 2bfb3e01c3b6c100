use winit::window::{Window, WindowId};

use crate::device::Gpu;
use crate::input::InputState;
use crate::render::{RenderCtx, RenderTarget};
use crate::schedule::FrameRequests;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Window size in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys = self.window.inner_size();
        let logical: winit::dpi::LogicalSize<f64> = phys.to_logical(self.window.scale_factor());
        (logical.width as f32, logical.height as f32)
    }
}

/// Context passed to `core::App::on_start`.
pub struct StartCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a Gpu<'w>,
    pub frames: &'a mut FrameRequests,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    /// Host timestamp of this callback, in milliseconds.
    pub timestamp_ms: f64,
    pub frames: &'a mut FrameRequests,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the next surface image, calls `draw`, then presents it.
    pub fn present<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        present_frame(self.gpu, &self.window, draw)
    }
}

/// Acquires a surface image, records `draw` into it and presents it.
///
/// Surface errors are handled here: recoverable ones skip the frame, fatal
/// ones return [`AppControl::Exit`].
pub fn present_frame<F>(gpu: &mut Gpu<'_>, window: &WindowCtx<'_>, draw: F) -> AppControl
where
    F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
{
    let mut frame = match gpu.acquire_frame() {
        Ok(frame) => frame,
        Err(action) if action.is_fatal() => return AppControl::Exit,
        Err(_) => return AppControl::Continue,
    };

    draw(&gpu.render_ctx(), &mut frame.target());

    window.window.pre_present_notify();
    gpu.present(frame);
    AppControl::Continue
}
