use crate::render::RenderTarget;

/// One acquired swapchain image plus the encoder recording into it.
///
/// Present it within the same callback: holding the surface texture blocks
/// acquisition of the next image.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Encoder + swapchain view, borrowed for recording.
    pub fn target(&mut self) -> RenderTarget<'_> {
        RenderTarget::new(&mut self.encoder, &self.view)
    }
}

/// What the frame loop does after a failed acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame may succeed.
    Reconfigured,
    /// Transient; drop this frame only.
    SkipFrame,
    /// Out of memory. The viewer shuts down.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn is_fatal(self) -> bool {
        self == Self::Fatal
    }
}
