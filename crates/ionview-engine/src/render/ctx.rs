/// Shared GPU handles for one frame.
///
/// Passes create their resources lazily from this and rebuild them when
/// `size` or `surface_format` changes.
#[derive(Clone, Copy)]
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    /// Drawable size in physical pixels.
    pub size: (u32, u32),
}

impl<'a> RenderCtx<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            size,
        }
    }

    /// `size` with zero extents raised to 1, as required for texture creation.
    pub fn target_size(&self) -> (u32, u32) {
        (self.size.0.max(1), self.size.1.max(1))
    }
}

/// Where a frame is recorded: the frame encoder plus the swapchain image.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Presentable view; only the final output pass writes to it.
    pub surface_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, surface_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, surface_view }
    }
}
