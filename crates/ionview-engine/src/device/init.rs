/// Startup options for [`super::Gpu`].
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB swapchain so the output pass can write linear color.
    pub prefer_srgb: bool,
    /// `Fifo` paces presentation, and with it the frame loop, to the display.
    pub present_mode: wgpu::PresentMode,
    pub power_preference: wgpu::PowerPreference,
    /// Frames the presentation engine may queue ahead.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            power_preference: wgpu::PowerPreference::HighPerformance,
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// `Fifo` with vsync, `AutoNoVsync` without.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = if vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_selects_present_mode() {
        let on = GpuInit::default().with_vsync(true);
        let off = GpuInit::default().with_vsync(false);
        assert_eq!(on.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(off.present_mode, wgpu::PresentMode::AutoNoVsync);
        assert!(off.prefer_srgb);
    }
}
