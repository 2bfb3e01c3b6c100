use crate::render::{RenderTexture, HDR_FORMAT};

/// Two HDR targets alternated along the pass chain.
#[derive(Default)]
pub struct PingPong {
    size: (u32, u32),
    targets: Option<[RenderTexture; 2]>,
}

impl PingPong {
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Invalidates the targets when the size changes; they are recreated lazily.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.size != (width, height) {
            self.size = (width, height);
            self.targets = None;
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.targets.is_some()
    }

    pub fn ensure(&mut self, device: &wgpu::Device) -> &[RenderTexture; 2] {
        let size = self.size;
        self.targets.get_or_insert_with(|| {
            log::debug!("allocating chain targets {}x{}", size.0, size.1);
            [
                RenderTexture::color(device, "ionview chain target a", size, HDR_FORMAT, 1),
                RenderTexture::color(device, "ionview chain target b", size, HDR_FORMAT, 1),
            ]
        })
    }

    pub fn release(&mut self) {
        self.targets = None;
    }
}
