/// Offscreen render texture with its default view.
pub struct RenderTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub size: (u32, u32),
    pub sample_count: u32,
}

impl RenderTexture {
    /// Color target usable as attachment and (when single-sampled) shader input.
    pub fn color(
        device: &wgpu::Device,
        label: &str,
        size: (u32, u32),
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if sample_count == 1 {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        Self::new(device, label, size, format, sample_count, usage)
    }

    /// Depth target. Sampleable when single-sampled (shadow maps).
    pub fn depth(device: &wgpu::Device, label: &str, size: (u32, u32), sample_count: u32) -> Self {
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if sample_count == 1 {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        Self::new(device, label, size, DEPTH_FORMAT, sample_count, usage)
    }

    fn new(
        device: &wgpu::Device,
        label: &str,
        size: (u32, u32),
        format: wgpu::TextureFormat,
        sample_count: u32,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            format,
            size,
            sample_count,
        }
    }
}

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// HDR format for the scene and post-processing chain.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
