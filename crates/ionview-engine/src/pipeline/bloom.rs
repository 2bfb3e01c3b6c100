use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::{common, RenderTexture, HDR_FORMAT};

use super::params::BloomParams;
use super::pass::{PassCtx, PostPass};

/// Number of blurred levels in the bloom chain.
pub const MIP_LEVELS: usize = 5;

/// Gaussian kernel radius per level, finest first.
pub const KERNEL_RADII: [u32; MIP_LEVELS] = [3, 5, 7, 9, 11];

const BLOOM_FACTORS: [f32; MIP_LEVELS] = [1.0, 0.8, 0.6, 0.4, 0.2];

const SMOOTH_WIDTH: f32 = 0.01;

/// Coefficient slots in the blur uniform (3 x vec4).
const MAX_KERNEL: usize = 12;

/// Level resolutions: the first is half the input, each next one halves again.
pub fn mip_sizes(width: u32, height: u32) -> [(u32, u32); MIP_LEVELS] {
    let half = |v: u32| ((v as f32 / 2.0).round() as u32).max(1);
    let mut size = (half(width), half(height));
    let mut out = [(1, 1); MIP_LEVELS];
    for slot in &mut out {
        *slot = size;
        size = (half(size.0), half(size.1));
    }
    out
}

/// One-sided Gaussian weights `w[0..kernel_radius]` with sigma = kernel radius.
pub fn gaussian_coefficients(kernel_radius: u32) -> Vec<f32> {
    let sigma = kernel_radius.max(1) as f32;
    (0..kernel_radius)
        .map(|i| {
            let x = i as f32;
            0.39894 * (-0.5 * x * x / (sigma * sigma)).exp() / sigma
        })
        .collect()
}

/// Per-level composite weights: `strength * mix(f, 1.2 - f, radius)`.
pub fn composite_factors(strength: f32, radius: f32) -> [f32; MIP_LEVELS] {
    BLOOM_FACTORS.map(|f| strength * (f + (1.2 - 2.0 * f) * radius))
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct HighPassUniform {
    threshold: f32,
    smooth_width: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BlurUniform {
    direction: [f32; 2],
    inv_size: [f32; 2],
    kernel_radius: u32,
    _pad: [u32; 3],
    coefficients: [[f32; 4]; 3],
}

impl BlurUniform {
    fn new(direction: [f32; 2], size: (u32, u32), kernel_radius: u32) -> Self {
        let kernel_radius = kernel_radius.min(MAX_KERNEL as u32);
        let mut coefficients = [[0.0; 4]; 3];
        for (i, w) in gaussian_coefficients(kernel_radius).into_iter().enumerate() {
            coefficients[i / 4][i % 4] = w;
        }
        Self {
            direction,
            inv_size: [1.0 / size.0.max(1) as f32, 1.0 / size.1.max(1) as f32],
            kernel_radius,
            _pad: [0; 3],
            coefficients,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CompositeUniform {
    factors: [[f32; 4]; 2],
}

impl CompositeUniform {
    fn new(params: &BloomParams) -> Self {
        let f = composite_factors(params.strength(), params.radius());
        Self {
            factors: [[f[0], f[1], f[2], f[3]], [f[4], 0.0, 0.0, 0.0]],
        }
    }
}

/// Size-independent GPU state.
struct BloomPipelines {
    sampler: wgpu::Sampler,
    source_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    high_pass: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    high_pass_ubo: wgpu::Buffer,
    composite_ubo: wgpu::Buffer,
}

impl BloomPipelines {
    fn new(device: &wgpu::Device, params: &BloomParams) -> Self {
        let sampler = common::linear_clamp_sampler(device, "ionview bloom sampler");

        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ionview bloom source bgl"),
            entries: &[
                common::texture_entry(0),
                common::sampler_entry(1),
                common::uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ionview bloom composite bgl"),
            entries: &[
                common::texture_entry(0),
                common::sampler_entry(1),
                common::uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
                common::texture_entry(3),
                common::texture_entry(4),
                common::texture_entry(5),
                common::texture_entry(6),
                common::texture_entry(7),
            ],
        });

        let high_pass_shader = common::fullscreen_shader(
            device,
            "ionview bloom high pass shader",
            include_str!("shaders/bloom_high_pass.wgsl"),
        );
        let blur_shader = common::fullscreen_shader(
            device,
            "ionview bloom blur shader",
            include_str!("shaders/bloom_blur.wgsl"),
        );
        let composite_shader = common::fullscreen_shader(
            device,
            "ionview bloom composite shader",
            include_str!("shaders/bloom_composite.wgsl"),
        );

        let high_pass = common::fullscreen_pipeline(
            device,
            "ionview bloom high pass",
            &high_pass_shader,
            "fs_high_pass",
            &[&source_layout],
            HDR_FORMAT,
        );
        let blur = common::fullscreen_pipeline(
            device,
            "ionview bloom blur",
            &blur_shader,
            "fs_blur",
            &[&source_layout],
            HDR_FORMAT,
        );
        let composite = common::fullscreen_pipeline(
            device,
            "ionview bloom composite",
            &composite_shader,
            "fs_composite",
            &[&composite_layout],
            HDR_FORMAT,
        );

        let high_pass_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ionview bloom high pass ubo"),
            contents: bytemuck::bytes_of(&HighPassUniform {
                threshold: params.threshold(),
                smooth_width: SMOOTH_WIDTH,
                _pad: [0.0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let composite_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ionview bloom composite ubo"),
            contents: bytemuck::bytes_of(&CompositeUniform::new(params)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Self {
            sampler,
            source_layout,
            composite_layout,
            high_pass,
            blur,
            composite,
            high_pass_ubo,
            composite_ubo,
        }
    }

    fn source_group(
        &self,
        device: &wgpu::Device,
        label: &str,
        view: &wgpu::TextureView,
        ubo: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.source_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ubo.as_entire_binding(),
                },
            ],
        })
    }
}

/// Size-dependent targets plus the blur bind groups that read them.
struct BloomChain {
    bright: RenderTexture,
    horizontal: [RenderTexture; MIP_LEVELS],
    vertical: [RenderTexture; MIP_LEVELS],
    // Kept alive for the bind groups below.
    _blur_ubos: Vec<wgpu::Buffer>,
    blur_h_groups: Vec<wgpu::BindGroup>,
    blur_v_groups: Vec<wgpu::BindGroup>,
}

impl BloomChain {
    fn new(device: &wgpu::Device, pipelines: &BloomPipelines, size: (u32, u32)) -> Self {
        let sizes = mip_sizes(size.0, size.1);
        log::debug!("allocating bloom chain for {}x{}: {:?}", size.0, size.1, sizes);

        let bright = RenderTexture::color(device, "ionview bloom bright", sizes[0], HDR_FORMAT, 1);
        let horizontal: [RenderTexture; MIP_LEVELS] = std::array::from_fn(|i| {
            RenderTexture::color(device, "ionview bloom blur h", sizes[i], HDR_FORMAT, 1)
        });
        let vertical: [RenderTexture; MIP_LEVELS] = std::array::from_fn(|i| {
            RenderTexture::color(device, "ionview bloom blur v", sizes[i], HDR_FORMAT, 1)
        });

        let mut ubos = Vec::with_capacity(MIP_LEVELS * 2);
        let mut blur_h_groups = Vec::with_capacity(MIP_LEVELS);
        let mut blur_v_groups = Vec::with_capacity(MIP_LEVELS);

        for level in 0..MIP_LEVELS {
            let h_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ionview bloom blur h ubo"),
                contents: bytemuck::bytes_of(&BlurUniform::new([1.0, 0.0], sizes[level], KERNEL_RADII[level])),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let v_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ionview bloom blur v ubo"),
                contents: bytemuck::bytes_of(&BlurUniform::new([0.0, 1.0], sizes[level], KERNEL_RADII[level])),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let source = if level == 0 {
                &bright.view
            } else {
                &vertical[level - 1].view
            };
            blur_h_groups.push(pipelines.source_group(device, "ionview bloom blur h bg", source, &h_ubo));
            blur_v_groups.push(pipelines.source_group(
                device,
                "ionview bloom blur v bg",
                &horizontal[level].view,
                &v_ubo,
            ));

            ubos.push(h_ubo);
            ubos.push(v_ubo);
        }

        Self {
            bright,
            horizontal,
            vertical,
            _blur_ubos: ubos,
            blur_h_groups,
            blur_v_groups,
        }
    }
}

/// Unreal-style bloom: luminance high pass, separable blur over a mip chain,
/// weighted sum added back onto the input.
pub struct BloomPass {
    params: BloomParams,
    size: (u32, u32),

    pipelines: Option<BloomPipelines>,
    chain: Option<BloomChain>,
}

impl BloomPass {
    pub fn new(params: BloomParams) -> Self {
        Self {
            params,
            size: (1, 1),
            pipelines: None,
            chain: None,
        }
    }

    pub fn params(&self) -> &BloomParams {
        &self.params
    }

    fn ensure_resources(&mut self, device: &wgpu::Device) {
        if self.pipelines.is_none() {
            self.pipelines = Some(BloomPipelines::new(device, &self.params));
        }
        if self.chain.is_none() {
            if let Some(pipelines) = self.pipelines.as_ref() {
                self.chain = Some(BloomChain::new(device, pipelines, self.size));
            }
        }
    }
}

impl PostPass for BloomPass {
    fn name(&self) -> &str {
        "bloom"
    }

    fn set_size(&mut self, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if self.size != size {
            self.size = size;
            self.chain = None;
        }
    }

    fn render(
        &mut self,
        ctx: &PassCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        input: &RenderTexture,
        output: &RenderTexture,
    ) {
        self.ensure_resources(ctx.device);

        let Some(pipelines) = self.pipelines.as_ref() else { return };
        let Some(chain) = self.chain.as_ref() else { return };

        let high_pass_group = pipelines.source_group(
            ctx.device,
            "ionview bloom high pass bg",
            &input.view,
            &pipelines.high_pass_ubo,
        );
        common::draw_fullscreen(
            encoder,
            "ionview bloom high pass",
            &chain.bright.view,
            &pipelines.high_pass,
            &[&high_pass_group],
        );

        for level in 0..MIP_LEVELS {
            common::draw_fullscreen(
                encoder,
                "ionview bloom blur h",
                &chain.horizontal[level].view,
                &pipelines.blur,
                &[&chain.blur_h_groups[level]],
            );
            common::draw_fullscreen(
                encoder,
                "ionview bloom blur v",
                &chain.vertical[level].view,
                &pipelines.blur,
                &[&chain.blur_v_groups[level]],
            );
        }

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&input.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&pipelines.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: pipelines.composite_ubo.as_entire_binding(),
            },
        ];
        for (i, mip) in chain.vertical.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 3 + i as u32,
                resource: wgpu::BindingResource::TextureView(&mip.view),
            });
        }
        let composite_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ionview bloom composite bg"),
            layout: &pipelines.composite_layout,
            entries: &entries,
        });
        common::draw_fullscreen(
            encoder,
            "ionview bloom composite",
            &output.view,
            &pipelines.composite,
            &[&composite_group],
        );
    }

    fn release(&mut self) {
        self.chain = None;
        self.pipelines = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mips_halve_from_half_resolution() {
        let sizes = mip_sizes(1280, 720);
        assert_eq!(sizes, [(640, 360), (320, 180), (160, 90), (80, 45), (40, 23)]);
    }

    #[test]
    fn tiny_viewport_keeps_one_texel() {
        assert!(mip_sizes(3, 1).iter().all(|&(w, h)| w >= 1 && h >= 1));
    }

    #[test]
    fn gaussian_weights_fall_off() {
        let w = gaussian_coefficients(3);
        assert_eq!(w.len(), 3);
        assert_relative_eq!(w[0], 0.39894 / 3.0, epsilon = 1e-6);
        assert!(w.windows(2).all(|p| p[0] > p[1]));
    }

    #[test]
    fn largest_kernel_fits_uniform() {
        let max = KERNEL_RADII.iter().copied().max().unwrap_or(0) as usize;
        assert!(max <= MAX_KERNEL);
        assert_eq!(std::mem::size_of::<BlurUniform>(), 80);
    }

    #[test]
    fn blur_uniform_packs_coefficients_row_major() {
        let u = BlurUniform::new([1.0, 0.0], (200, 100), 5);
        let w = gaussian_coefficients(5);
        assert_eq!(u.coefficients[0], [w[0], w[1], w[2], w[3]]);
        assert_eq!(u.coefficients[1][0], w[4]);
        assert_eq!(u.coefficients[1][1], 0.0);
        assert_eq!(u.inv_size, [0.005, 0.01]);
    }

    #[test]
    fn composite_factors_mirror_around_radius() {
        let f = composite_factors(1.0, 1.2);
        assert_relative_eq!(f[0], 0.04, epsilon = 1e-5);
        assert_relative_eq!(f[4], 1.16, epsilon = 1e-5);

        let zero_radius = composite_factors(3.0, 0.0);
        assert_relative_eq!(zero_radius[0], 3.0);
        assert_relative_eq!(zero_radius[4], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn composite_uniform_scales_by_strength() {
        let params = BloomParams::default();
        let u = CompositeUniform::new(&params);
        assert_relative_eq!(u.factors[0][0], 0.12, epsilon = 1e-5);
        assert_relative_eq!(u.factors[1][0], 3.48, epsilon = 1e-5);
    }

    #[test]
    fn resize_invalidates_only_on_change() {
        let mut pass = BloomPass::new(BloomParams::default());
        pass.set_size(0, 0);
        assert_eq!(pass.size, (1, 1));
        pass.set_size(800, 600);
        assert_eq!(pass.size, (800, 600));
        assert_eq!(pass.name(), "bloom");
    }
}
