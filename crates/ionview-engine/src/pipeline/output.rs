use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::{common, RenderTexture};

use super::params::ToneMapping;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct OutputUniform {
    exposure: f32,
    mode: u32,
    encode_srgb: u32,
    _pad: u32,
}

impl OutputUniform {
    fn new(tone: ToneMapping, format: wgpu::TextureFormat) -> Self {
        Self {
            exposure: tone.exposure,
            mode: tone.mode.index(),
            encode_srgb: u32::from(!format.is_srgb()),
            _pad: 0,
        }
    }
}

/// Tone maps the final HDR target into the presentable surface.
///
/// Rebuilt when the surface format changes.
pub struct OutputPass {
    tone: ToneMapping,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    ubo: Option<wgpu::Buffer>,
}

impl OutputPass {
    pub fn new(tone: ToneMapping) -> Self {
        Self {
            tone,
            pipeline_format: None,
            pipeline: None,
            layout: None,
            sampler: None,
            ubo: None,
        }
    }

    pub fn tone_mapping(&self) -> ToneMapping {
        self.tone
    }

    pub fn render(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        encoder: &mut wgpu::CommandEncoder,
        input: &RenderTexture,
        target: &wgpu::TextureView,
    ) {
        self.ensure_pipeline(device, format);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(layout) = self.layout.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };
        let Some(ubo) = self.ubo.as_ref() else { return };

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ionview output bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ubo.as_entire_binding(),
                },
            ],
        });

        common::draw_fullscreen(encoder, "ionview output pass", target, pipeline, &[&bind_group]);
    }

    pub fn release(&mut self) {
        self.pipeline_format = None;
        self.pipeline = None;
        self.layout = None;
        self.sampler = None;
        self.ubo = None;
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }
        log::debug!("building output pipeline for {format:?}");

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ionview output bgl"),
            entries: &[
                common::texture_entry(0),
                common::sampler_entry(1),
                common::uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let shader = common::fullscreen_shader(
            device,
            "ionview output shader",
            include_str!("shaders/output.wgsl"),
        );
        let pipeline =
            common::fullscreen_pipeline(device, "ionview output", &shader, "fs_output", &[&layout], format);

        let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ionview output ubo"),
            contents: bytemuck::bytes_of(&OutputUniform::new(self.tone, format)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        self.sampler = Some(common::linear_clamp_sampler(device, "ionview output sampler"));
        self.layout = Some(layout);
        self.pipeline = Some(pipeline);
        self.ubo = Some(ubo);
        self.pipeline_format = Some(format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ToneMappingMode;

    #[test]
    fn srgb_surface_skips_manual_encoding() {
        let tone = ToneMapping::from_bloom_exposure(ToneMappingMode::Aces, 1.0);
        let u = OutputUniform::new(tone, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!((u.mode, u.encode_srgb), (3, 0));

        let u = OutputUniform::new(tone, wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(u.encode_srgb, 1);
        assert_eq!(std::mem::size_of::<OutputUniform>(), 16);
    }
}
