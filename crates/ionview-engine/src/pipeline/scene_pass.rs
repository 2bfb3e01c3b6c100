use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::camera::PerspectiveCamera;
use crate::render::{common, Color, RenderTexture, DEPTH_FORMAT, HDR_FORMAT};
use crate::scene::{LineVertex, Material, Primitive, Scene};

use super::pass::PassCtx;

const GLOBALS_WGSL: &str = include_str!("shaders/globals.wgsl");
const MODEL_WGSL: &str = include_str!("shaders/model.wgsl");

/// What the scene pass draws: the scene as seen from one camera.
#[derive(Copy, Clone)]
pub struct SceneView<'a> {
    pub scene: &'a Scene,
    pub camera: &'a PerspectiveCamera,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl MeshVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }

    fn interleave(prim: &Primitive) -> Vec<MeshVertex> {
        prim.positions
            .iter()
            .enumerate()
            .map(|(i, p)| MeshVertex {
                position: *p,
                normal: prim.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SceneGlobals {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
    shadow: [f32; 4],
}

impl SceneGlobals {
    fn new(view: &SceneView<'_>, shadows: bool, shadow_map_size: u32) -> Self {
        let light = &view.scene.directional;
        let dir = light.direction_to_light();
        let [ar, ag, ab] = view.scene.ambient.radiance();
        let [lr, lg, lb] = light.color;

        Self {
            view_proj: view.camera.view_proj().to_cols_array_2d(),
            light_view_proj: light.shadow_view_proj(view.scene.bounds()).to_cols_array_2d(),
            light_dir: [dir.x, dir.y, dir.z, light.intensity],
            light_color: [lr, lg, lb, if shadows { 1.0 } else { 0.0 }],
            ambient: [ar, ag, ab, 1.0],
            shadow: [
                light.shadow_radius,
                1.0 / shadow_map_size.max(1) as f32,
                light.shadow_bias,
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ModelUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    base_color: [f32; 4],
    emissive: [f32; 4],
}

impl ModelUniform {
    fn new(world: Mat4, material: &Material) -> Self {
        let [er, eg, eb] = material.emissive;
        Self {
            model: world.to_cols_array_2d(),
            normal: normal_matrix(world).to_cols_array_2d(),
            base_color: material.base_color,
            emissive: [er, eg, eb, 0.0],
        }
    }
}

/// Inverse-transpose of `world`; falls back to `world` when it is singular.
fn normal_matrix(world: Mat4) -> Mat4 {
    if world.determinant().abs() <= f32::EPSILON {
        world
    } else {
        world.inverse().transpose()
    }
}

struct GpuPrimitive {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    index_count: u32,
}

struct DrawItem {
    node: usize,
    mesh: usize,
    primitive: usize,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Vertex data uploaded once per scene plus one model uniform per draw.
struct SceneGeometry {
    node_count: usize,
    meshes: Vec<Vec<Option<GpuPrimitive>>>,
    draws: Vec<DrawItem>,
    axes: Option<wgpu::Buffer>,
}

/// Bind group layouts and the resources bound through group 0 and 2.
struct SceneLayouts {
    globals_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    shadow_layout: wgpu::BindGroupLayout,

    globals_ubo: wgpu::Buffer,
    globals_bg: wgpu::BindGroup,

    shadow_map: RenderTexture,
    shadow_bg: wgpu::BindGroup,
}

struct ScenePipelines {
    sample_count: u32,
    lit: wgpu::RenderPipeline,
    shadow: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
}

struct Attachments {
    size: (u32, u32),
    sample_count: u32,
    msaa: Option<RenderTexture>,
    depth: RenderTexture,
}

/// First pass of the chain: draws the scene into an HDR target.
///
/// Renders a shadow map for the directional light (when enabled), then the
/// lit meshes and the axes helper with MSAA, resolving into the output.
pub struct ScenePass {
    clear_color: Color,
    shadows: bool,
    sample_count: u32,
    size: (u32, u32),

    layouts: Option<SceneLayouts>,
    pipelines: Option<ScenePipelines>,
    geometry: Option<SceneGeometry>,
    attachments: Option<Attachments>,
}

impl ScenePass {
    pub fn new(clear_color: Color, shadows: bool, sample_count: u32) -> Self {
        Self {
            clear_color,
            shadows,
            sample_count: sample_count.max(1),
            size: (1, 1),
            layouts: None,
            pipelines: None,
            geometry: None,
            attachments: None,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Changes the MSAA sample count; pipelines and attachments are rebuilt lazily.
    pub fn set_sample_count(&mut self, samples: u32) {
        let samples = samples.max(1);
        if self.sample_count != samples {
            self.sample_count = samples;
            self.pipelines = None;
            self.attachments = None;
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if self.size != size {
            self.size = size;
            self.attachments = None;
        }
    }

    /// Forces vertex data to be uploaded again on the next frame.
    pub fn invalidate_geometry(&mut self) {
        self.geometry = None;
    }

    pub fn release(&mut self) {
        self.attachments = None;
        self.geometry = None;
        self.pipelines = None;
        self.layouts = None;
    }

    pub fn render(
        &mut self,
        ctx: &PassCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        view: &SceneView<'_>,
        output: &RenderTexture,
    ) {
        let shadows = self.shadows && view.scene.directional.cast_shadow;

        self.ensure_layouts(ctx.device, view.scene, shadows);
        self.ensure_pipelines(ctx.device);
        self.ensure_geometry(ctx.device, view.scene);
        self.ensure_attachments(ctx.device);

        let Some(layouts) = self.layouts.as_ref() else { return };
        let Some(pipelines) = self.pipelines.as_ref() else { return };
        let Some(geometry) = self.geometry.as_ref() else { return };
        let Some(attachments) = self.attachments.as_ref() else { return };

        let globals = SceneGlobals::new(view, shadows, layouts.shadow_map.size.0);
        ctx.queue.write_buffer(&layouts.globals_ubo, 0, bytemuck::bytes_of(&globals));

        let world = view.scene.world();
        let meshes = &view.scene.asset().meshes;
        for draw in &geometry.draws {
            let Some(prim) = meshes.get(draw.mesh).and_then(|m| m.primitives.get(draw.primitive)) else {
                continue;
            };
            let m = world.get(draw.node).copied().unwrap_or(Mat4::IDENTITY);
            ctx.queue.write_buffer(&draw.ubo, 0, bytemuck::bytes_of(&ModelUniform::new(m, &prim.material)));
        }

        if shadows {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ionview shadow pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &layouts.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&pipelines.shadow);
            rpass.set_bind_group(0, &layouts.globals_bg, &[]);
            draw_meshes(&mut rpass, geometry);
        }

        let (color_view, resolve_target, store) = match attachments.msaa.as_ref() {
            Some(msaa) => (&msaa.view, Some(&output.view), wgpu::StoreOp::Discard),
            None => (&output.view, None, wgpu::StoreOp::Store),
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ionview scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &attachments.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&pipelines.lit);
        rpass.set_bind_group(0, &layouts.globals_bg, &[]);
        rpass.set_bind_group(2, &layouts.shadow_bg, &[]);
        draw_meshes(&mut rpass, geometry);

        if let Some(axes) = geometry.axes.as_ref() {
            rpass.set_pipeline(&pipelines.lines);
            rpass.set_bind_group(0, &layouts.globals_bg, &[]);
            rpass.set_vertex_buffer(0, axes.slice(..));
            rpass.draw(0..6, 0..1);
        }
    }

    fn ensure_layouts(&mut self, device: &wgpu::Device, scene: &Scene, shadows: bool) {
        let map_size = if shadows {
            scene.directional.shadow_map_size.max(1)
        } else {
            1
        };
        if self
            .layouts
            .as_ref()
            .is_some_and(|l| l.shadow_map.size == (map_size, map_size))
        {
            return;
        }
        log::debug!("allocating scene bindings (shadow map {map_size}x{map_size})");

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ionview scene globals bgl"),
            entries: &[common::uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ionview scene model bgl"),
            entries: &[common::uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ionview scene shadow bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let globals_ubo = common::uniform_buffer(
            device,
            "ionview scene globals ubo",
            std::mem::size_of::<SceneGlobals>(),
        );
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ionview scene globals bg"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        let shadow_map = RenderTexture::depth(device, "ionview shadow map", (map_size, map_size), 1);
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ionview shadow sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadow_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ionview scene shadow bg"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        self.layouts = Some(SceneLayouts {
            globals_layout,
            model_layout,
            shadow_layout,
            globals_ubo,
            globals_bg,
            shadow_map,
            shadow_bg,
        });
        // Everything else references the old layouts.
        self.pipelines = None;
        self.geometry = None;
    }

    fn ensure_pipelines(&mut self, device: &wgpu::Device) {
        if self
            .pipelines
            .as_ref()
            .is_some_and(|p| p.sample_count == self.sample_count)
        {
            return;
        }
        let Some(layouts) = self.layouts.as_ref() else { return };

        let samples = self.sample_count;
        let multisample = wgpu::MultisampleState {
            count: samples,
            ..Default::default()
        };
        let depth = |bias: wgpu::DepthBiasState| {
            Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias,
            })
        };

        let lit_shader = compose_shader(device, "ionview scene shader", &[
            GLOBALS_WGSL,
            MODEL_WGSL,
            include_str!("shaders/scene.wgsl"),
        ]);
        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ionview scene pipeline layout"),
            bind_group_layouts: &[&layouts.globals_layout, &layouts.model_layout, &layouts.shadow_layout],
            immediate_size: 0,
        });
        let lit = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ionview scene pipeline"),
            layout: Some(&lit_layout),
            vertex: wgpu::VertexState {
                module: &lit_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &lit_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth(wgpu::DepthBiasState::default()),
            multisample,
            multiview_mask: None,
            cache: None,
        });

        let shadow_shader = compose_shader(device, "ionview shadow shader", &[
            GLOBALS_WGSL,
            MODEL_WGSL,
            include_str!("shaders/shadow.wgsl"),
        ]);
        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ionview shadow pipeline layout"),
            bind_group_layouts: &[&layouts.globals_layout, &layouts.model_layout],
            immediate_size: 0,
        });
        let shadow = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ionview shadow pipeline"),
            layout: Some(&shadow_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout()],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth(wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let lines_shader = compose_shader(device, "ionview lines shader", &[
            GLOBALS_WGSL,
            include_str!("shaders/lines.wgsl"),
        ]);
        let lines_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ionview lines pipeline layout"),
            bind_group_layouts: &[&layouts.globals_layout],
            immediate_size: 0,
        });
        let lines = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ionview lines pipeline"),
            layout: Some(&lines_layout),
            vertex: wgpu::VertexState {
                module: &lines_shader,
                entry_point: Some("vs_lines"),
                compilation_options: Default::default(),
                buffers: &[LineVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &lines_shader,
                entry_point: Some("fs_lines"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: depth(wgpu::DepthBiasState::default()),
            multisample,
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built scene pipelines ({samples}x MSAA)");
        self.pipelines = Some(ScenePipelines {
            sample_count: samples,
            lit,
            shadow,
            lines,
        });
    }

    fn ensure_geometry(&mut self, device: &wgpu::Device, scene: &Scene) {
        let node_count = scene.asset().nodes.len();
        if self.geometry.as_ref().is_some_and(|g| g.node_count == node_count) {
            return;
        }
        let Some(layouts) = self.layouts.as_ref() else { return };

        let meshes: Vec<Vec<Option<GpuPrimitive>>> = scene
            .asset()
            .meshes
            .iter()
            .map(|mesh| mesh.primitives.iter().map(|p| upload_primitive(device, p)).collect())
            .collect();

        let mut draws = Vec::new();
        for (node, _, _) in scene.mesh_instances() {
            let Some(mesh) = scene.asset().nodes.get(node).and_then(|n| n.mesh) else { continue };
            let Some(prims) = meshes.get(mesh) else { continue };
            for (primitive, gpu) in prims.iter().enumerate() {
                if gpu.is_none() {
                    continue;
                }
                let ubo = common::uniform_buffer(
                    device,
                    "ionview scene model ubo",
                    std::mem::size_of::<ModelUniform>(),
                );
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("ionview scene model bg"),
                    layout: &layouts.model_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    }],
                });
                draws.push(DrawItem {
                    node,
                    mesh,
                    primitive,
                    ubo,
                    bind_group,
                });
            }
        }

        let axes = scene.axes.map(|axes| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ionview axes vbo"),
                contents: bytemuck::cast_slice(&axes.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        log::debug!("uploaded scene geometry: {} draws", draws.len());
        self.geometry = Some(SceneGeometry {
            node_count,
            meshes,
            draws,
            axes,
        });
    }

    fn ensure_attachments(&mut self, device: &wgpu::Device) {
        if self
            .attachments
            .as_ref()
            .is_some_and(|a| a.size == self.size && a.sample_count == self.sample_count)
        {
            return;
        }
        let (size, samples) = (self.size, self.sample_count);
        log::debug!("allocating scene attachments {}x{} ({samples}x MSAA)", size.0, size.1);

        let msaa = (samples > 1)
            .then(|| RenderTexture::color(device, "ionview scene msaa", size, HDR_FORMAT, samples));
        let depth = RenderTexture::depth(device, "ionview scene depth", size, samples);

        self.attachments = Some(Attachments {
            size,
            sample_count: samples,
            msaa,
            depth,
        });
    }
}

fn compose_shader(device: &wgpu::Device, label: &str, parts: &[&str]) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(parts.join("\n").into()),
    })
}

fn upload_primitive(device: &wgpu::Device, prim: &Primitive) -> Option<GpuPrimitive> {
    if prim.positions.is_empty() || prim.indices.is_empty() {
        return None;
    }
    let vertices = MeshVertex::interleave(prim);
    let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ionview mesh vbo"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ionview mesh ibo"),
        contents: bytemuck::cast_slice(&prim.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    Some(GpuPrimitive {
        vbo,
        ibo,
        index_count: prim.indices.len() as u32,
    })
}

/// Binds group 1 and draws every uploaded primitive instance.
fn draw_meshes(rpass: &mut wgpu::RenderPass<'_>, geometry: &SceneGeometry) {
    for draw in &geometry.draws {
        let Some(Some(prim)) = geometry.meshes.get(draw.mesh).and_then(|m| m.get(draw.primitive)) else {
            continue;
        };
        rpass.set_bind_group(1, &draw.bind_group, &[]);
        rpass.set_vertex_buffer(0, prim.vbo.slice(..));
        rpass.set_index_buffer(prim.ibo.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..prim.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AmbientLight, DirectionalLight, SceneAsset};
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn scene() -> Scene {
        Scene::new(
            SceneAsset::default(),
            DirectionalLight {
                position: Vec3::new(7.0, 10.0, -2.0),
                target: Vec3::ZERO,
                color: [1.0; 3],
                intensity: 0.3,
                cast_shadow: true,
                shadow_radius: 3.0,
                shadow_bias: 0.002,
                shadow_map_size: 2048,
            },
            AmbientLight {
                color: [1.0; 3],
                intensity: 0.9,
            },
        )
    }

    #[test]
    fn uniform_sizes_match_shader_structs() {
        assert_eq!(std::mem::size_of::<SceneGlobals>(), 192);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 160);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }

    #[test]
    fn globals_carry_light_and_shadow_settings() {
        let scene = scene();
        let camera = PerspectiveCamera::new(50.0, 1.0, 0.01, 1000.0)
            .unwrap()
            .with_position(Vec3::new(4.0, 2.0, 2.0));
        let view = SceneView {
            scene: &scene,
            camera: &camera,
        };

        let g = SceneGlobals::new(&view, true, 2048);
        assert_eq!(g.light_dir[3], 0.3);
        assert_eq!(g.light_color[3], 1.0);
        assert_relative_eq!(g.ambient[0], 0.9);
        assert_eq!(g.shadow[0], 3.0);
        assert_relative_eq!(g.shadow[1], 1.0 / 2048.0);

        let g = SceneGlobals::new(&view, false, 1);
        assert_eq!(g.light_color[3], 0.0);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(world);
        assert_relative_eq!(n.x_axis.x, 0.5);
        assert_relative_eq!(n.y_axis.y, 1.0);
    }

    #[test]
    fn degenerate_world_matrix_stays_finite() {
        let n = normal_matrix(Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0)));
        assert!(n.is_finite());
    }

    #[test]
    fn missing_normals_default_to_up() {
        let prim = Primitive {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]],
            indices: vec![0, 1, 0],
            material: Material::default(),
        };
        let v = MeshVertex::interleave(&prim);
        assert_eq!(v[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(v[1].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn sample_count_change_invalidates_lazily() {
        let mut pass = ScenePass::new(Color::BLACK, true, 0);
        assert_eq!(pass.sample_count(), 1);
        pass.set_sample_count(4);
        assert_eq!(pass.sample_count(), 4);
        pass.set_size(0, 0);
        assert_eq!(pass.size, (1, 1));
    }
}
