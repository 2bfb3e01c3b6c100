use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::render::{RenderCtx, HDR_FORMAT};

use super::frame::{GpuFrame, SurfaceErrorAction};
use super::init::GpuInit;
use super::surface;

/// wgpu device, queue and the configured window surface.
///
/// `'w` is the window borrow; the surface cannot outlive it.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    adapter_info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,

    config: wgpu::SurfaceConfiguration,
    /// Drawable size in physical pixels. May be zero while minimized.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;
        let adapter_info = adapter.get_info();
        log::info!(
            "GPU adapter: {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.device_type,
            adapter_info.backend
        );

        let (device, queue) = request_device(&adapter).await?;
        let config = surface_config(&surface, &adapter, &init, size)?;
        surface.configure(&device, &config);
        log::debug!(
            "surface configured: {:?} {}x{} {:?}",
            config.format,
            config.width,
            config.height,
            config.present_mode
        );

        let gpu = Self {
            _instance: instance,
            surface,
            adapter,
            adapter_info,
            device,
            queue,
            config,
            size,
        };
        log::info!(
            "HDR target {HDR_FORMAT:?} supports up to x{} MSAA",
            gpu.supported_sample_count(HDR_FORMAT, 16)
        );
        Ok(gpu)
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Device, queue, surface format and size bundled for the render passes.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(
            &self.device,
            &self.queue,
            self.config.format,
            (self.size.width, self.size.height),
        )
    }

    /// Largest MSAA sample count `<= requested` usable as a render attachment in `format`.
    pub fn supported_sample_count(&self, format: wgpu::TextureFormat, requested: u32) -> u32 {
        let flags = self.adapter.get_texture_format_features(format).flags;
        surface::pick_sample_count(requested, |n| flags.sample_count_supported(n))
    }

    /// Reconfigures the surface for `new_size`. Returns `false` while minimized.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        surface::apply_resize(&self.surface, &self.device, &mut self.config, &mut self.size, new_size)
    }

    /// Acquires the next swapchain image.
    ///
    /// Lost or outdated surfaces are reconfigured here; the caller only sees
    /// what to do with the current frame.
    pub fn acquire_frame(&self) -> Result<GpuFrame, SurfaceErrorAction> {
        let surface_texture = self.surface.get_current_texture().map_err(|err| {
            surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
        })?;

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ionview frame encoder"),
        });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the image.
    pub fn present(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("ionview device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}

fn surface_config(
    surface: &wgpu::Surface<'_>,
    adapter: &wgpu::Adapter,
    init: &GpuInit,
    size: PhysicalSize<u32>,
) -> Result<wgpu::SurfaceConfiguration> {
    let caps = surface.get_capabilities(adapter);
    let format = surface::choose_surface_format(&caps.formats, init.prefer_srgb)
        .context("surface reports no supported formats")?;

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: init.present_mode,
        alpha_mode: surface::choose_alpha_mode(&caps.alpha_modes),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}
