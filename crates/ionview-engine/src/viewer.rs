//! The model viewer: one asset, one camera, one render loop.
//!
//! Startup order:
//! 1. await the asset loader (failure ends startup, no frame is requested)
//! 2. build scene, clip library, camera, controller and pipeline from config
//! 3. start the frame scheduler once the window is up

use crate::animation::{AnimationError, AnimationMixer, ClipLibrary};
use crate::assets::AssetLoader;
use crate::camera::{OrbitController, PerspectiveCamera};
use crate::config::{AnimationSection, ViewerConfig};
use crate::core::{present_frame, App, AppControl, FrameCtx, StartCtx, WindowCtx};
use crate::device::Gpu;
use crate::error::ViewerError;
use crate::input::{InputEvent, InputState, Key};
use crate::pipeline::{EffectPipeline, SceneView};
use crate::render::HDR_FORMAT;
use crate::scene::{Scene, SceneAsset};
use crate::schedule::{CancelHandle, FrameHost, FrameOutcome, FrameScheduler, FrameStages};
use crate::time::{FrameClock, FrameTime};

pub struct Viewer {
    scene: Scene,
    camera: PerspectiveCamera,
    controller: OrbitController,
    mixer: AnimationMixer,
    pipeline: EffectPipeline,
    scheduler: FrameScheduler,
    msaa_samples: u32,
}

impl Viewer {
    /// Builds a viewer around an already loaded asset.
    ///
    /// `viewport` is the initial drawable size in physical pixels.
    pub fn new(config: &ViewerConfig, asset: SceneAsset, viewport: (u32, u32)) -> Result<Self, ViewerError> {
        config.validate()?;

        let stats = asset.stats();
        log::info!(
            "scene '{}': {} nodes, {} meshes, {} clips",
            asset.source,
            stats.nodes,
            stats.meshes,
            stats.clips
        );

        let mut scene = Scene::new(asset, config.lights.directional.light(), config.lights.ambient.light());
        if let Some(axes) = config.helpers.axes() {
            scene = scene.with_axes(axes);
        }

        let mut library = ClipLibrary::new(scene.take_clips());
        if config.animation.optimize {
            let removed = library.optimize_all();
            if removed > 0 {
                log::debug!("clip optimization removed {removed} redundant keyframes");
            }
        }
        let mut mixer = AnimationMixer::new(library);
        select_clip(&mut mixer, &config.animation)?;

        let (width, height) = (viewport.0.max(1), viewport.1.max(1));
        let camera = config.camera.build(width as f32 / height as f32)?;

        let mut controller = OrbitController::new(config.orbit.settings());
        controller.set_viewport(width as f32, height as f32);

        let settings = config.renderer.settings();
        let mut pipeline = EffectPipeline::new(&settings, config.bloom.params());
        pipeline.set_size(width, height);

        Ok(Self {
            scene,
            camera,
            controller,
            mixer,
            pipeline,
            scheduler: FrameScheduler::new(FrameClock::with_max_delta(config.frame.max_frame_delta)),
            msaa_samples: settings.msaa_samples,
        })
    }

    /// Awaits `loader` for the configured asset, then builds the viewer.
    pub async fn load<L>(loader: &L, config: &ViewerConfig, viewport: (u32, u32)) -> Result<Self, ViewerError>
    where
        L: AssetLoader,
    {
        let source = config.asset.path.to_string_lossy();
        let asset = loader.load(&source).await?;
        Self::new(config, asset, viewport)
    }

    /// Loads the asset and starts the render loop on `host`.
    ///
    /// Nothing is requested from `host` unless loading and setup succeed.
    pub async fn launch<L, H>(
        loader: &L,
        config: &ViewerConfig,
        viewport: (u32, u32),
        host: &mut H,
    ) -> Result<Self, ViewerError>
    where
        L: AssetLoader,
        H: FrameHost + ?Sized,
    {
        let mut viewer = Self::load(loader, config, viewport).await?;
        viewer.start(host);
        Ok(viewer)
    }

    pub fn start<H>(&mut self, host: &mut H)
    where
        H: FrameHost + ?Sized,
    {
        self.scheduler.start(host);
    }

    /// Withdraws the pending frame and releases pipeline resources.
    pub fn stop<H>(&mut self, host: &mut H)
    where
        H: FrameHost + ?Sized,
    {
        self.scheduler.stop(host);
        self.pipeline.release();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.scheduler.cancel_handle()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn pipeline(&self) -> &EffectPipeline {
        &self.pipeline
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    fn apply_viewport(&mut self, window: &WindowCtx<'_>) {
        let (width, height) = window.physical_size();
        let (logical_w, logical_h) = window.logical_size();
        self.camera.set_viewport(width, height);
        self.controller.set_viewport(logical_w, logical_h);
        self.pipeline.set_size(width, height);
    }

    /// One scheduler callback with `render` as the final stage.
    fn run_frame<H, R>(&mut self, timestamp_ms: f64, host: &mut H, render: R) -> FrameOutcome
    where
        H: FrameHost + ?Sized,
        R: FnMut(&mut EffectPipeline, &SceneView<'_>, &FrameTime) -> AppControl,
    {
        let mut stages = ViewerStages::new(
            &mut self.scene,
            &mut self.camera,
            &mut self.controller,
            &mut self.mixer,
            &mut self.pipeline,
            render,
        );
        self.scheduler.on_frame(timestamp_ms, host, &mut stages)
    }
}

/// Resolves the configured clip.
///
/// A named clip must exist. Without a name the first clip plays; an empty
/// library leaves the mixer idle unless a clip is required.
fn select_clip(mixer: &mut AnimationMixer, anim: &AnimationSection) -> Result<(), AnimationError> {
    if let Some(name) = anim.clip.as_deref() {
        return mixer.select(name).map(|_| ());
    }

    match mixer.select_index(0) {
        Ok(_) => Ok(()),
        Err(_) if anim.require_clip => Err(AnimationError::MissingClip {
            requested: "<first clip>".to_string(),
            available: Vec::new(),
        }),
        Err(_) => {
            log::warn!("asset has no animation clips; animation disabled");
            Ok(())
        }
    }
}

struct ViewerStages<'a, R> {
    scene: &'a mut Scene,
    camera: &'a mut PerspectiveCamera,
    controller: &'a mut OrbitController,
    mixer: &'a mut AnimationMixer,
    pipeline: &'a mut EffectPipeline,
    render: R,
}

impl<'a, R> ViewerStages<'a, R>
where
    R: FnMut(&mut EffectPipeline, &SceneView<'_>, &FrameTime) -> AppControl,
{
    fn new(
        scene: &'a mut Scene,
        camera: &'a mut PerspectiveCamera,
        controller: &'a mut OrbitController,
        mixer: &'a mut AnimationMixer,
        pipeline: &'a mut EffectPipeline,
        render: R,
    ) -> Self {
        Self {
            scene,
            camera,
            controller,
            mixer,
            pipeline,
            render,
        }
    }
}

impl<R> FrameStages for ViewerStages<'_, R>
where
    R: FnMut(&mut EffectPipeline, &SceneView<'_>, &FrameTime) -> AppControl,
{
    fn advance_animation(&mut self, dt: f32) {
        if self.mixer.is_idle() {
            return;
        }
        self.mixer.update(dt, self.scene.nodes_mut());
        self.scene.refresh_world();
    }

    fn update_interaction(&mut self) {
        self.controller.update(self.camera);
    }

    fn render(&mut self, time: &FrameTime) -> AppControl {
        let view = SceneView {
            scene: &*self.scene,
            camera: &*self.camera,
        };
        (self.render)(&mut *self.pipeline, &view, time)
    }
}

impl App for Viewer {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> AppControl {
        let samples = ctx.gpu.supported_sample_count(HDR_FORMAT, self.msaa_samples);
        if samples != self.msaa_samples {
            log::info!("MSAA x{} unsupported for {HDR_FORMAT:?}; using x{samples}", self.msaa_samples);
        }
        self.pipeline.set_sample_count(samples);
        self.apply_viewport(&ctx.window);

        self.start(&mut *ctx.frames);
        AppControl::Continue
    }

    fn on_input(&mut self, event: &InputEvent, _input: &InputState) -> AppControl {
        if event.is_key_press(Key::Escape) {
            log::info!("escape pressed; exiting");
            return AppControl::Exit;
        }
        self.controller.handle_input(event);
        AppControl::Continue
    }

    fn on_resize(&mut self, window: &WindowCtx<'_>, _gpu: &Gpu<'_>) {
        self.apply_viewport(window);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let gpu = &mut *ctx.gpu;
        let window = &ctx.window;

        let outcome = self.run_frame(ctx.timestamp_ms, &mut *ctx.frames, |pipeline, view, time| {
            present_frame(gpu, window, |rctx, target| {
                pipeline.render(rctx, target, view, time.timestamp_ms);
            })
        });

        match outcome {
            FrameOutcome::Stopped => AppControl::Exit,
            FrameOutcome::Primed | FrameOutcome::Rendered(_) | FrameOutcome::Ignored => AppControl::Continue,
        }
    }

    fn on_stop(&mut self, frames: &mut dyn FrameHost) {
        self.stop(frames);
    }
}
