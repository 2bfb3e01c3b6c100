use thiserror::Error;

use crate::render::{RenderCtx, RenderTarget};

use super::bloom::BloomPass;
use super::output::OutputPass;
use super::params::{BloomParams, RendererSettings, ToneMapping};
use super::pass::{plan_chain, PassCtx, PostPass};
use super::scene_pass::{ScenePass, SceneView};
use super::targets::PingPong;

/// Name reported for the built-in first pass.
pub const SCENE_PASS_NAME: &str = "scene";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("pass name `{0}` is reserved for the scene pass")]
    ReservedName(String),

    #[error("a pass named `{0}` is already in the chain")]
    DuplicatePass(String),
}

/// Ordered render chain: scene pass, post passes in insertion order, output.
///
/// The scene pass is not a [`PostPass`] and always runs first. Post passes
/// alternate between two HDR targets; the last one written is tone mapped
/// into the surface.
pub struct EffectPipeline {
    bloom: BloomParams,
    tone: ToneMapping,
    size: (u32, u32),

    scene: ScenePass,
    passes: Vec<Box<dyn PostPass>>,
    targets: PingPong,
    output: OutputPass,
}

impl EffectPipeline {
    /// Builds the default chain `[scene, bloom]`.
    ///
    /// Tone mapping exposure is derived here once and never recomputed.
    pub fn new(settings: &RendererSettings, bloom: BloomParams) -> Self {
        let tone = ToneMapping::from_bloom_exposure(settings.tone_mapping, bloom.exposure());
        log::info!(
            "effect pipeline: bloom strength={} radius={} threshold={}, tone mapping {:?} exposure={:.4}",
            bloom.strength(),
            bloom.radius(),
            bloom.threshold(),
            tone.mode,
            tone.exposure,
        );

        Self {
            bloom,
            tone,
            size: (1, 1),
            scene: ScenePass::new(settings.clear_color, settings.shadows, settings.msaa_samples),
            passes: vec![Box::new(BloomPass::new(bloom))],
            targets: PingPong::default(),
            output: OutputPass::new(tone),
        }
    }

    /// Appends a post pass after the existing ones.
    pub fn add_pass(&mut self, mut pass: Box<dyn PostPass>) -> Result<(), PipelineError> {
        let name = pass.name().to_string();
        if name == SCENE_PASS_NAME {
            return Err(PipelineError::ReservedName(name));
        }
        if self.passes.iter().any(|p| p.name() == name) {
            return Err(PipelineError::DuplicatePass(name));
        }

        pass.set_size(self.size.0, self.size.1);
        log::debug!("added post pass `{name}` at position {}", self.passes.len() + 1);
        self.passes.push(pass);
        Ok(())
    }

    /// Pass names in execution order, starting with the scene pass.
    pub fn pass_names(&self) -> Vec<&str> {
        std::iter::once(SCENE_PASS_NAME)
            .chain(self.passes.iter().map(|p| p.name()))
            .collect()
    }

    pub fn bloom_params(&self) -> &BloomParams {
        &self.bloom
    }

    pub fn tone_mapping(&self) -> ToneMapping {
        self.tone
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Resizes every pass's intermediate targets. Zero extents are clamped to 1.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if self.size == size {
            return;
        }
        self.size = size;
        self.scene.set_size(size.0, size.1);
        for pass in &mut self.passes {
            pass.set_size(size.0, size.1);
        }
        self.targets.set_size(size.0, size.1);
    }

    pub fn sample_count(&self) -> u32 {
        self.scene.sample_count()
    }

    pub fn set_sample_count(&mut self, samples: u32) {
        self.scene.set_sample_count(samples);
    }

    /// Re-uploads scene geometry on the next frame.
    pub fn invalidate_scene(&mut self) {
        self.scene.invalidate_geometry();
    }

    /// Records the whole chain into `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        view: &SceneView<'_>,
        timestamp_ms: f64,
    ) {
        let (width, height) = ctx.target_size();
        self.set_size(width, height);

        let pass_ctx = PassCtx {
            device: ctx.device,
            queue: ctx.queue,
            timestamp_ms,
        };
        let targets = self.targets.ensure(ctx.device);

        self.scene.render(&pass_ctx, target.encoder, view, &targets[0]);

        let (steps, last) = plan_chain(self.passes.len());
        for (pass, &(input, output)) in self.passes.iter_mut().zip(steps.iter()) {
            pass.render(&pass_ctx, target.encoder, &targets[input], &targets[output]);
        }

        self.output.render(
            ctx.device,
            ctx.surface_format,
            target.encoder,
            &targets[last],
            target.surface_view,
        );
    }

    /// Drops every GPU resource held by the chain.
    pub fn release(&mut self) {
        self.scene.release();
        for pass in &mut self.passes {
            pass.release();
        }
        self.targets.release();
        self.output.release();
        log::debug!("effect pipeline resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ToneMappingMode;
    use crate::render::RenderTexture;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl PostPass for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.log.borrow_mut().push(format!("{}:size {width}x{height}", self.name));
        }

        fn render(
            &mut self,
            _ctx: &PassCtx<'_>,
            _encoder: &mut wgpu::CommandEncoder,
            _input: &RenderTexture,
            _output: &RenderTexture,
        ) {
            self.log.borrow_mut().push(format!("{}:render", self.name));
        }

        fn release(&mut self) {
            self.log.borrow_mut().push(format!("{}:release", self.name));
        }
    }

    fn recorder(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn PostPass> {
        Box::new(Recorder {
            name,
            log: Rc::clone(log),
        })
    }

    fn pipeline() -> EffectPipeline {
        EffectPipeline::new(&RendererSettings::default(), BloomParams::default())
    }

    #[test]
    fn scene_then_bloom_by_default() {
        assert_eq!(pipeline().pass_names(), vec!["scene", "bloom"]);
    }

    #[test]
    fn added_passes_run_after_bloom_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut p = pipeline();
        p.add_pass(recorder("vignette", &log)).unwrap();
        p.add_pass(recorder("grain", &log)).unwrap();
        assert_eq!(p.pass_names(), vec!["scene", "bloom", "vignette", "grain"]);
    }

    #[test]
    fn second_scene_pass_is_rejected() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut p = pipeline();
        assert_eq!(
            p.add_pass(recorder("scene", &log)),
            Err(PipelineError::ReservedName("scene".into()))
        );
        assert_eq!(
            p.add_pass(recorder("bloom", &log)),
            Err(PipelineError::DuplicatePass("bloom".into()))
        );
        assert_eq!(p.pass_names().len(), 2);
    }

    #[test]
    fn resize_reaches_every_post_pass() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut p = pipeline();
        p.add_pass(recorder("vignette", &log)).unwrap();
        log.borrow_mut().clear();

        p.set_size(640, 0);
        p.set_size(640, 1);
        assert_eq!(p.size(), (640, 1));
        assert_eq!(*log.borrow(), vec!["vignette:size 640x1".to_string()]);
    }

    #[test]
    fn added_pass_inherits_current_size() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut p = pipeline();
        p.set_size(800, 600);
        p.add_pass(recorder("vignette", &log)).unwrap();
        assert_eq!(*log.borrow(), vec!["vignette:size 800x600".to_string()]);
    }

    #[test]
    fn release_reaches_every_post_pass() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut p = pipeline();
        p.add_pass(recorder("vignette", &log)).unwrap();
        p.release();
        assert!(log.borrow().contains(&"vignette:release".to_string()));
    }

    #[test]
    fn parameters_are_fixed_at_construction() {
        let settings = RendererSettings {
            tone_mapping: ToneMappingMode::Aces,
            ..RendererSettings::default()
        };
        let mut p = EffectPipeline::new(&settings, BloomParams::default());
        let before = (*p.bloom_params(), p.tone_mapping());

        p.set_size(1920, 1080);
        p.set_sample_count(1);
        p.release();

        assert_eq!((*p.bloom_params(), p.tone_mapping()), before);
        assert_eq!(before.1.mode, ToneMappingMode::Aces);
        assert!((before.1.exposure - 10.4976).abs() < 1e-4);
    }
}
