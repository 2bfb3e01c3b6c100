//! Render chain: scene pass, post passes, tone-mapped output.
//!
//! Responsibilities:
//! - own every pass and its intermediate targets
//! - hand the output of pass *i* to pass *i + 1*
//! - keep bloom and tone mapping parameters fixed after construction

mod bloom;
mod composer;
mod output;
mod params;
mod pass;
mod scene_pass;
mod targets;

pub use bloom::{composite_factors, gaussian_coefficients, mip_sizes, BloomPass, KERNEL_RADII, MIP_LEVELS};
pub use composer::{EffectPipeline, PipelineError, SCENE_PASS_NAME};
pub use output::OutputPass;
pub use params::{BloomParams, RendererSettings, ToneMapping, ToneMappingMode};
pub use pass::{plan_chain, PassCtx, PostPass};
pub use scene_pass::{ScenePass, SceneView};
pub use targets::PingPong;
