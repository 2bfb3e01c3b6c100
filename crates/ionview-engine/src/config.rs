//! Viewer configuration.
//!
//! Every field has a default, so an empty (or missing) file yields the stock
//! viewer: bloom on, Reinhard tone mapping, orbit camera at (4, 2, 2).

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{CameraError, OrbitSettings, PerspectiveCamera};
use crate::pipeline::{BloomParams, RendererSettings, ToneMappingMode};
use crate::render::Color;
use crate::scene::{AmbientLight, AxesHelper, DirectionalLight};
use crate::time::DEFAULT_MAX_FRAME_DELTA;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowSection,
    pub asset: AssetSection,
    pub bloom: BloomSection,
    pub renderer: RendererSection,
    pub camera: CameraSection,
    pub orbit: OrbitSection,
    pub lights: LightsSection,
    pub helpers: HelpersSection,
    pub animation: AnimationSection,
    pub frame: FrameSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "ionview".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSection {
    pub path: PathBuf,
}

impl Default for AssetSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/PrimaryIonDrive.glb"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSection {
    pub exposure: f32,
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomSection {
    fn default() -> Self {
        let p = BloomParams::default();
        Self {
            exposure: p.exposure(),
            strength: p.strength(),
            radius: p.radius(),
            threshold: p.threshold(),
        }
    }
}

impl BloomSection {
    pub fn params(&self) -> BloomParams {
        BloomParams::new(self.exposure, self.strength, self.radius, self.threshold)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSection {
    /// `0xRRGGBB`, sRGB.
    pub clear_color: u32,
    pub tone_mapping: ToneMappingMode,
    pub shadows: bool,
    pub msaa_samples: u32,
}

impl Default for RendererSection {
    fn default() -> Self {
        Self {
            clear_color: 0x000000,
            tone_mapping: ToneMappingMode::Reinhard,
            shadows: true,
            msaa_samples: 4,
        }
    }
}

impl RendererSection {
    pub fn settings(&self) -> RendererSettings {
        RendererSettings {
            clear_color: Color::from_hex(self.clear_color),
            tone_mapping: self.tone_mapping,
            shadows: self.shadows,
            msaa_samples: self.msaa_samples.max(1),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            fov_deg: 50.0,
            near: 0.01,
            far: 1000.0,
            position: [4.0, 2.0, 2.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

impl CameraSection {
    pub fn build(&self, aspect: f32) -> Result<PerspectiveCamera, CameraError> {
        let mut camera = PerspectiveCamera::new(self.fov_deg, aspect, self.near, self.far)?
            .with_position(Vec3::from_array(self.position));
        camera.look_at(Vec3::from_array(self.target));
        Ok(camera)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSection {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub key_pan_speed: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl Default for OrbitSection {
    fn default() -> Self {
        let s = OrbitSettings::default();
        Self {
            min_distance: s.min_distance,
            max_distance: s.max_distance,
            min_polar_angle: s.min_polar_angle,
            max_polar_angle: s.max_polar_angle,
            enable_damping: s.enable_damping,
            damping_factor: s.damping_factor,
            rotate_speed: s.rotate_speed,
            zoom_speed: s.zoom_speed,
            pan_speed: s.pan_speed,
            key_pan_speed: s.key_pan_speed,
            auto_rotate: s.auto_rotate,
            auto_rotate_speed: s.auto_rotate_speed,
        }
    }
}

impl OrbitSection {
    pub fn settings(&self) -> OrbitSettings {
        OrbitSettings {
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            min_polar_angle: self.min_polar_angle,
            max_polar_angle: self.max_polar_angle,
            enable_damping: self.enable_damping,
            damping_factor: self.damping_factor,
            rotate_speed: self.rotate_speed,
            zoom_speed: self.zoom_speed,
            pan_speed: self.pan_speed,
            key_pan_speed: self.key_pan_speed,
            auto_rotate: self.auto_rotate,
            auto_rotate_speed: self.auto_rotate_speed,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalSection {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub color: u32,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow_radius: f32,
    pub shadow_bias: f32,
    pub shadow_map_size: u32,
}

impl Default for DirectionalSection {
    fn default() -> Self {
        Self {
            position: [7.0, 10.0, -2.0],
            target: [0.0, 0.0, 0.0],
            color: 0xffffff,
            intensity: 0.3,
            cast_shadow: true,
            shadow_radius: 3.0,
            shadow_bias: 0.002,
            shadow_map_size: 2048,
        }
    }
}

impl DirectionalSection {
    pub fn light(&self) -> DirectionalLight {
        DirectionalLight {
            position: Vec3::from_array(self.position),
            target: Vec3::from_array(self.target),
            color: Color::from_hex(self.color).to_array3(),
            intensity: self.intensity,
            cast_shadow: self.cast_shadow,
            shadow_radius: self.shadow_radius,
            shadow_bias: self.shadow_bias,
            shadow_map_size: self.shadow_map_size.max(1),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientSection {
    pub color: u32,
    pub intensity: f32,
}

impl Default for AmbientSection {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            intensity: 0.9,
        }
    }
}

impl AmbientSection {
    pub fn light(&self) -> AmbientLight {
        AmbientLight {
            color: Color::from_hex(self.color).to_array3(),
            intensity: self.intensity,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsSection {
    pub directional: DirectionalSection,
    pub ambient: AmbientSection,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpersSection {
    /// Axes helper length; 0 hides it.
    pub axes_size: f32,
}

impl Default for HelpersSection {
    fn default() -> Self {
        Self { axes_size: 25.0 }
    }
}

impl HelpersSection {
    pub fn axes(&self) -> Option<AxesHelper> {
        (self.axes_size > 0.0).then(|| AxesHelper::new(self.axes_size))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSection {
    /// Clip to play; the first clip when unset.
    pub clip: Option<String>,
    /// Fail startup instead of idling when no clip can be selected.
    pub require_clip: bool,
    /// Drop redundant keyframes at load.
    pub optimize: bool,
}

impl Default for AnimationSection {
    fn default() -> Self {
        Self {
            clip: None,
            require_clip: false,
            optimize: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSection {
    /// Upper bound for a single frame delta, in seconds.
    pub max_frame_delta: f32,
}

impl Default for FrameSection {
    fn default() -> Self {
        Self {
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`ViewerConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.window.width == 0 || self.window.height == 0 {
            return invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }
        if !(self.frame.max_frame_delta.is_finite() && self.frame.max_frame_delta > 0.0) {
            return invalid(format!(
                "frame.max_frame_delta must be positive, got {}",
                self.frame.max_frame_delta
            ));
        }
        if !(self.orbit.min_distance >= 0.0 && self.orbit.min_distance <= self.orbit.max_distance) {
            return invalid(format!(
                "orbit distance range is empty: [{}, {}]",
                self.orbit.min_distance, self.orbit.max_distance
            ));
        }
        let polar = 0.0..=PI;
        if !(polar.contains(&self.orbit.min_polar_angle)
            && polar.contains(&self.orbit.max_polar_angle)
            && self.orbit.min_polar_angle <= self.orbit.max_polar_angle)
        {
            return invalid(format!(
                "orbit polar range must lie within [0, pi]: [{}, {}]",
                self.orbit.min_polar_angle, self.orbit.max_polar_angle
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ViewerConfig::default());
        assert_eq!(cfg.window.title, "ionview");
        assert_eq!(cfg.asset.path, PathBuf::from("assets/PrimaryIonDrive.glb"));
        assert_eq!(cfg.helpers.axes_size, 25.0);
        assert!(!cfg.animation.require_clip);
        assert_eq!(cfg.frame.max_frame_delta, 0.25);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = ViewerConfig::from_toml_str(
            r#"
            [bloom]
            strength = 1.5

            [renderer]
            tone_mapping = "aces"

            [animation]
            clip = "Spin"
            require_clip = true
            "#,
        )
        .unwrap();

        let bloom = cfg.bloom.params();
        assert_eq!(bloom.strength(), 1.5);
        assert_eq!(bloom.exposure(), 1.8);
        assert_eq!(cfg.renderer.tone_mapping, ToneMappingMode::Aces);
        assert!(cfg.renderer.shadows);
        assert_eq!(cfg.animation.clip.as_deref(), Some("Spin"));
        assert!(cfg.animation.optimize);
    }

    #[test]
    fn default_camera_and_lights() {
        let cfg = ViewerConfig::default();
        let camera = cfg.camera.build(16.0 / 9.0).unwrap();
        assert_eq!(camera.position, Vec3::new(4.0, 2.0, 2.0));
        assert_eq!(camera.fov_y_deg(), 50.0);

        let sun = cfg.lights.directional.light();
        assert_eq!(sun.color, [1.0, 1.0, 1.0]);
        assert_relative_eq!(sun.intensity, 0.3);
        assert_relative_eq!(cfg.lights.ambient.light().intensity, 0.9);

        let orbit = cfg.orbit.settings();
        assert_relative_eq!(orbit.max_polar_angle, PI / 2.0);
        assert_eq!((orbit.min_distance, orbit.max_distance), (1.0, 100.0));
    }

    #[test]
    fn invalid_camera_surfaces_as_camera_error() {
        let cfg = ViewerConfig::from_toml_str("[camera]\nnear = 10.0\nfar = 1.0\n").unwrap();
        assert!(matches!(cfg.camera.build(1.0), Err(CameraError::InvalidClipPlanes { .. })));
    }

    #[test]
    fn rejects_inverted_orbit_range() {
        let err = ViewerConfig::from_toml_str("[orbit]\nmin_distance = 10.0\nmax_distance = 5.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_positive_frame_delta() {
        let err = ViewerConfig::from_toml_str("[frame]\nmax_frame_delta = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn type_errors_are_parse_errors() {
        let err = ViewerConfig::from_toml_str("[window]\nwidth = \"wide\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_axes_size_hides_helper() {
        let helpers = HelpersSection { axes_size: 0.0 };
        assert!(helpers.axes().is_none());
        assert_eq!(HelpersSection::default().axes(), Some(AxesHelper::new(25.0)));
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut cfg = ViewerConfig::default();
        cfg.animation.clip = Some("Idle".into());
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("ionview-config-does-not-exist.toml");
        assert!(matches!(ViewerConfig::load(&path), Err(ConfigError::Io { .. })));
        assert_eq!(ViewerConfig::load_or_default(&path).unwrap(), ViewerConfig::default());
    }
}
