use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::render::Color;

/// Bloom tuning, fixed for the life of the pipeline.
///
/// There are no setters: a pipeline reads the same values on every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BloomParams {
    exposure: f32,
    strength: f32,
    radius: f32,
    threshold: f32,
}

impl BloomParams {
    /// Negative and non-finite inputs are replaced by 0.
    pub fn new(exposure: f32, strength: f32, radius: f32, threshold: f32) -> Self {
        let sane = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            exposure: sane(exposure),
            strength: sane(strength),
            radius: sane(radius),
            threshold: sane(threshold),
        }
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Default for BloomParams {
    fn default() -> Self {
        Self::new(1.8, 3.0, 1.2, 0.0)
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMappingMode {
    None,
    Linear,
    #[default]
    Reinhard,
    Aces,
}

impl ToneMappingMode {
    /// Shader-side selector.
    pub fn index(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Linear => 1,
            Self::Reinhard => 2,
            Self::Aces => 3,
        }
    }

    /// CPU reference of the output shader curves.
    pub fn apply(self, rgb: [f32; 3], exposure: f32) -> [f32; 3] {
        let c = Vec3::from_array(rgb);
        let out = match self {
            Self::None => c,
            Self::Linear => (c * exposure).clamp(Vec3::ZERO, Vec3::ONE),
            Self::Reinhard => {
                let c = c * exposure;
                (c / (Vec3::ONE + c)).clamp(Vec3::ZERO, Vec3::ONE)
            }
            Self::Aces => aces_filmic(c * exposure / 0.6),
        };
        out.to_array()
    }
}

fn aces_filmic(c: Vec3) -> Vec3 {
    let input = Mat3::from_cols_array(&[
        0.59719, 0.07600, 0.02840,
        0.35458, 0.90834, 0.13383,
        0.04823, 0.01566, 0.83777,
    ]);
    let output = Mat3::from_cols_array(&[
        1.60475, -0.10208, -0.00327,
        -0.53108, 1.10813, -0.07276,
        -0.07367, -0.00605, 1.07602,
    ]);
    let v = input * c;
    let a = v * (v + Vec3::splat(0.0245786)) - Vec3::splat(0.000090537);
    let b = v * (v * 0.983729 + Vec3::splat(0.4329510)) + Vec3::splat(0.238081);
    (output * (a / b)).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Tone mapping applied when presenting the HDR chain output.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ToneMapping {
    pub mode: ToneMappingMode,
    /// Final multiplier applied before the curve.
    pub exposure: f32,
}

impl ToneMapping {
    /// Derives the presentation exposure from the bloom exposure setting (`exposure^4`).
    pub fn from_bloom_exposure(mode: ToneMappingMode, exposure: f32) -> Self {
        Self {
            mode,
            exposure: exposure.powi(4),
        }
    }
}

/// Renderer configuration fixed at startup.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RendererSettings {
    pub clear_color: Color,
    pub tone_mapping: ToneMappingMode,
    pub shadows: bool,
    /// Requested MSAA sample count for the scene pass; reduced to what the device supports.
    pub msaa_samples: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            tone_mapping: ToneMappingMode::Reinhard,
            shadows: true,
            msaa_samples: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_bloom_matches_viewer_constants() {
        let p = BloomParams::default();
        assert_eq!((p.exposure(), p.strength(), p.radius(), p.threshold()), (1.8, 3.0, 1.2, 0.0));
    }

    #[test]
    fn bloom_params_reject_negative_values() {
        let p = BloomParams::new(-1.0, f32::NAN, 0.5, -0.1);
        assert_eq!((p.exposure(), p.strength(), p.radius(), p.threshold()), (0.0, 0.0, 0.5, 0.0));
    }

    #[test]
    fn exposure_is_raised_to_fourth_power() {
        let t = ToneMapping::from_bloom_exposure(ToneMappingMode::Reinhard, 1.8);
        assert_relative_eq!(t.exposure, 10.4976, epsilon = 1e-4);
    }

    #[test]
    fn reinhard_maps_one_to_half() {
        let out = ToneMappingMode::Reinhard.apply([1.0, 0.0, 3.0], 1.0);
        assert_relative_eq!(out[0], 0.5);
        assert_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], 0.75);
    }

    #[test]
    fn linear_saturates() {
        assert_eq!(ToneMappingMode::Linear.apply([0.25, 2.0, 0.0], 2.0), [0.5, 1.0, 0.0]);
    }

    #[test]
    fn none_passes_through() {
        assert_eq!(ToneMappingMode::None.apply([4.0, 0.5, 0.0], 10.0), [4.0, 0.5, 0.0]);
    }

    #[test]
    fn aces_is_monotonic_and_bounded() {
        let mut prev = -1.0;
        for i in 0..50 {
            let v = i as f32 * 0.25;
            let out = ToneMappingMode::Aces.apply([v, v, v], 1.0)[1];
            assert!(out >= prev && (0.0..=1.0).contains(&out));
            prev = out;
        }
        assert!(ToneMappingMode::Aces.apply([0.0; 3], 1.0)[0] < 1e-3);
    }

    #[test]
    fn tone_mapping_mode_parses_lowercase() {
        #[derive(Deserialize)]
        struct W {
            mode: ToneMappingMode,
        }
        let w: W = toml::from_str("mode = \"aces\"").unwrap();
        assert_eq!(w.mode, ToneMappingMode::Aces);
    }
}
