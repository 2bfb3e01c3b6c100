use crate::scene::SceneNode;

use super::clip::AnimationClip;
use super::library::ClipLibrary;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AnimationError {
    #[error("animation clip '{requested}' not found (available: {available:?})")]
    MissingClip {
        requested: String,
        available: Vec<String>,
    },

    #[error("animation clip index {index} out of range ({len} clips)")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Playback {
    clip: usize,
    time: f32,
}

/// Plays one clip from a [`ClipLibrary`] on a loop.
///
/// Local time always lies in `[0, duration)`. A mixer with no active clip is
/// idle: updates do nothing.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    library: ClipLibrary,
    active: Option<Playback>,
}

impl AnimationMixer {
    pub fn new(library: ClipLibrary) -> Self {
        Self {
            library,
            active: None,
        }
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    /// Makes the named clip active, restarting it from time 0.
    pub fn select(&mut self, name: &str) -> Result<&AnimationClip, AnimationError> {
        let index = self
            .library
            .index_of(name)
            .ok_or_else(|| AnimationError::MissingClip {
                requested: name.to_string(),
                available: self.library.names(),
            })?;
        self.select_index(index)
    }

    /// Makes the clip at `index` active, restarting it from time 0.
    pub fn select_index(&mut self, index: usize) -> Result<&AnimationClip, AnimationError> {
        let len = self.library.len();
        let clip = self
            .library
            .get_index(index)
            .ok_or(AnimationError::IndexOutOfRange { index, len })?;

        self.active = Some(Playback { clip: index, time: 0.0 });
        log::info!("playing clip '{}' ({:.3} s)", clip.name(), clip.duration());
        Ok(clip)
    }

    /// Stops playback. The last applied pose is kept.
    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn active_clip(&self) -> Option<&AnimationClip> {
        self.active.and_then(|p| self.library.get_index(p.clip))
    }

    /// Local time of the active clip, in seconds.
    pub fn local_time(&self) -> Option<f32> {
        self.active.map(|p| p.time)
    }

    /// Advances local time by `dt` seconds, wrapping at the clip duration.
    pub fn advance(&mut self, dt: f32) {
        let Some(playback) = self.active.as_mut() else { return };
        let Some(clip) = self.library.get_index(playback.clip) else { return };

        let duration = clip.duration();
        playback.time = if duration > 0.0 {
            let t = (playback.time + dt).rem_euclid(duration);
            // rem_euclid may round up to exactly `duration` for tiny negatives.
            if t >= duration { 0.0 } else { t }
        } else {
            0.0
        };
    }

    /// Writes the active clip's pose at the current local time into `nodes`.
    pub fn apply(&self, nodes: &mut [SceneNode]) {
        let Some(playback) = self.active else { return };
        if let Some(clip) = self.library.get_index(playback.clip) {
            clip.apply(playback.time, nodes);
        }
    }

    /// Advances by `dt` and applies the resulting pose.
    pub fn update(&mut self, dt: f32, nodes: &mut [SceneNode]) {
        if self.active.is_none() {
            return;
        }
        self.advance(dt);
        self.apply(nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Interpolation, Track, TrackValues};
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn clip(name: &str, duration: f32) -> AnimationClip {
        let track = Track {
            node: 0,
            times: vec![0.0, duration],
            values: TrackValues::Translation(vec![Vec3::ZERO, Vec3::new(duration, 0.0, 0.0)]),
            interpolation: Interpolation::Linear,
        };
        AnimationClip::new(name, vec![track])
    }

    fn mixer(clips: Vec<AnimationClip>) -> AnimationMixer {
        AnimationMixer::new(ClipLibrary::new(clips))
    }

    #[test]
    fn ten_steps_of_a_tenth_reach_one_second() {
        let mut m = mixer(vec![clip("Drive", 2.0)]);
        m.select("Drive").unwrap();
        let mut nodes = vec![SceneNode::default()];

        for _ in 0..10 {
            m.update(0.1, &mut nodes);
        }

        assert_relative_eq!(m.local_time().unwrap(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(nodes[0].transform.translation.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn local_time_wraps_modulo_duration() {
        let mut m = mixer(vec![clip("Drive", 2.0)]);
        m.select_index(0).unwrap();

        m.advance(1.5);
        m.advance(1.0);
        assert_relative_eq!(m.local_time().unwrap(), 0.5, epsilon = 1e-5);

        m.advance(1.5);
        assert_eq!(m.local_time(), Some(0.0));
    }

    #[test]
    fn wrap_matches_modulo_for_many_deltas() {
        let mut m = mixer(vec![clip("Drive", 0.7)]);
        m.select_index(0).unwrap();
        for d in [0.016, 0.25, 0.0, 0.33, 0.1, 0.2] {
            let prev = m.local_time().unwrap();
            m.advance(d);
            let now = m.local_time().unwrap();
            assert!((0.0..0.7).contains(&now));
            assert_relative_eq!(now, (prev + d) % 0.7, epsilon = 1e-5);
        }
    }

    #[test]
    fn missing_clip_is_reported_with_available_names() {
        let mut m = mixer(vec![clip("Drive", 1.0)]);
        let err = m.select("Warp").unwrap_err();
        assert_eq!(
            err,
            AnimationError::MissingClip {
                requested: "Warp".into(),
                available: vec!["Drive".into()],
            }
        );
        assert!(m.is_idle());
    }

    #[test]
    fn empty_library_stays_idle() {
        let mut m = mixer(vec![]);
        assert!(matches!(m.select_index(0), Err(AnimationError::IndexOutOfRange { index: 0, len: 0 })));

        let mut nodes = vec![SceneNode::default()];
        m.update(0.5, &mut nodes);
        assert!(m.local_time().is_none());
        assert_eq!(nodes[0].transform.translation, Vec3::ZERO);
    }

    #[test]
    fn select_restarts_playback() {
        let mut m = mixer(vec![clip("A", 1.0), clip("B", 3.0)]);
        m.select("A").unwrap();
        m.advance(0.4);
        m.select("B").unwrap();
        assert_eq!(m.local_time(), Some(0.0));
        assert_eq!(m.active_clip().map(|c| c.name()), Some("B"));
    }

    #[test]
    fn zero_duration_clip_holds_time_at_zero() {
        let mut m = mixer(vec![AnimationClip::new("Pose", vec![])]);
        m.select("Pose").unwrap();
        m.advance(0.3);
        assert_eq!(m.local_time(), Some(0.0));
    }
}
