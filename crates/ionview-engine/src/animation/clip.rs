use glam::{Quat, Vec3};

use crate::scene::{SceneNode, Transform};

/// Keyframe interpolation mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Interpolation {
    Linear,
    Step,
    /// Hermite spline; each keyframe stores `[in_tangent, value, out_tangent]`.
    CubicSpline,
}

/// Keyframe output values of one track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl TrackValues {
    fn len(&self) -> usize {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }

    fn property(&self) -> &'static str {
        match self {
            Self::Translation(_) => "translation",
            Self::Rotation(_) => "rotation",
            Self::Scale(_) => "scale",
        }
    }
}

/// Animated property of a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub node: usize,
    pub times: Vec<f32>,
    pub values: TrackValues,
    pub interpolation: Interpolation,
}

/// Sampled value of one track.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrackSample {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

impl TrackSample {
    pub fn apply(self, transform: &mut Transform) {
        match self {
            Self::Translation(t) => transform.translation = t,
            Self::Rotation(r) => transform.rotation = r,
            Self::Scale(s) => transform.scale = s,
        }
    }
}

impl Track {
    fn values_per_key(&self) -> usize {
        match self.interpolation {
            Interpolation::CubicSpline => 3,
            Interpolation::Linear | Interpolation::Step => 1,
        }
    }

    /// True when times are ascending and value count matches the key count.
    pub fn is_valid(&self) -> bool {
        !self.times.is_empty()
            && self.values.len() == self.times.len() * self.values_per_key()
            && self.times.windows(2).all(|w| w[0] <= w[1])
    }

    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Samples the track at `time` (seconds), clamping outside the key range.
    pub fn sample(&self, time: f32) -> Option<TrackSample> {
        let n = self.times.len();
        if n == 0 {
            return None;
        }

        // Index of the first key strictly after `time`.
        let next = self.times.partition_point(|&t| t <= time);
        let (k0, k1, s) = if next == 0 {
            (0, 0, 0.0)
        } else if next >= n {
            (n - 1, n - 1, 0.0)
        } else {
            let (t0, t1) = (self.times[next - 1], self.times[next]);
            let span = t1 - t0;
            let s = if span > 0.0 { (time - t0) / span } else { 0.0 };
            (next - 1, next, s)
        };
        let span = self.times[k1] - self.times[k0];

        let sample = match &self.values {
            TrackValues::Translation(v) => TrackSample::Translation(self.sample_vec3(v, k0, k1, s, span)),
            TrackValues::Scale(v) => TrackSample::Scale(self.sample_vec3(v, k0, k1, s, span)),
            TrackValues::Rotation(v) => TrackSample::Rotation(self.sample_quat(v, k0, k1, s, span)),
        };
        Some(sample)
    }

    fn sample_vec3(&self, v: &[Vec3], k0: usize, k1: usize, s: f32, span: f32) -> Vec3 {
        match self.interpolation {
            Interpolation::Step => v[k0],
            Interpolation::Linear => v[k0].lerp(v[k1], s),
            Interpolation::CubicSpline => {
                let [h00, h10, h01, h11] = hermite(s);
                let p0 = v[k0 * 3 + 1];
                let m0 = v[k0 * 3 + 2] * span;
                let p1 = v[k1 * 3 + 1];
                let m1 = v[k1 * 3] * span;
                p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
            }
        }
    }

    fn sample_quat(&self, v: &[Quat], k0: usize, k1: usize, s: f32, span: f32) -> Quat {
        match self.interpolation {
            Interpolation::Step => v[k0],
            Interpolation::Linear => v[k0].slerp(v[k1], s),
            Interpolation::CubicSpline => {
                let [h00, h10, h01, h11] = hermite(s);
                let p0 = v[k0 * 3 + 1];
                let m0 = v[k0 * 3 + 2] * span;
                let p1 = v[k1 * 3 + 1];
                let m1 = v[k1 * 3] * span;
                (p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11).normalize()
            }
        }
    }

    /// Drops keyframes that repeat both neighbours.
    ///
    /// The first and last keys are always kept. Cubic spline tracks are left
    /// untouched since their tangents make plateau detection unreliable.
    fn optimize(&mut self) -> usize {
        if self.interpolation == Interpolation::CubicSpline || self.times.len() <= 2 {
            return 0;
        }

        let before = self.times.len();
        let keep = plateau_mask(&self.times, &self.values, self.interpolation);
        retain_by_mask(&mut self.times, &keep);
        match &mut self.values {
            TrackValues::Translation(v) | TrackValues::Scale(v) => retain_by_mask(v, &keep),
            TrackValues::Rotation(v) => retain_by_mask(v, &keep),
        }
        before - self.times.len()
    }
}

fn hermite(s: f32) -> [f32; 4] {
    let s2 = s * s;
    let s3 = s2 * s;
    [
        2.0 * s3 - 3.0 * s2 + 1.0,
        s3 - 2.0 * s2 + s,
        -2.0 * s3 + 3.0 * s2,
        s3 - s2,
    ]
}

fn plateau_mask(times: &[f32], values: &TrackValues, interpolation: Interpolation) -> Vec<bool> {
    let n = times.len();
    let same = |a: usize, b: usize| match values {
        TrackValues::Translation(v) | TrackValues::Scale(v) => v[a] == v[b],
        TrackValues::Rotation(v) => v[a] == v[b],
    };

    let mut keep = vec![true; n];
    let mut last_kept = 0;
    for i in 1..n - 1 {
        // A key sharing its time with the previous kept key is a duplicate.
        let redundant = times[i] == times[last_kept]
            || match interpolation {
                Interpolation::Step => same(i, last_kept),
                _ => same(i, last_kept) && same(i, i + 1),
            };
        if redundant {
            keep[i] = false;
        } else {
            last_kept = i;
        }
    }
    keep
}

fn retain_by_mask<T>(v: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    v.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}

/// Named keyframe clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    tracks: Vec<Track>,
}

impl AnimationClip {
    /// Builds a clip; the duration is the latest key time across tracks.
    ///
    /// Malformed tracks are dropped with a warning.
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let name = name.into();
        let tracks: Vec<Track> = tracks
            .into_iter()
            .filter(|t| {
                let ok = t.is_valid();
                if !ok {
                    log::warn!(
                        "clip '{name}': dropping malformed {} track for node {}",
                        t.values.property(),
                        t.node
                    );
                }
                ok
            })
            .collect();
        let duration = tracks.iter().map(Track::end_time).fold(0.0, f32::max);
        Self { name, duration, tracks }
    }

    /// Overrides the computed duration.
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Removes redundant keyframes from every track. Returns the number removed.
    pub fn optimize(&mut self) -> usize {
        self.tracks.iter_mut().map(Track::optimize).sum()
    }

    /// Writes the pose at `time` into `nodes`. Tracks addressing missing nodes are skipped.
    pub fn apply(&self, time: f32, nodes: &mut [SceneNode]) {
        for track in &self.tracks {
            let Some(node) = nodes.get_mut(track.node) else { continue };
            if let Some(sample) = track.sample(time) {
                sample.apply(&mut node.transform);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation_track(times: &[f32], xs: &[f32], interpolation: Interpolation) -> Track {
        Track {
            node: 0,
            times: times.to_vec(),
            values: TrackValues::Translation(xs.iter().map(|&x| Vec3::new(x, 0.0, 0.0)).collect()),
            interpolation,
        }
    }

    fn x_at(track: &Track, t: f32) -> f32 {
        match track.sample(t) {
            Some(TrackSample::Translation(v)) => v.x,
            other => panic!("unexpected sample {other:?}"),
        }
    }

    #[test]
    fn duration_is_last_key_time() {
        let clip = AnimationClip::new(
            "spin",
            vec![
                translation_track(&[0.0, 1.0], &[0.0, 1.0], Interpolation::Linear),
                translation_track(&[0.0, 2.5], &[0.0, 1.0], Interpolation::Linear),
            ],
        );
        assert_eq!(clip.duration(), 2.5);
    }

    #[test]
    fn linear_sampling_interpolates_and_clamps() {
        let t = translation_track(&[0.0, 2.0], &[0.0, 4.0], Interpolation::Linear);
        assert_eq!(x_at(&t, 0.5), 1.0);
        assert_eq!(x_at(&t, -1.0), 0.0);
        assert_eq!(x_at(&t, 10.0), 4.0);
    }

    #[test]
    fn step_sampling_holds_previous_key() {
        let t = translation_track(&[0.0, 1.0, 2.0], &[0.0, 5.0, 9.0], Interpolation::Step);
        assert_eq!(x_at(&t, 0.99), 0.0);
        assert_eq!(x_at(&t, 1.0), 5.0);
        assert_eq!(x_at(&t, 1.5), 5.0);
    }

    #[test]
    fn cubic_spline_hits_keys() {
        let t = Track {
            node: 0,
            times: vec![0.0, 1.0],
            values: TrackValues::Translation(vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::ZERO,
                Vec3::ZERO,
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::ZERO,
            ]),
            interpolation: Interpolation::CubicSpline,
        };
        assert!(t.is_valid());
        assert_eq!(x_at(&t, 0.0), 1.0);
        assert_eq!(x_at(&t, 1.0), 3.0);
        assert!((x_at(&t, 0.5) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn rotation_is_slerped() {
        let t = Track {
            node: 0,
            times: vec![0.0, 1.0],
            values: TrackValues::Rotation(vec![
                Quat::IDENTITY,
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ]),
            interpolation: Interpolation::Linear,
        };
        let Some(TrackSample::Rotation(q)) = t.sample(0.5) else { panic!() };
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(q.angle_between(expected) < 1e-4);
    }

    #[test]
    fn malformed_tracks_are_dropped() {
        let bad = translation_track(&[0.0, 1.0], &[0.0], Interpolation::Linear);
        let clip = AnimationClip::new("bad", vec![bad]);
        assert!(clip.tracks().is_empty());
        assert_eq!(clip.duration(), 0.0);
    }

    #[test]
    fn optimize_removes_plateau_keys() {
        let mut clip = AnimationClip::new(
            "hold",
            vec![translation_track(
                &[0.0, 1.0, 2.0, 3.0, 4.0],
                &[1.0, 1.0, 1.0, 1.0, 2.0],
                Interpolation::Linear,
            )],
        );
        let removed = clip.optimize();
        assert_eq!(removed, 2);
        let track = &clip.tracks()[0];
        assert_eq!(track.times, vec![0.0, 3.0, 4.0]);
        assert_eq!(clip.duration(), 4.0);

        // Pose is unchanged by optimization.
        assert_eq!(x_at(track, 2.5), 1.0);
        assert_eq!(x_at(track, 3.5), 1.5);
    }

    #[test]
    fn optimize_keeps_changing_keys() {
        let mut clip = AnimationClip::new(
            "ramp",
            vec![translation_track(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], Interpolation::Linear)],
        );
        assert_eq!(clip.optimize(), 0);
    }

    #[test]
    fn apply_writes_node_transforms() {
        let clip = AnimationClip::new(
            "move",
            vec![translation_track(&[0.0, 1.0], &[0.0, 10.0], Interpolation::Linear)],
        );
        let mut nodes = vec![SceneNode::default()];
        clip.apply(0.25, &mut nodes);
        assert_eq!(nodes[0].transform.translation.x, 2.5);
    }
}
