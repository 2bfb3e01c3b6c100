/// Default upper bound for a single frame delta, in seconds.
pub const DEFAULT_MAX_FRAME_DELTA: f32 = 0.25;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Time elapsed since the previous frame, in seconds, after clamping.
    pub dt: f32,

    /// Host timestamp of this frame, in milliseconds.
    pub timestamp_ms: f64,

    /// Monotonic frame counter. The priming frame is not counted.
    pub frame_index: u64,

    /// True when the host delivered a timestamp earlier than the previous one.
    pub regressed: bool,
}

/// Frame clock fed with host timestamps (milliseconds).
///
/// The first timestamp only primes the clock: no delta is defined for it.
/// Every later timestamp produces a [`FrameTime`] whose `dt` is clamped to
/// `[0, max_frame_delta]`, so clock regressions and long stalls (suspended
/// tabs, debugger breaks, minimized windows) never reach downstream systems
/// as negative or huge steps.
///
/// Invariant: `last_time_ms` never decreases.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    frame_index: u64,
    max_dt: f32,
    regressions: u64,
}

impl FrameClock {
    /// Creates a clock with the default delta clamp.
    pub fn new() -> Self {
        Self::with_max_delta(DEFAULT_MAX_FRAME_DELTA)
    }

    /// Creates a clock with a custom upper delta clamp (seconds).
    pub fn with_max_delta(max_dt: f32) -> Self {
        debug_assert!(max_dt >= 0.0);
        Self {
            last_ms: None,
            frame_index: 0,
            max_dt: max_dt.max(0.0),
            regressions: 0,
        }
    }

    /// Records the first timestamp without producing a delta.
    pub fn prime(&mut self, timestamp_ms: f64) {
        self.last_ms = Some(timestamp_ms);
    }

    pub fn is_primed(&self) -> bool {
        self.last_ms.is_some()
    }

    /// Last recorded timestamp, if the clock has been primed.
    pub fn last_time_ms(&self) -> Option<f64> {
        self.last_ms
    }

    /// Number of regressed timestamps observed so far.
    pub fn regressions(&self) -> u64 {
        self.regressions
    }

    pub fn max_frame_delta(&self) -> f32 {
        self.max_dt
    }

    /// Advances the clock to `timestamp_ms`.
    ///
    /// Returns `None` when the clock was not primed yet; the timestamp is then
    /// recorded as the priming timestamp.
    pub fn tick(&mut self, timestamp_ms: f64) -> Option<FrameTime> {
        let Some(last) = self.last_ms else {
            self.prime(timestamp_ms);
            return None;
        };

        let raw = (timestamp_ms - last) / 1000.0;
        let regressed = raw < 0.0;
        if regressed {
            self.regressions += 1;
            log::warn!(
                "frame clock regression: {timestamp_ms:.3} ms after {last:.3} ms ({} so far); delta clamped to 0",
                self.regressions
            );
        }

        let dt = (raw as f32).clamp(0.0, self.max_dt);
        self.last_ms = Some(last.max(timestamp_ms));

        let ft = FrameTime {
            dt,
            timestamp_ms,
            frame_index: self.frame_index,
            regressed,
        };

        self.frame_index = self
            .frame_index
            .wrapping_add(1);

        Some(ft)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_timestamp_only_primes() {
        let mut clock = FrameClock::new();
        assert!(clock.tick(5.0).is_none());
        assert!(clock.is_primed());
        assert_eq!(clock.last_time_ms(), Some(5.0));
    }

    #[test]
    fn delta_sequence_for_typical_vsync() {
        let mut clock = FrameClock::new();
        let deltas: Vec<Option<f32>> = [0.0, 16.0, 33.0]
            .into_iter()
            .map(|t| clock.tick(t).map(|ft| ft.dt))
            .collect();

        assert!(deltas[0].is_none());
        assert_relative_eq!(deltas[1].unwrap(), 0.016, epsilon = 1e-6);
        assert_relative_eq!(deltas[2].unwrap(), 0.017, epsilon = 1e-6);
    }

    #[test]
    fn frame_index_counts_from_first_real_frame() {
        let mut clock = FrameClock::new();
        clock.prime(0.0);
        assert_eq!(clock.tick(10.0).unwrap().frame_index, 0);
        assert_eq!(clock.tick(20.0).unwrap().frame_index, 1);
    }

    #[test]
    fn regression_clamps_to_zero_and_keeps_last_time() {
        let mut clock = FrameClock::new();
        clock.prime(100.0);

        let ft = clock.tick(40.0).unwrap();
        assert_eq!(ft.dt, 0.0);
        assert!(ft.regressed);
        assert_eq!(clock.regressions(), 1);
        assert_eq!(clock.last_time_ms(), Some(100.0));

        let ft = clock.tick(116.0).unwrap();
        assert!(!ft.regressed);
        assert_relative_eq!(ft.dt, 0.016, epsilon = 1e-6);
    }

    #[test]
    fn repeated_timestamp_gives_zero_delta() {
        let mut clock = FrameClock::new();
        clock.prime(50.0);
        let ft = clock.tick(50.0).unwrap();
        assert_eq!(ft.dt, 0.0);
        assert!(!ft.regressed);
    }

    #[test]
    fn long_stall_is_clamped_to_max() {
        let mut clock = FrameClock::with_max_delta(0.1);
        clock.prime(0.0);
        assert_relative_eq!(clock.tick(5_000.0).unwrap().dt, 0.1);
    }

    #[test]
    fn deltas_are_never_negative() {
        let mut clock = FrameClock::new();
        clock.prime(0.0);
        for t in [10.0, 5.0, 20.0, 19.0, 19.5, 40.0, -3.0] {
            assert!(clock.tick(t).unwrap().dt >= 0.0);
        }
    }
}
