use std::time::Instant;

/// Monotonic millisecond timeline used as the host timestamp source.
///
/// Timestamps are measured from the moment the timeline was created, matching
/// the "milliseconds since page load" convention of display-synchronized
/// callbacks.
#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    origin: Instant,
}

impl Timeline {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Milliseconds elapsed since the timeline origin.
    pub fn now_ms(&self) -> f64 {
        self.at_ms(Instant::now())
    }

    /// Converts an instant into timeline milliseconds (saturating at zero).
    pub fn at_ms(&self, instant: Instant) -> f64 {
        instant
            .saturating_duration_since(self.origin)
            .as_secs_f64()
            * 1000.0
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn instants_before_origin_saturate() {
        let before = Instant::now();
        let timeline = Timeline::new();
        assert_eq!(timeline.at_ms(before), 0.0);
    }

    #[test]
    fn offsets_are_reported_in_milliseconds() {
        let timeline = Timeline::new();
        let later = timeline.origin + Duration::from_millis(250);
        assert!((timeline.at_ms(later) - 250.0).abs() < 1e-6);
    }
}
