/// Turns variable frame deltas into a whole number of fixed ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
    max_frame: f32,
}

impl FixedTimestep {
    const DEFAULT_MAX_FRAME: f32 = 0.25;

    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
            max_frame: Self::DEFAULT_MAX_FRAME,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Frames longer than `max_frame` are truncated so a stall does not trigger a burst
    /// of catch-up ticks.
    pub fn accumulate(&mut self, delta: f32) {
        if delta > 0.0 {
            self.accumulator += delta.min(self.max_frame);
        }
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_timestep_accumulation() {
        let mut ts = FixedTimestep::new(60);

        ts.accumulate(1.0 / 30.0);
        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut ts = FixedTimestep::new(10);
        ts.accumulate(5.0);

        let mut ticks = 0;
        while ts.consume_tick() {
            ticks += 1;
        }
        assert!(ticks <= 3);
    }

    #[test]
    fn test_negative_delta_is_ignored() {
        let mut ts = FixedTimestep::new(60);
        ts.accumulate(-1.0);
        assert!(!ts.consume_tick());
    }
}
