use crate::config::DifficultyConfig;

const INTERVAL_FLOOR: f32 = 1.0e-3;

/// Enemy spawn interval as a step function of elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyScheduler {
    config: DifficultyConfig,
}

impl DifficultyScheduler {
    pub fn new(config: DifficultyConfig) -> Self {
        Self { config }
    }

    /// Seconds between spawns at `elapsed` seconds into the session.
    pub fn interval_at(&self, elapsed: f32) -> f32 {
        let DifficultyConfig {
            initial_interval,
            min_interval,
            step,
            step_period,
        } = self.config;
        let floor = min_interval.max(INTERVAL_FLOOR);

        if !(elapsed > 0.0) || !(step_period > 0.0) {
            return initial_interval.max(floor);
        }

        let steps = (elapsed / step_period).floor();
        (initial_interval - steps * step.max(0.0)).max(floor)
    }
}

impl Default for DifficultyScheduler {
    fn default() -> Self {
        Self::new(DifficultyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_initial_interval() {
        let scheduler = DifficultyScheduler::default();
        assert_eq!(scheduler.interval_at(0.0), 1.0);
        assert_eq!(scheduler.interval_at(9.99), 1.0);
    }

    #[test]
    fn test_steps_down_to_floor() {
        let scheduler = DifficultyScheduler::default();
        assert!((scheduler.interval_at(10.0) - 0.95).abs() < 1e-6);
        assert!((scheduler.interval_at(25.0) - 0.90).abs() < 1e-6);
        assert_eq!(scheduler.interval_at(10_000.0), 0.25);
        assert_eq!(scheduler.interval_at(f32::MAX), 0.25);
    }

    #[test]
    fn test_never_increases_and_stays_positive() {
        let scheduler = DifficultyScheduler::new(DifficultyConfig {
            initial_interval: 0.5,
            min_interval: 0.0,
            step: 0.2,
            step_period: 1.0,
        });

        let mut previous = scheduler.interval_at(0.0);
        let mut t = 0.0;
        while t < 120.0 {
            let interval = scheduler.interval_at(t);
            assert!(interval > 0.0);
            assert!(interval <= previous);
            previous = interval;
            t += 0.37;
        }
    }

    #[test]
    fn test_negative_elapsed_is_treated_as_start() {
        let scheduler = DifficultyScheduler::default();
        assert_eq!(scheduler.interval_at(-5.0), scheduler.interval_at(0.0));
    }
}
