//! Critically damped smoothing
//!
//! A spring-damper approximation that moves a value toward a target as fast
//! as possible without oscillating. The filter keeps its own velocity so a
//! step change in the target produces a continuous output.

/// Smallest smoothing time accepted, in seconds.
const MIN_SMOOTH_TIME: f32 = 1e-4;

/// Critically damped smoothing filter state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothDamp {
    smooth_time: f32,
    velocity: f32,
}

impl SmoothDamp {
    /// Create a filter that reaches its target in roughly `smooth_time` seconds.
    pub fn new(smooth_time: f32) -> Self {
        Self {
            smooth_time: smooth_time.max(MIN_SMOOTH_TIME),
            velocity: 0.0,
        }
    }

    pub fn smooth_time(&self) -> f32 {
        self.smooth_time
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Advance `current` toward `target` by `dt` seconds and return the new value.
    ///
    /// A non-positive `dt` returns `current` untouched.
    pub fn step(&mut self, current: f32, target: f32, dt: f32) -> f32 {
        if dt.is_nan() || dt <= 0.0 {
            return current;
        }

        let omega = 2.0 / self.smooth_time;
        let x = omega * dt;
        let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

        let change = current - target;
        let temp = (self.velocity + omega * change) * dt;
        self.velocity = (self.velocity - omega * temp) * decay;
        let mut output = target + (change + temp) * decay;

        // Never pass the original target.
        if (target - current > 0.0) == (output > target) {
            output = target;
            self.velocity = 0.0;
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_converges_within_one_percent() {
        let smooth_time = 0.5;
        let mut filter = SmoothDamp::new(smooth_time);
        let target = 250.0;
        let mut current = 0.0;

        let steps = (5.0 * smooth_time / DT) as usize;
        for _ in 0..steps {
            current = filter.step(current, target, DT);
        }

        assert!(
            (target - current).abs() <= target * 0.01,
            "current {} not within 1% of {}",
            current,
            target
        );
    }

    #[test]
    fn test_monotonic_without_overshoot() {
        let mut filter = SmoothDamp::new(0.3);
        let target = 100.0;
        let mut current = 0.0;
        let mut previous = current;

        for _ in 0..600 {
            current = filter.step(current, target, DT);
            assert!(current >= previous, "speed decreased: {} < {}", current, previous);
            assert!(current <= target, "overshoot: {}", current);
            previous = current;
        }
    }

    #[test]
    fn test_monotonic_decreasing_toward_lower_target() {
        let mut filter = SmoothDamp::new(0.3);
        let mut current = 100.0;
        let mut previous = current;

        for _ in 0..600 {
            current = filter.step(current, 20.0, DT);
            assert!(current <= previous);
            assert!(current >= 20.0);
            previous = current;
        }
        assert!((current - 20.0).abs() < 0.2);
    }

    #[test]
    fn test_step_change_is_continuous() {
        let mut filter = SmoothDamp::new(0.5);
        let current = filter.step(0.0, 500.0, DT);

        // First frame after a step moves only a small part of the way.
        assert!(current > 0.0);
        assert!(current < 50.0, "jumped to {}", current);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut filter = SmoothDamp::new(0.5);
        assert_eq!(filter.step(10.0, 100.0, 0.0), 10.0);
        assert_eq!(filter.step(10.0, 100.0, -1.0), 10.0);
        assert_eq!(filter.velocity(), 0.0);
    }

    #[test]
    fn test_at_target_stays_put() {
        let mut filter = SmoothDamp::new(0.5);
        for _ in 0..10 {
            assert_eq!(filter.step(42.0, 42.0, DT), 42.0);
        }
    }

    #[test]
    fn test_tiny_smooth_time_is_clamped() {
        let filter = SmoothDamp::new(0.0);
        assert_eq!(filter.smooth_time(), MIN_SMOOTH_TIME);
    }
}
