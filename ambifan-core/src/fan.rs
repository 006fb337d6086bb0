//! Fan animation driven by the sensor readings
//!
//! Each frame the three readings are normalized by their limits and averaged
//! with equal weight. The average scales the maximum speed into a target, the
//! current speed follows that target through [`SmoothDamp`], and the rotation
//! angle advances by the smoothed speed.

use crate::config::FanConfig;
use crate::smoothing::SmoothDamp;
use crate::types::{FanState, Limits, Reading};

/// Per-frame fan animation.
#[derive(Debug, Clone)]
pub struct FanAnimator {
    max_speed: f32,
    degrees_per_unit_speed: f32,
    filter: SmoothDamp,
    state: FanState,
}

impl FanAnimator {
    pub fn new(config: &FanConfig) -> Self {
        Self {
            max_speed: config.max_speed,
            degrees_per_unit_speed: config.degrees_per_unit_speed,
            filter: SmoothDamp::new(config.smooth_time),
            state: FanState {
                axis: config.axis,
                ..FanState::default()
            },
        }
    }

    /// Speed the fan settles at for `reading`.
    pub fn target_speed(&self, reading: &Reading, limits: &Limits) -> f32 {
        reading.normalized(limits).mean() * self.max_speed
    }

    /// Advance the animation by `dt` seconds and return the new state.
    pub fn update(&mut self, reading: &Reading, limits: &Limits, dt: f32) -> FanState {
        let target = self.target_speed(reading, limits);
        let current = self.filter.step(self.state.current_speed, target, dt);

        self.state.target_speed = target;
        self.state.current_speed = current;
        self.state.velocity = self.filter.velocity();

        if dt > 0.0 {
            let delta = current * self.degrees_per_unit_speed * dt;
            self.state.angle = wrap_degrees(self.state.angle + delta);
        }

        self.state
    }

    pub fn state(&self) -> &FanState {
        &self.state
    }
}

/// Wrap an angle into `[0, 360)`.
///
/// `rem_euclid` alone can round a tiny negative input up to exactly 360.
fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
