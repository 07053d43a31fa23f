//! Frame delta to integration step conversion.

use crate::config::{MAX_VARIABLE_DELTA, TimeStepConfig};

/// Banked simulation time for the fixed-step mode
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeAccumulator {
    accumulated: f32,
}

impl TimeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds carried over to the next frame.
    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }

    /// Turn one frame delta into integration steps.
    ///
    /// `integrate` is called with each step's delta, never with a
    /// non-positive one. Returns the number of steps taken.
    pub fn advance(
        &mut self,
        frame_delta: f32,
        config: &TimeStepConfig,
        mut integrate: impl FnMut(f32),
    ) -> u32 {
        let delta = if frame_delta.is_finite() {
            frame_delta * config.time_scale
        } else {
            0.0
        };

        if !config.use_fixed_time_step {
            self.accumulated = 0.0;
            let delta = delta.min(MAX_VARIABLE_DELTA);
            if delta <= 0.0 {
                return 0;
            }
            integrate(delta);
            return 1;
        }

        let step = config.fixed_time_step;
        if step <= 0.0 || !step.is_finite() {
            return 0;
        }

        // Clamp before consuming so a stall can never queue more than the cap
        self.accumulated = (self.accumulated + delta.max(0.0)).min(config.max_accumulated_time);

        let mut steps = 0;
        while self.accumulated >= step && steps < config.max_sub_steps {
            integrate(step);
            self.accumulated -= step;
            steps += 1;
        }
        steps
    }
}
