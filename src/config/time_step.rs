use bevy::prelude::*;

use crate::config::{
    MAX_FIXED_TIME_STEP, MAX_SUB_STEPS, MAX_TIME_SCALE, MIN_FIXED_TIME_STEP, MIN_TIME_SCALE,
};

/// Frame-to-step conversion settings
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct TimeStepConfig {
    /// Fixed-step accumulator when true, one clamped variable step otherwise
    pub use_fixed_time_step: bool,

    /// Duration of one fixed substep in seconds
    pub fixed_time_step: f32,

    /// Upper bound on substeps per frame
    pub max_sub_steps: u32,

    /// Upper bound on banked time, applied before substeps are consumed
    pub max_accumulated_time: f32,

    /// Multiplier applied to every frame delta
    pub time_scale: f32,
}

impl Default for TimeStepConfig {
    fn default() -> Self {
        Self {
            use_fixed_time_step: true,
            fixed_time_step: 1.0 / 90.0,
            max_sub_steps: 4,
            max_accumulated_time: 0.25,
            time_scale: 1.0,
        }
    }
}

impl TimeStepConfig {
    pub fn fixed(fixed_time_step: f32, max_sub_steps: u32, max_accumulated_time: f32) -> Self {
        Self {
            use_fixed_time_step: true,
            fixed_time_step: fixed_time_step.clamp(MIN_FIXED_TIME_STEP, MAX_FIXED_TIME_STEP),
            max_sub_steps: max_sub_steps.clamp(1, MAX_SUB_STEPS),
            max_accumulated_time: max_accumulated_time.max(0.0),
            ..Default::default()
        }
    }

    pub fn variable() -> Self {
        Self {
            use_fixed_time_step: false,
            ..Default::default()
        }
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
        self
    }
}
