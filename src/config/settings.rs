use bevy::prelude::*;

use super::{DEFAULT_RESOLUTION, SimulationParams, TimeStepConfig};
use crate::core::SimulationGrid;

/// Every recognized option of the ripple simulation
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct RippleConfig {
    /// Requested grid resolution, clamped to [16, 4096] per axis when used
    pub resolution: UVec2,
    pub params: SimulationParams,
    pub time_step: TimeStepConfig,
    /// Copy the result into the output target once per frame
    pub auto_publish: bool,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            resolution: UVec2::splat(DEFAULT_RESOLUTION),
            params: SimulationParams::default(),
            time_step: TimeStepConfig::default(),
            auto_publish: true,
        }
    }
}

impl RippleConfig {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = SimulationGrid::new(width, height).size();
        self
    }

    pub fn with_params(mut self, params: SimulationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_time_step(mut self, time_step: TimeStepConfig) -> Self {
        self.time_step = time_step;
        self
    }

    /// Grid described by this configuration
    pub fn grid(&self) -> SimulationGrid {
        SimulationGrid::from_resolution(self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_RESOLUTION, MIN_RESOLUTION};

    #[test]
    fn test_resolution_clamped_at_configuration() {
        let config = RippleConfig::default().with_resolution(1, 9000);
        assert_eq!(config.resolution, UVec2::new(MIN_RESOLUTION, MAX_RESOLUTION));
    }

    #[test]
    fn test_literal_resolution_clamped_by_grid() {
        let config = RippleConfig {
            resolution: UVec2::new(0, 20_000),
            ..Default::default()
        };
        assert_eq!(config.grid().size(), UVec2::new(MIN_RESOLUTION, MAX_RESOLUTION));
    }

    #[test]
    fn test_defaults_match_recognized_options() {
        let config = RippleConfig::default();
        assert_eq!(config.resolution, UVec2::splat(512));
        assert!(config.time_step.use_fixed_time_step);
        assert!((config.time_step.fixed_time_step - 1.0 / 90.0).abs() < f32::EPSILON);
        assert_eq!(config.time_step.max_sub_steps, 4);
        assert!(!config.params.use_external_force);
        assert!(config.auto_publish);
    }

    #[test]
    fn test_blur_builder_clamps() {
        let params = SimulationParams::default().with_blur(9, 0.0);
        assert_eq!(params.blur_radius, 3);
        assert!((params.blur_sigma - 0.1).abs() < f32::EPSILON);
    }
}
