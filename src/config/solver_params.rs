use bevy::prelude::*;

use crate::config::{MAX_BLUR_RADIUS, MIN_BLUR_SIGMA};
use crate::core::EdgeMode;

/// Solver parameters for the height-field wave step and surface reconstruction
#[derive(Clone, Debug, PartialEq, Reflect)]
pub struct SimulationParams {
    /// Propagation speed in cells per second
    pub wave_speed: f32,

    /// Fraction of velocity removed each step (0.0 = none, 1.0 = all)
    pub damping: f32,

    /// Height decay rate per second
    pub amplitude_decay: f32,

    /// How strongly bed elevation slows waves down
    pub depth_scale: f32,

    /// Multiplier applied to flow map vectors (cells per second)
    pub flow_scale: f32,

    /// Reflection coefficient at bouncing edges and ground cells
    pub boundary_bounce: f32,

    /// Gain from accumulated force to velocity
    pub force_to_velocity: f32,

    /// Gradient scale used when reconstructing normals
    pub normal_grad_scale: f32,

    /// Normal blur radius in cells (0 copies without blurring)
    pub blur_radius: u32,

    /// Gaussian sigma of the normal blur
    pub blur_sigma: f32,

    pub horizontal_edge: EdgeMode,
    pub vertical_edge: EdgeMode,

    /// Add the external force map (when bound) to brush force
    pub use_external_force: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            wave_speed: 8.0,
            damping: 0.02,
            amplitude_decay: 0.05,
            depth_scale: 1.0,
            flow_scale: 1.0,
            boundary_bounce: 1.0,
            force_to_velocity: 1.0,
            normal_grad_scale: 1.0,
            blur_radius: 1,
            blur_sigma: 1.0,
            horizontal_edge: EdgeMode::Bounce,
            vertical_edge: EdgeMode::Bounce,
            use_external_force: false,
        }
    }
}

impl SimulationParams {
    /// Same edge policy on both axes
    pub fn with_edges(mut self, mode: EdgeMode) -> Self {
        self.horizontal_edge = mode;
        self.vertical_edge = mode;
        self
    }

    pub fn with_edge_modes(mut self, horizontal: EdgeMode, vertical: EdgeMode) -> Self {
        self.horizontal_edge = horizontal;
        self.vertical_edge = vertical;
        self
    }

    /// Set blur radius (0 to 3) and sigma (>= 0.1)
    pub fn with_blur(mut self, radius: u32, sigma: f32) -> Self {
        self.blur_radius = radius.min(MAX_BLUR_RADIUS);
        self.blur_sigma = sigma.max(MIN_BLUR_SIGMA);
        self
    }

    /// Set damping (0.0 to 1.0) and amplitude decay (0.0 to 2.0)
    pub fn with_damping(mut self, damping: f32, amplitude_decay: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self.amplitude_decay = amplitude_decay.clamp(0.0, 2.0);
        self
    }

    pub fn with_wave_speed(mut self, wave_speed: f32) -> Self {
        self.wave_speed = wave_speed.clamp(0.0, 50.0);
        self
    }

    /// Blur radius actually used by the blur kernel
    #[inline]
    pub fn effective_blur_radius(&self) -> u32 {
        self.blur_radius.min(MAX_BLUR_RADIUS)
    }

    #[inline]
    pub fn effective_blur_sigma(&self) -> f32 {
        self.blur_sigma.max(MIN_BLUR_SIGMA)
    }

    /// `wave_speed * dt` with a cell spacing of one. Informational only:
    /// the step kernel never enforces it.
    pub fn courant_number(&self, dt: f32) -> f32 {
        self.wave_speed * dt
    }
}
