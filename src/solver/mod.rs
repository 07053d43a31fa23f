// src/solver/mod.rs
pub mod force;
pub mod normals;
pub mod step;

pub use force::{BrushUniforms, brush_cell, clear_cell};
pub use normals::{BlurAxis, SurfaceUniforms, blur_normal_cell, make_normal_cell};
pub use step::{StepSources, StepUniforms, step_cell};
