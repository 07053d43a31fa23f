//! Configuration and parameters
//!
//! Limits, solver settings and time stepping.

pub mod constants;
pub mod settings;
pub mod solver_params;
pub mod time_step;

pub use constants::*;
pub use settings::*;
pub use solver_params::*;
pub use time_step::*;
