//! Error types for the ripple simulation.
//!
//! Nothing here is meant to reach the frame loop: stepping and force
//! operations degrade to pass/fail. These errors surface from construction
//! and diagnostics only.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RippleError {
    #[error("no compute backend is bound")]
    NoComputeBackend,

    #[error("sampled map must have non-zero dimensions, got {width}x{height}")]
    InvalidMapSize { width: u32, height: u32 },

    #[error("sampled map of {width}x{height} needs {expected} texels, got {actual}")]
    MapDataLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("non-finite height or velocity at cell ({x}, {y})")]
    NonFiniteState { x: u32, y: u32 },

    #[error("output target lock was poisoned")]
    OutputTargetPoisoned,
}

pub type Result<T> = std::result::Result<T, RippleError>;
