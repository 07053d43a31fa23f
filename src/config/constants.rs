// Grid and dispatch limits for the ripple simulation

/// Smallest allowed resolution per axis.
pub const MIN_RESOLUTION: u32 = 16;
/// Largest allowed resolution per axis.
pub const MAX_RESOLUTION: u32 = 4096;
/// Default resolution per axis.
pub const DEFAULT_RESOLUTION: u32 = 512;

/// Rows (and columns) covered by one dispatch group.
pub const THREAD_GROUP_SIZE: u32 = 8;

// Variable-step mode never integrates more than this in one go
pub const MAX_VARIABLE_DELTA: f32 = 1.0 / 20.0;

// Normal blur limits
pub const MAX_BLUR_RADIUS: u32 = 3;
pub const MIN_BLUR_SIGMA: f32 = 0.1;

// Boundary texels at or above this value are water
pub const WATER_THRESHOLD: f32 = 0.5;

// Time step ranges
pub const MIN_FIXED_TIME_STEP: f32 = 1.0 / 240.0;
pub const MAX_FIXED_TIME_STEP: f32 = 1.0 / 15.0;
pub const MAX_SUB_STEPS: u32 = 16;
pub const MIN_TIME_SCALE: f32 = 0.1;
pub const MAX_TIME_SCALE: f32 = 5.0;
