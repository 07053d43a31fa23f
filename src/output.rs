//! Result publication
//!
//! The result buffer holds (normal.xyz, height) per cell. A bound target
//! receives a full copy of it; the simulation never reads the target back.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::core::SimulationGrid;
use crate::error::{Result, RippleError};

/// Anything that can receive a copy of the result field.
pub trait OutputTarget: Send + Sync {
    /// Copy `result` (row-major, `grid.cell_count()` entries) into the target.
    fn publish(&mut self, grid: &SimulationGrid, result: &[Vec4]) -> Result<()>;
}

impl OutputTarget for Vec<Vec4> {
    fn publish(&mut self, _grid: &SimulationGrid, result: &[Vec4]) -> Result<()> {
        self.clear();
        self.extend_from_slice(result);
        Ok(())
    }
}

/// Shared target so a consumer can read the published field from elsewhere.
impl<T: OutputTarget> OutputTarget for Arc<Mutex<T>> {
    fn publish(&mut self, grid: &SimulationGrid, result: &[Vec4]) -> Result<()> {
        let mut target = self.lock().map_err(|_| RippleError::OutputTargetPoisoned)?;
        target.publish(grid, result)
    }
}
