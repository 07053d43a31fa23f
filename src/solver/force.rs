//! Force accumulator kernels: additive radial brush and clear.

use bevy::prelude::*;

use crate::core::SimulationGrid;
use crate::math::brush_weight;

/// One brush stamp in normalized UV units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushUniforms {
    pub center: Vec2,
    pub radius: f32,
    pub strength: f32,
    pub falloff: f32,
}

impl BrushUniforms {
    /// `None` when the stamp cannot touch any cell: center outside [0, 1]²,
    /// non-positive radius, or non-finite inputs.
    pub fn new(center: Vec2, radius: f32, strength: f32, falloff: f32) -> Option<Self> {
        let inside = (0.0..=1.0).contains(&center.x) && (0.0..=1.0).contains(&center.y);
        if !inside || !(radius > 0.0) || !strength.is_finite() || !falloff.is_finite() {
            return None;
        }
        Some(Self {
            center,
            radius,
            strength,
            falloff,
        })
    }

    /// Amount added to the cell whose center sits at `uv`.
    #[inline(always)]
    pub fn contribution(&self, uv: Vec2) -> f32 {
        self.strength * brush_weight(uv.distance(self.center), self.radius, self.falloff)
    }
}

/// Brush kernel body: accumulate into the cell's force.
#[inline(always)]
pub fn brush_cell(grid: &SimulationGrid, brush: &BrushUniforms, cell: UVec2, force: &mut f32) {
    let contribution = brush.contribution(grid.cell_uv(cell));
    if contribution != 0.0 {
        *force += contribution;
    }
}

/// Clear kernel body.
#[inline(always)]
pub fn clear_cell(force: &mut f32) {
    *force = 0.0;
}
