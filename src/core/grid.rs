//! Simulation grid for the height field
//!
//! Uniform W x H grid, row-major, cell (0, 0) at UV (0, 0).

use bevy::prelude::*;

use crate::config::{MAX_RESOLUTION, MIN_RESOLUTION, THREAD_GROUP_SIZE};

/// Per-cell wave state: canonical (height, velocity) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)] // Matches an RG float texel
pub struct WaveCell {
    pub height: f32,
    pub velocity: f32,
}

impl WaveCell {
    #[inline(always)]
    pub fn zeroed() -> Self {
        Self {
            height: 0.0,
            velocity: 0.0,
        }
    }

    #[inline(always)]
    pub fn zero(&mut self) {
        self.height = 0.0;
        self.velocity = 0.0;
    }

    #[inline(always)]
    pub fn is_finite(&self) -> bool {
        self.height.is_finite() && self.velocity.is_finite()
    }
}

/// How samples that fall outside the grid along one axis are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum EdgeMode {
    /// Mirror the nearest in-grid cell, scaled by the bounce coefficient.
    #[default]
    Bounce,
    /// Let outgoing waves leave the grid.
    Absorb,
    /// Toroidal wrap to the opposite edge.
    Wrap,
}

/// Result of resolving one axis coordinate against an edge policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisTap {
    Inside(u32),
    Reflected(u32),
    Absorbed(u32),
}

impl AxisTap {
    #[inline(always)]
    pub fn index(self) -> u32 {
        match self {
            AxisTap::Inside(i) | AxisTap::Reflected(i) | AxisTap::Absorbed(i) => i,
        }
    }
}

impl EdgeMode {
    /// Resolve `coord` on an axis of `len` cells.
    #[inline(always)]
    pub fn resolve(self, coord: i32, len: u32) -> AxisTap {
        let last = len as i32 - 1;
        if (0..=last).contains(&coord) {
            return AxisTap::Inside(coord as u32);
        }
        match self {
            EdgeMode::Bounce => AxisTap::Reflected(coord.clamp(0, last) as u32),
            EdgeMode::Absorb => AxisTap::Absorbed(coord.clamp(0, last) as u32),
            EdgeMode::Wrap => AxisTap::Inside(coord.rem_euclid(len as i32) as u32),
        }
    }

    /// Plain texel addressing: wrap on Wrap axes, clamp otherwise.
    #[inline(always)]
    pub fn address(self, coord: i32, len: u32) -> u32 {
        match self {
            EdgeMode::Wrap => coord.rem_euclid(len as i32) as u32,
            EdgeMode::Bounce | EdgeMode::Absorb => coord.clamp(0, len as i32 - 1) as u32,
        }
    }
}

/// Resolution of every simulation buffer. Always within
/// [`MIN_RESOLUTION`, `MAX_RESOLUTION`] per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub struct SimulationGrid {
    width: u32,
    height: u32,
}

impl SimulationGrid {
    /// Clamps each axis into the supported range.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.clamp(MIN_RESOLUTION, MAX_RESOLUTION),
            height: height.clamp(MIN_RESOLUTION, MAX_RESOLUTION),
        }
    }

    pub fn from_resolution(resolution: UVec2) -> Self {
        Self::new(resolution.x, resolution.y)
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline(always)]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    #[inline(always)]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index: index = y * width + x
    #[inline(always)]
    pub fn index(&self, cell: UVec2) -> usize {
        cell.y as usize * self.width as usize + cell.x as usize
    }

    #[inline(always)]
    pub fn coord(&self, index: usize) -> UVec2 {
        let width = self.width as usize;
        UVec2::new((index % width) as u32, (index / width) as u32)
    }

    /// Normalized size of one cell.
    #[inline(always)]
    pub fn texel_size(&self) -> Vec2 {
        Vec2::new(1.0 / self.width as f32, 1.0 / self.height as f32)
    }

    /// UV of the cell center.
    #[inline(always)]
    pub fn cell_uv(&self, cell: UVec2) -> Vec2 {
        (cell.as_vec2() + 0.5) * self.texel_size()
    }

    /// Group counts for a dispatch tiled at `THREAD_GROUP_SIZE`².
    #[inline(always)]
    pub fn dispatch_groups(&self) -> UVec2 {
        UVec2::new(
            self.width.div_ceil(THREAD_GROUP_SIZE),
            self.height.div_ceil(THREAD_GROUP_SIZE),
        )
    }
}

impl Default for SimulationGrid {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_RESOLUTION,
            crate::config::DEFAULT_RESOLUTION,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_is_clamped() {
        let grid = SimulationGrid::new(4, 10_000);
        assert_eq!(grid.size(), UVec2::new(MIN_RESOLUTION, MAX_RESOLUTION));

        let grid = SimulationGrid::new(100, 37);
        assert_eq!(grid.size(), UVec2::new(100, 37));
    }

    #[test]
    fn test_index_round_trip_corners() {
        let grid = SimulationGrid::new(33, 17);
        let last = UVec2::new(32, 16);
        assert_eq!(grid.index(UVec2::ZERO), 0);
        assert_eq!(grid.index(last), grid.cell_count() - 1);
        assert_eq!(grid.coord(grid.index(last)), last);
    }

    #[test]
    fn test_dispatch_groups_round_up() {
        assert_eq!(SimulationGrid::new(16, 16).dispatch_groups(), UVec2::new(2, 2));
        assert_eq!(SimulationGrid::new(17, 100).dispatch_groups(), UVec2::new(3, 13));
    }

    #[test]
    fn test_cell_uv_origin() {
        let grid = SimulationGrid::new(16, 32);
        let uv = grid.cell_uv(UVec2::ZERO);
        assert!((uv.x - 0.5 / 16.0).abs() < f32::EPSILON);
        assert!((uv.y - 0.5 / 32.0).abs() < f32::EPSILON);
        let uv = grid.cell_uv(UVec2::new(15, 31));
        assert!((uv - Vec2::new(15.5 / 16.0, 31.5 / 32.0)).length() < f32::EPSILON);
    }

    #[test]
    fn test_edge_resolution() {
        assert_eq!(EdgeMode::Bounce.resolve(-1, 16), AxisTap::Reflected(0));
        assert_eq!(EdgeMode::Absorb.resolve(16, 16), AxisTap::Absorbed(15));
        assert_eq!(EdgeMode::Wrap.resolve(-1, 16), AxisTap::Inside(15));
        assert_eq!(EdgeMode::Wrap.resolve(16, 16), AxisTap::Inside(0));
        assert_eq!(EdgeMode::Bounce.resolve(7, 16), AxisTap::Inside(7));
        assert_eq!(EdgeMode::Absorb.address(-3, 16), 0);
        assert_eq!(EdgeMode::Wrap.address(-3, 16), 13);
    }
}
