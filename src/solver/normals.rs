//! Surface reconstruction: height gradient to world normal, then a separable
//! Gaussian blur of the normal channels (rows, then columns). Height is never
//! blurred.

use bevy::prelude::*;

use crate::config::SimulationParams;
use crate::core::{EdgeMode, SimulationGrid, WaveCell};
use crate::math::{MAX_BLUR_TAPS, gaussian_kernel, normal_from_gradient};

/// Scalar parameters for the normal and blur dispatches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceUniforms {
    pub normal_grad_scale: f32,
    pub blur_radius: u32,
    pub blur_weights: [f32; MAX_BLUR_TAPS],
    pub horizontal_edge: EdgeMode,
    pub vertical_edge: EdgeMode,
}

impl SurfaceUniforms {
    pub fn new(params: &SimulationParams) -> Self {
        let blur_radius = params.effective_blur_radius();
        Self {
            normal_grad_scale: params.normal_grad_scale,
            blur_radius,
            blur_weights: gaussian_kernel(blur_radius, params.effective_blur_sigma()),
            horizontal_edge: params.horizontal_edge,
            vertical_edge: params.vertical_edge,
        }
    }

    #[inline(always)]
    fn address(&self, grid: &SimulationGrid, x: i32, y: i32) -> usize {
        let x = self.horizontal_edge.address(x, grid.width());
        let y = self.vertical_edge.address(y, grid.height());
        grid.index(UVec2::new(x, y))
    }
}

/// Stage 1: central-difference normal, packed as (normal.xyz, height).
pub fn make_normal_cell(
    grid: &SimulationGrid,
    u: &SurfaceUniforms,
    state: &[WaveCell],
    cell: UVec2,
) -> Vec4 {
    let (x, y) = (cell.x as i32, cell.y as i32);
    let h = |dx: i32, dy: i32| state[u.address(grid, x + dx, y + dy)].height;

    let gradient = Vec2::new(h(1, 0) - h(-1, 0), h(0, 1) - h(0, -1)) * 0.5 * u.normal_grad_scale;
    let normal = normal_from_gradient(gradient);
    normal.extend(state[grid.index(cell)].height)
}

/// Direction of one separable blur pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurAxis {
    Horizontal,
    Vertical,
}

impl BlurAxis {
    #[inline(always)]
    fn offset(self, distance: i32) -> IVec2 {
        match self {
            BlurAxis::Horizontal => IVec2::new(distance, 0),
            BlurAxis::Vertical => IVec2::new(0, distance),
        }
    }
}

/// Stage 2: blur the normal of `cell` along one axis; the height passes
/// through.
///
/// The horizontal pass leaves the weighted sum unnormalized so the vertical
/// pass sees the full `w(dx) * w(dy)` product; the vertical pass renormalizes.
pub fn blur_normal_cell(
    grid: &SimulationGrid,
    u: &SurfaceUniforms,
    source: &[Vec4],
    cell: UVec2,
    axis: BlurAxis,
) -> Vec4 {
    let center = source[grid.index(cell)];
    if u.blur_radius == 0 {
        return center;
    }

    let radius = u.blur_radius as i32;
    let origin = cell.as_ivec2();
    let mut sum = Vec3::ZERO;
    for d in -radius..=radius {
        let tap = origin + axis.offset(d);
        let weight = u.blur_weights[(d + radius) as usize];
        sum += source[u.address(grid, tap.x, tap.y)].truncate() * weight;
    }

    match axis {
        BlurAxis::Horizontal => sum.extend(center.w),
        BlurAxis::Vertical => sum.normalize_or(Vec3::Y).extend(center.w),
    }
}
