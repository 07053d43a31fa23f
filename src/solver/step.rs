//! Height-field wave step
//!
//! Reads the current state, accumulated force and input maps, and writes the
//! next (height, velocity) into the inactive state buffer.

use bevy::prelude::*;

use crate::config::SimulationParams;
use crate::core::{AuxiliaryMaps, AxisTap, EdgeMode, SimulationGrid, WaveCell};

// Below this speed an absorbing edge just pulls toward zero
const MIN_ABSORB_SPEED: f32 = 1e-4;

/// Scalar parameters bound for one step dispatch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepUniforms {
    pub dt: f32,
    pub wave_speed_sq: f32,
    pub depth_scale: f32,
    pub flow_scale: f32,
    pub boundary_bounce: f32,
    pub force_to_velocity: f32,
    /// Velocity kept after damping
    pub velocity_retain: f32,
    /// Height kept after amplitude decay
    pub height_retain: f32,
    pub horizontal_edge: EdgeMode,
    pub vertical_edge: EdgeMode,
    pub use_external_force: bool,
}

impl StepUniforms {
    pub fn new(params: &SimulationParams, dt: f32) -> Self {
        Self {
            dt,
            wave_speed_sq: params.wave_speed * params.wave_speed,
            depth_scale: params.depth_scale,
            flow_scale: params.flow_scale,
            boundary_bounce: params.boundary_bounce,
            force_to_velocity: params.force_to_velocity,
            velocity_retain: (1.0 - params.damping).clamp(0.0, 1.0),
            height_retain: (1.0 - params.amplitude_decay * dt).max(0.0),
            horizontal_edge: params.horizontal_edge,
            vertical_edge: params.vertical_edge,
            use_external_force: params.use_external_force,
        }
    }
}

/// Buffers and maps bound for one step dispatch
pub struct StepSources<'a> {
    pub grid: SimulationGrid,
    pub state: &'a [WaveCell],
    pub force: &'a [f32],
    pub maps: &'a AuxiliaryMaps,
}

impl StepSources<'_> {
    #[inline(always)]
    fn cell(&self, x: u32, y: u32) -> WaveCell {
        self.state[y as usize * self.grid.width() as usize + x as usize]
    }

    #[inline(always)]
    fn is_water(&self, x: u32, y: u32) -> bool {
        self.maps.boundary.is_none() || self.maps.is_water(self.grid.cell_uv(UVec2::new(x, y)))
    }

    /// Height seen by `center` when it samples integer tap (x, y).
    fn tap(&self, u: &StepUniforms, center: WaveCell, speed: f32, x: i32, y: i32) -> f32 {
        let tx = u.horizontal_edge.resolve(x, self.grid.width());
        let ty = u.vertical_edge.resolve(y, self.grid.height());
        let (ix, iy) = (tx.index(), ty.index());
        let edge = self.cell(ix, iy);

        let absorbed = matches!(tx, AxisTap::Absorbed(_)) || matches!(ty, AxisTap::Absorbed(_));
        let reflected = matches!(tx, AxisTap::Reflected(_)) || matches!(ty, AxisTap::Reflected(_));

        if !self.is_water(ix, iy) {
            // Ground mirrors the sampling cell
            return center.height * u.boundary_bounce;
        }
        if absorbed {
            // First-order one-way extrapolation: outgoing waves leave without reflecting
            if speed < MIN_ABSORB_SPEED {
                return 0.0;
            }
            return edge.height - edge.velocity / speed;
        }
        if reflected {
            return edge.height * u.boundary_bounce;
        }
        edge.height
    }

    /// Bilinear height at a fractional grid position.
    fn height_at(&self, u: &StepUniforms, center: WaveCell, speed: f32, position: Vec2) -> f32 {
        let base = position.floor();
        let frac = position - base;
        let (x, y) = (base.x as i32, base.y as i32);

        if frac == Vec2::ZERO {
            return self.tap(u, center, speed, x, y);
        }

        let top = self.tap(u, center, speed, x, y) * (1.0 - frac.x)
            + self.tap(u, center, speed, x + 1, y) * frac.x;
        let bottom = self.tap(u, center, speed, x, y + 1) * (1.0 - frac.x)
            + self.tap(u, center, speed, x + 1, y + 1) * frac.x;
        top * (1.0 - frac.y) + bottom * frac.y
    }
}

/// Integrate one cell.
pub fn step_cell(src: &StepSources, u: &StepUniforms, cell: UVec2) -> WaveCell {
    let uv = src.grid.cell_uv(cell);
    if !src.maps.is_water(uv) {
        return WaveCell::zeroed();
    }

    let index = src.grid.index(cell);
    let center = src.state[index];

    let bed = src.maps.bed(uv);
    let speed_sq = u.wave_speed_sq * (1.0 - bed * u.depth_scale).max(0.0);
    let speed = speed_sq.sqrt();

    // Flow biases where the neighbourhood is sampled; a non-finite offset
    // samples in place
    let advected = cell.as_vec2() - src.maps.flow(uv) * u.flow_scale * u.dt;
    let origin = if advected.is_finite() { advected } else { cell.as_vec2() };
    let h = |offset: Vec2| src.height_at(u, center, speed, origin + offset);
    let laplacian = h(Vec2::X) + h(Vec2::NEG_X) + h(Vec2::Y) + h(Vec2::NEG_Y) - 4.0 * h(Vec2::ZERO);

    let mut velocity = center.velocity + speed_sq * laplacian * u.dt;
    velocity *= u.velocity_retain;

    let mut force = src.force[index];
    if u.use_external_force {
        force += src.maps.external_force(uv);
    }
    velocity += force * u.force_to_velocity;

    let height = (center.height + velocity * u.dt) * u.height_retain;

    WaveCell { height, velocity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ScalarMap, VectorMap};

    fn uniforms(params: &SimulationParams) -> StepUniforms {
        StepUniforms::new(params, 1.0 / 90.0)
    }

    #[test]
    fn test_flat_field_stays_flat() {
        let grid = SimulationGrid::new(16, 16);
        let state = vec![WaveCell::zeroed(); grid.cell_count()];
        let force = vec![0.0; grid.cell_count()];
        let maps = AuxiliaryMaps::default();
        let src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &maps,
        };
        let u = uniforms(&SimulationParams::default());

        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(step_cell(&src, &u, UVec2::new(x, y)), WaveCell::zeroed());
            }
        }
    }

    #[test]
    fn test_force_injects_velocity() {
        let grid = SimulationGrid::new(16, 16);
        let state = vec![WaveCell::zeroed(); grid.cell_count()];
        let mut force = vec![0.0; grid.cell_count()];
        let cell = UVec2::new(8, 8);
        force[grid.index(cell)] = 2.0;
        let maps = AuxiliaryMaps::default();
        let src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &maps,
        };

        let params = SimulationParams {
            force_to_velocity: 1.5,
            amplitude_decay: 0.0,
            ..Default::default()
        };
        let u = uniforms(&params);
        let next = step_cell(&src, &u, cell);
        assert!((next.velocity - 3.0).abs() < 1e-6);
        assert!((next.height - 3.0 * u.dt).abs() < 1e-6);
    }

    #[test]
    fn test_ground_cells_are_zeroed() {
        let grid = SimulationGrid::new(16, 16);
        let wet = WaveCell {
            height: 1.0,
            velocity: 1.0,
        };
        let state = vec![wet; grid.cell_count()];
        let force = vec![1.0; grid.cell_count()];
        let maps = AuxiliaryMaps {
            boundary: Some(ScalarMap::uniform(4, 4, 0.0).unwrap()),
            ..Default::default()
        };
        let src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &maps,
        };
        let u = uniforms(&SimulationParams::default());
        assert_eq!(step_cell(&src, &u, UVec2::new(3, 3)), WaveCell::zeroed());
    }

    #[test]
    fn test_damping_and_decay_factors() {
        let params = SimulationParams {
            damping: 0.25,
            amplitude_decay: 0.5,
            ..Default::default()
        };
        let u = StepUniforms::new(&params, 0.1);
        assert!((u.velocity_retain - 0.75).abs() < 1e-6);
        assert!((u.height_retain - 0.95).abs() < 1e-6);

        let params = SimulationParams {
            damping: 3.0,
            ..Default::default()
        };
        assert_eq!(StepUniforms::new(&params, 0.1).velocity_retain, 0.0);
    }

    #[test]
    fn test_bounce_edge_reflects_scaled_neighbor() {
        let grid = SimulationGrid::new(16, 16);
        let mut state = vec![WaveCell::zeroed(); grid.cell_count()];
        state[grid.index(UVec2::new(0, 5))].height = 1.0;
        let force = vec![0.0; grid.cell_count()];
        let maps = AuxiliaryMaps::default();
        let src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &maps,
        };

        let params = SimulationParams {
            boundary_bounce: 0.5,
            ..Default::default()
        };
        let u = uniforms(&params);
        let center = state[grid.index(UVec2::new(0, 5))];
        assert!((src.tap(&u, center, 8.0, -1, 5) - 0.5).abs() < 1e-6);
        assert!((src.tap(&u, center, 8.0, 0, 5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_edge_reads_opposite_side() {
        let grid = SimulationGrid::new(16, 16);
        let mut state = vec![WaveCell::zeroed(); grid.cell_count()];
        state[grid.index(UVec2::new(15, 5))].height = 0.75;
        let force = vec![0.0; grid.cell_count()];
        let maps = AuxiliaryMaps::default();
        let src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &maps,
        };

        let params = SimulationParams::default().with_edges(EdgeMode::Wrap);
        let u = uniforms(&params);
        assert!((src.tap(&u, WaveCell::zeroed(), 8.0, -1, 5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_absorb_edge_extrapolates_outgoing_wave() {
        let grid = SimulationGrid::new(16, 16);
        let mut state = vec![WaveCell::zeroed(); grid.cell_count()];
        state[grid.index(UVec2::new(15, 5))] = WaveCell {
            height: 1.0,
            velocity: 4.0,
        };
        let force = vec![0.0; grid.cell_count()];
        let maps = AuxiliaryMaps::default();
        let src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &maps,
        };

        let params = SimulationParams::default().with_edges(EdgeMode::Absorb);
        let u = uniforms(&params);
        let center = state[grid.index(UVec2::new(15, 5))];
        assert!((src.tap(&u, center, 8.0, 16, 5) - 0.5).abs() < 1e-6);
        assert_eq!(src.tap(&u, center, 0.0, 16, 5), 0.0);
    }

    #[test]
    fn test_ground_tap_mirrors_center_scaled_by_bounce() {
        let grid = SimulationGrid::new(16, 16);
        let mut state = vec![WaveCell::zeroed(); grid.cell_count()];
        state[grid.index(UVec2::new(6, 5))].height = 0.2;
        state[grid.index(UVec2::new(7, 5))].height = 0.8;
        state[grid.index(UVec2::new(8, 5))].height = 0.3;
        let force = vec![0.0; grid.cell_count()];
        // Columns 8.. are ground
        let boundary = ScalarMap::from_fn(16, 16, |uv| if uv.x < 0.5 { 1.0 } else { 0.0 });
        let maps = AuxiliaryMaps {
            boundary: Some(boundary.unwrap()),
            ..Default::default()
        };
        let src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &maps,
        };
        let center = state[grid.index(UVec2::new(7, 5))];

        for bounce in [1.0, 0.5] {
            let params = SimulationParams {
                boundary_bounce: bounce,
                ..Default::default()
            };
            let u = uniforms(&params);
            let ground = src.tap(&u, center, 8.0, 8, 5);
            assert!((ground - 0.8 * bounce).abs() < 1e-6, "bounce {bounce}: {ground}");
            assert!((src.tap(&u, center, 8.0, 6, 5) - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_non_finite_flow_samples_in_place() {
        let grid = SimulationGrid::new(16, 16);
        let state: Vec<WaveCell> = (0..grid.cell_count())
            .map(|i| WaveCell {
                height: (i % 7) as f32 * 0.1,
                velocity: 0.0,
            })
            .collect();
        let force = vec![0.0; grid.cell_count()];
        let still = AuxiliaryMaps::default();
        let broken = AuxiliaryMaps {
            flow: Some(VectorMap::uniform(2, 2, Vec2::new(f32::NEG_INFINITY, 0.0)).unwrap()),
            ..Default::default()
        };
        let still_src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &still,
        };
        let broken_src = StepSources {
            grid,
            state: &state,
            force: &force,
            maps: &broken,
        };

        let u = uniforms(&SimulationParams::default());
        let mut infinite_scale = u;
        infinite_scale.flow_scale = f32::INFINITY;

        for cell in [UVec2::new(0, 0), UVec2::new(7, 9), UVec2::new(15, 15)] {
            let expected = step_cell(&still_src, &u, cell);
            assert_eq!(step_cell(&broken_src, &u, cell), expected);
            assert_eq!(step_cell(&still_src, &infinite_scale, cell), expected);
        }
    }
}
