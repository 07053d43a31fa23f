//! Ripple simulation driver
//!
//! Owns the buffers, the accumulator, the optional compute backend and the
//! optional output target, and issues every dispatch of a frame in order:
//! N steps, one surface rebuild, one publish.

use std::time::Instant;

use bevy::prelude::*;

use crate::config::{RippleConfig, SimulationParams, TimeStepConfig};
use crate::core::compute::{
    KERNEL_BLUR_COLUMNS, KERNEL_BLUR_ROWS, KERNEL_BRUSH, KERNEL_CLEAR_FORCE, KERNEL_MAKE_NORMALS,
    KERNEL_SIM_STEP,
};
use crate::core::{
    AuxiliaryMaps, ComputeBackend, DispatchStats, ScalarMap, SimulationBuffers, SimulationGrid,
    StateSlot, TaskPoolBackend, TimeAccumulator, VectorMap, WaveCell, timed_dispatch,
};
use crate::error::{Result, RippleError};
use crate::output::OutputTarget;
use crate::solver::{
    BlurAxis, BrushUniforms, StepSources, StepUniforms, SurfaceUniforms, blur_normal_cell,
    brush_cell, clear_cell, make_normal_cell, step_cell,
};

#[derive(Resource)]
pub struct RippleSimulation<B: ComputeBackend = TaskPoolBackend> {
    config: RippleConfig,
    backend: Option<B>,
    buffers: SimulationBuffers,
    maps: AuxiliaryMaps,
    accumulator: TimeAccumulator,
    output: Option<Box<dyn OutputTarget>>,
    stats: DispatchStats,
    steps_taken: u64,
}

impl RippleSimulation<TaskPoolBackend> {
    /// Simulation dispatching on Bevy's compute task pool.
    pub fn new(config: RippleConfig) -> Self {
        Self::with_backend(config, TaskPoolBackend)
    }
}

impl<B: ComputeBackend> RippleSimulation<B> {
    pub fn with_backend(config: RippleConfig, backend: B) -> Self {
        Self {
            backend: Some(backend),
            ..Self::without_backend(config)
        }
    }

    /// Inert simulation: every stepping and force operation is a no-op until
    /// a backend is bound.
    pub fn without_backend(config: RippleConfig) -> Self {
        Self {
            config,
            backend: None,
            buffers: SimulationBuffers::new(),
            maps: AuxiliaryMaps::default(),
            accumulator: TimeAccumulator::new(),
            output: None,
            stats: DispatchStats::default(),
            steps_taken: 0,
        }
    }

    pub fn bind_backend(&mut self, backend: B) {
        debug!("Bound ripple compute backend '{}'", backend.label());
        self.backend = Some(backend);
    }

    pub fn unbind_backend(&mut self) -> Option<B> {
        self.backend.take()
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &RippleConfig {
        &self.config
    }

    pub fn params(&self) -> &SimulationParams {
        &self.config.params
    }

    pub fn params_mut(&mut self) -> &mut SimulationParams {
        &mut self.config.params
    }

    pub fn time_step_mut(&mut self) -> &mut TimeStepConfig {
        &mut self.config.time_step
    }

    pub fn set_auto_publish(&mut self, enabled: bool) {
        self.config.auto_publish = enabled;
    }

    /// Request a new resolution. Buffers are rebuilt (and all state lost) on
    /// the next operation that needs them.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.config.resolution = SimulationGrid::new(width, height).size();
    }

    /// Grid of the allocated buffers, or the requested grid before the
    /// first allocation. Index [`Self::state`] and [`Self::result`] with this.
    pub fn grid(&self) -> SimulationGrid {
        self.buffers.grid().unwrap_or_else(|| self.config.grid())
    }

    /// Grid the next [`Self::ensure_resources`] allocates, after clamping.
    pub fn requested_grid(&self) -> SimulationGrid {
        self.config.grid()
    }

    // Resources

    /// Allocate buffers for the configured resolution if needed.
    ///
    /// Returns false, without touching any buffer, when no backend is bound.
    pub fn ensure_resources(&mut self) -> bool {
        if self.backend.is_none() {
            return false;
        }
        let grid = self.config.grid();
        if self.buffers.ensure(grid) {
            self.accumulator.reset();
        }
        true
    }

    pub fn try_ensure_resources(&mut self) -> Result<()> {
        if self.ensure_resources() {
            Ok(())
        } else {
            Err(RippleError::NoComputeBackend)
        }
    }

    /// Drop every buffer. The next frame reallocates them zeroed.
    pub fn release(&mut self) {
        self.buffers.release();
        self.accumulator.reset();
    }

    pub fn is_allocated(&self) -> bool {
        self.buffers.is_allocated()
    }

    // Frame loop

    /// Advance by one rendered frame: zero or more steps, then one surface
    /// rebuild if anything was integrated, then one publish.
    ///
    /// Returns the number of steps taken.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        if !self.ensure_resources() {
            warn_once!("Ripple simulation advanced without a compute backend; nothing animates");
            return 0;
        }

        let start = Instant::now();
        let time_step = self.config.time_step.clone();
        let mut accumulator = self.accumulator;
        let steps = accumulator.advance(frame_delta, &time_step, |dt| self.step(dt));
        self.accumulator = accumulator;

        if steps > 0 {
            self.rebuild_surface();
            debug!(
                "ripple frame: {} substeps in {:.3}ms",
                steps,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }

        if self.config.auto_publish {
            self.publish_output();
        }
        steps
    }

    /// Run exactly one step of `dt` seconds and swap the state roles.
    ///
    /// Does not rebuild normals; see [`Self::rebuild_surface`].
    pub fn integrate(&mut self, dt: f32) -> bool {
        if !(dt > 0.0) || !self.ensure_resources() {
            return false;
        }
        self.step(dt);
        true
    }

    fn step(&mut self, dt: f32) {
        let (Some(backend), Some(grid)) = (self.backend.as_ref(), self.buffers.grid()) else {
            return;
        };

        let uniforms = StepUniforms::new(&self.config.params, dt);
        let (state, force, write) = self.buffers.step_views();
        let sources = StepSources {
            grid,
            state,
            force,
            maps: &self.maps,
        };
        timed_dispatch(
            backend,
            &mut self.stats,
            KERNEL_SIM_STEP,
            &grid,
            write,
            |cell, slot: &mut WaveCell| *slot = step_cell(&sources, &uniforms, cell),
        );

        self.buffers.swap();
        self.steps_taken += 1;
    }

    /// Reconstruct normals from the current read state and blur them into
    /// the result buffer.
    pub fn rebuild_surface(&mut self) -> bool {
        if !self.ensure_resources() {
            return false;
        }
        let (Some(backend), Some(grid)) = (self.backend.as_ref(), self.buffers.grid()) else {
            return false;
        };

        let uniforms = SurfaceUniforms::new(&self.config.params);

        let (state, intermediate) = self.buffers.normal_views();
        timed_dispatch(
            backend,
            &mut self.stats,
            KERNEL_MAKE_NORMALS,
            &grid,
            intermediate,
            |cell, slot: &mut Vec4| *slot = make_normal_cell(&grid, &uniforms, state, cell),
        );

        let (source, rows) = self.buffers.blur_row_views();
        timed_dispatch(
            backend,
            &mut self.stats,
            KERNEL_BLUR_ROWS,
            &grid,
            rows,
            |cell, slot: &mut Vec4| {
                *slot = blur_normal_cell(&grid, &uniforms, source, cell, BlurAxis::Horizontal)
            },
        );

        let (rows, result) = self.buffers.blur_column_views();
        timed_dispatch(
            backend,
            &mut self.stats,
            KERNEL_BLUR_COLUMNS,
            &grid,
            result,
            |cell, slot: &mut Vec4| {
                *slot = blur_normal_cell(&grid, &uniforms, rows, cell, BlurAxis::Vertical)
            },
        );
        true
    }

    // Force

    /// Stamp a radial brush into the force accumulator.
    ///
    /// `uv` outside [0, 1]² is ignored. Returns true when the stamp was
    /// dispatched.
    pub fn add_force(&mut self, uv: Vec2, radius: f32, strength: f32, falloff: f32) -> bool {
        if !self.ensure_resources() {
            return false;
        }
        let Some(brush) = BrushUniforms::new(uv, radius, strength, falloff) else {
            return false;
        };
        let (Some(backend), Some(grid)) = (self.backend.as_ref(), self.buffers.grid()) else {
            return false;
        };

        timed_dispatch(
            backend,
            &mut self.stats,
            KERNEL_BRUSH,
            &grid,
            self.buffers.force_mut(),
            |cell, force: &mut f32| brush_cell(&grid, &brush, cell, force),
        );
        true
    }

    /// Zero the whole force accumulator.
    pub fn clear_force(&mut self) -> bool {
        if !self.ensure_resources() {
            return false;
        }
        let (Some(backend), Some(grid)) = (self.backend.as_ref(), self.buffers.grid()) else {
            return false;
        };

        timed_dispatch(
            backend,
            &mut self.stats,
            KERNEL_CLEAR_FORCE,
            &grid,
            self.buffers.force_mut(),
            |_, force: &mut f32| clear_cell(force),
        );
        true
    }

    /// Zero state, force and outputs in place and drop any banked time.
    pub fn reset_simulation(&mut self) -> bool {
        if !self.ensure_resources() {
            return false;
        }
        self.buffers.zero_all();
        self.accumulator.reset();
        debug!("Reset ripple simulation state");
        true
    }

    // Buffers

    /// (normal.xyz, height) per cell, row-major. Empty until allocated.
    pub fn result(&self) -> &[Vec4] {
        self.buffers.result()
    }

    pub fn force(&self) -> &[f32] {
        self.buffers.force()
    }

    /// Current read state.
    pub fn state(&self) -> &[WaveCell] {
        self.buffers.read()
    }

    pub fn read_slot(&self) -> StateSlot {
        self.buffers.read_slot()
    }

    pub fn buffers(&self) -> &SimulationBuffers {
        &self.buffers
    }

    // Input maps

    pub fn maps(&self) -> &AuxiliaryMaps {
        &self.maps
    }

    pub fn set_boundary_map(&mut self, map: Option<ScalarMap>) {
        self.maps.boundary = map;
    }

    pub fn set_depth_map(&mut self, map: Option<ScalarMap>) {
        self.maps.depth = map;
    }

    pub fn set_flow_map(&mut self, map: Option<VectorMap>) {
        self.maps.flow = map;
    }

    pub fn set_external_force_map(&mut self, map: Option<ScalarMap>) {
        self.maps.external_force = map;
    }

    // Output

    pub fn set_output_target(&mut self, target: impl OutputTarget + 'static) {
        self.output = Some(Box::new(target));
    }

    pub fn clear_output_target(&mut self) -> Option<Box<dyn OutputTarget>> {
        self.output.take()
    }

    pub fn has_output_target(&self) -> bool {
        self.output.is_some()
    }

    /// One-shot copy of the result into `target`, independent of the bound
    /// target and of auto publish.
    pub fn publish_result_to(&self, target: &mut dyn OutputTarget) -> bool {
        let Some(grid) = self.buffers.grid() else {
            return false;
        };
        match target.publish(&grid, self.buffers.result()) {
            Ok(()) => true,
            Err(error) => {
                warn!("Skipping ripple publish: {error}");
                false
            }
        }
    }

    fn publish_output(&mut self) {
        let (Some(target), Some(grid)) = (self.output.as_mut(), self.buffers.grid()) else {
            return;
        };
        if let Err(error) = target.publish(&grid, self.buffers.result()) {
            warn!("Skipping ripple publish: {error}");
        }
    }

    // Diagnostics

    /// Fails on the first cell of the read state holding NaN or infinity.
    pub fn check_finite(&self) -> Result<()> {
        let Some(grid) = self.buffers.grid() else {
            return Ok(());
        };
        match self.buffers.read().iter().position(|cell| !cell.is_finite()) {
            Some(index) => {
                let cell = grid.coord(index);
                Err(RippleError::NonFiniteState {
                    x: cell.x,
                    y: cell.y,
                })
            }
            None => Ok(()),
        }
    }

    /// Sum of squared heights of the read state.
    pub fn height_energy(&self) -> f64 {
        self.buffers
            .read()
            .iter()
            .map(|cell| (cell.height as f64).powi(2))
            .sum()
    }

    pub fn memory_bytes(&self) -> usize {
        self.buffers.memory_bytes()
    }

    /// Seconds banked for the next frame.
    pub fn accumulator(&self) -> f32 {
        self.accumulator.accumulated()
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn dispatch_stats(&self) -> &DispatchStats {
        &self.stats
    }
}
