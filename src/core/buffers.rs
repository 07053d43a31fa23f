//! Device buffers for the ripple simulation
//!
//! Two state buffers ping-pong through a single role flag; callers resolve
//! "read" and "write" on every access and never hold either across a step.

use bevy::prelude::*;

use super::grid::{SimulationGrid, WaveCell};

/// Which of the two state buffers is meant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateSlot {
    A,
    B,
}

impl StateSlot {
    #[inline(always)]
    fn index(self) -> usize {
        match self {
            StateSlot::A => 0,
            StateSlot::B => 1,
        }
    }
}

/// Owns every buffer sized by the grid
#[derive(Debug, Default)]
pub struct SimulationBuffers {
    grid: Option<SimulationGrid>,
    state: [Vec<WaveCell>; 2],
    read_a: bool,
    force: Vec<f32>,
    /// (normal.xyz, height) before the blur
    intermediate: Vec<Vec4>,
    /// Row-blurred normals between the two blur passes
    blur_scratch: Vec<Vec4>,
    /// (normal.xyz, height) exposed to consumers
    result: Vec<Vec4>,
}

impl SimulationBuffers {
    pub fn new() -> Self {
        Self {
            read_a: true,
            ..Default::default()
        }
    }

    /// Grid of the currently allocated buffers, if any.
    pub fn grid(&self) -> Option<SimulationGrid> {
        self.grid
    }

    pub fn is_allocated(&self) -> bool {
        self.grid.is_some()
    }

    /// Allocate for `grid` unless already allocated at that size.
    ///
    /// Reallocation is destructive: every buffer comes back zero-filled and
    /// state A becomes the read buffer. Returns true when a (re)allocation
    /// happened.
    pub fn ensure(&mut self, grid: SimulationGrid) -> bool {
        if self.grid == Some(grid) {
            return false;
        }

        self.release();
        let cells = grid.cell_count();
        self.state = [vec![WaveCell::zeroed(); cells], vec![WaveCell::zeroed(); cells]];
        self.force = vec![0.0; cells];
        self.intermediate = vec![Vec4::ZERO; cells];
        self.blur_scratch = vec![Vec4::ZERO; cells];
        self.result = vec![Vec4::ZERO; cells];
        self.read_a = true;
        self.grid = Some(grid);

        info!(
            "Allocated ripple buffers {}x{} ({:.2} MiB)",
            grid.width(),
            grid.height(),
            self.memory_bytes() as f64 / (1024.0 * 1024.0)
        );
        true
    }

    /// Drop every buffer.
    pub fn release(&mut self) {
        if let Some(grid) = self.grid.take() {
            debug!("Released ripple buffers {}x{}", grid.width(), grid.height());
        }
        self.state = [Vec::new(), Vec::new()];
        self.force = Vec::new();
        self.intermediate = Vec::new();
        self.blur_scratch = Vec::new();
        self.result = Vec::new();
        self.read_a = true;
    }

    /// Zero both state buffers, the force and the outputs without reallocating.
    pub fn zero_all(&mut self) {
        for buffer in &mut self.state {
            buffer.iter_mut().for_each(WaveCell::zero);
        }
        self.force.fill(0.0);
        self.intermediate.fill(Vec4::ZERO);
        self.blur_scratch.fill(Vec4::ZERO);
        self.result.fill(Vec4::ZERO);
    }

    #[inline(always)]
    fn read_index(&self) -> usize {
        self.read_slot().index()
    }

    pub fn read_slot(&self) -> StateSlot {
        if self.read_a { StateSlot::A } else { StateSlot::B }
    }

    pub fn write_slot(&self) -> StateSlot {
        if self.read_a { StateSlot::B } else { StateSlot::A }
    }

    /// Flip read/write roles. Called exactly once per completed step.
    pub fn swap(&mut self) {
        self.read_a = !self.read_a;
    }

    pub fn read(&self) -> &[WaveCell] {
        &self.state[self.read_index()]
    }

    pub fn write(&self) -> &[WaveCell] {
        &self.state[1 - self.read_index()]
    }

    /// Read state together with the force buffer and the writable state.
    pub fn step_views(&mut self) -> (&[WaveCell], &[f32], &mut [WaveCell]) {
        let read_a = self.read_a;
        let [a, b] = &mut self.state;
        let (read, write) = if read_a { (a, b) } else { (b, a) };
        (read.as_slice(), self.force.as_slice(), write.as_mut_slice())
    }

    /// Read state and the pre-blur buffer it is reconstructed into.
    pub fn normal_views(&mut self) -> (&[WaveCell], &mut [Vec4]) {
        let read = self.read_index();
        (self.state[read].as_slice(), self.intermediate.as_mut_slice())
    }

    /// Pre-blur buffer and the scratch buffer its rows are blurred into.
    pub fn blur_row_views(&mut self) -> (&[Vec4], &mut [Vec4]) {
        (self.intermediate.as_slice(), self.blur_scratch.as_mut_slice())
    }

    /// Row-blurred scratch and the result buffer its columns are blurred into.
    pub fn blur_column_views(&mut self) -> (&[Vec4], &mut [Vec4]) {
        (self.blur_scratch.as_slice(), self.result.as_mut_slice())
    }

    pub fn force(&self) -> &[f32] {
        &self.force
    }

    pub fn force_mut(&mut self) -> &mut [f32] {
        &mut self.force
    }

    pub fn intermediate(&self) -> &[Vec4] {
        &self.intermediate
    }

    pub fn blur_scratch(&self) -> &[Vec4] {
        &self.blur_scratch
    }

    pub fn result(&self) -> &[Vec4] {
        &self.result
    }

    /// State buffer by fixed identity. Diagnostics only.
    pub fn state(&self, slot: StateSlot) -> &[WaveCell] {
        &self.state[slot.index()]
    }

    pub fn state_mut(&mut self, slot: StateSlot) -> &mut [WaveCell] {
        &mut self.state[slot.index()]
    }

    pub fn memory_bytes(&self) -> usize {
        let state = self.state.iter().map(Vec::len).sum::<usize>() * size_of::<WaveCell>();
        let force = self.force.len() * size_of::<f32>();
        let vectors = (self.intermediate.len() + self.blur_scratch.len() + self.result.len())
            * size_of::<Vec4>();
        state + force + vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_is_idempotent() {
        let mut buffers = SimulationBuffers::new();
        let grid = SimulationGrid::new(16, 24);
        assert!(buffers.ensure(grid));
        assert!(!buffers.ensure(grid));
        assert_eq!(buffers.read().len(), 16 * 24);
    }

    #[test]
    fn test_resize_discards_state() {
        let mut buffers = SimulationBuffers::new();
        buffers.ensure(SimulationGrid::new(16, 16));
        buffers.force_mut()[3] = 2.0;
        buffers.state_mut(StateSlot::A)[5].height = 1.0;
        buffers.swap();

        assert!(buffers.ensure(SimulationGrid::new(32, 16)));
        assert_eq!(buffers.read_slot(), StateSlot::A);
        assert!(buffers.force().iter().all(|&f| f == 0.0));
        assert!(buffers.read().iter().all(|c| *c == WaveCell::zeroed()));
        assert_eq!(buffers.result().len(), 32 * 16);
    }

    #[test]
    fn test_swap_alternates_roles() {
        let mut buffers = SimulationBuffers::new();
        buffers.ensure(SimulationGrid::new(16, 16));
        assert_eq!(buffers.read_slot(), StateSlot::A);
        assert_eq!(buffers.write_slot(), StateSlot::B);
        buffers.swap();
        assert_eq!(buffers.read_slot(), StateSlot::B);
        assert_eq!(buffers.write_slot(), StateSlot::A);
    }

    #[test]
    fn test_step_views_write_into_inactive_buffer() {
        let mut buffers = SimulationBuffers::new();
        buffers.ensure(SimulationGrid::new(16, 16));
        {
            let (_, _, write) = buffers.step_views();
            write[0].height = 3.0;
        }
        assert_eq!(buffers.state(StateSlot::B)[0].height, 3.0);
        assert_eq!(buffers.read()[0].height, 0.0);
    }

    #[test]
    fn test_release_frees_everything() {
        let mut buffers = SimulationBuffers::new();
        buffers.ensure(SimulationGrid::new(64, 64));
        assert!(buffers.memory_bytes() > 0);
        buffers.release();
        assert!(!buffers.is_allocated());
        assert_eq!(buffers.memory_bytes(), 0);
    }
}
