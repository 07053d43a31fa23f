//! Parallel compute dispatch
//!
//! A backend launches one kernel invocation per grid cell, tiled in bands of
//! `THREAD_GROUP_SIZE` rows. A dispatch is complete when `dispatch` returns,
//! so later dispatches always observe its writes.

use std::time::{Duration, Instant};

use bevy::prelude::*;
use bevy::tasks::{ComputeTaskPool, ParallelSliceMut, TaskPool};
use indexmap::IndexMap;

use super::grid::SimulationGrid;
use crate::config::THREAD_GROUP_SIZE;

pub const KERNEL_SIM_STEP: &str = "sim_step";
pub const KERNEL_MAKE_NORMALS: &str = "make_normals";
pub const KERNEL_BLUR_ROWS: &str = "blur_rows";
pub const KERNEL_BLUR_COLUMNS: &str = "blur_columns";
pub const KERNEL_BRUSH: &str = "brush";
pub const KERNEL_CLEAR_FORCE: &str = "clear_force";

pub trait ComputeBackend: Send + Sync + 'static {
    fn label(&self) -> &'static str;

    /// Run `kernel` once for every cell of `grid` against its slot in `buffer`.
    ///
    /// `buffer` must hold exactly `grid.cell_count()` elements.
    fn dispatch<T, K>(&self, grid: &SimulationGrid, buffer: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(UVec2, &mut T) + Send + Sync;
}

/// Single-threaded reference backend, deterministic ordering
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialBackend;

impl ComputeBackend for SerialBackend {
    fn label(&self) -> &'static str {
        "serial"
    }

    fn dispatch<T, K>(&self, grid: &SimulationGrid, buffer: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(UVec2, &mut T) + Send + Sync,
    {
        debug_assert_eq!(buffer.len(), grid.cell_count());
        for (index, slot) in buffer.iter_mut().enumerate() {
            kernel(grid.coord(index), slot);
        }
    }
}

/// Data-parallel backend running row bands on Bevy's compute task pool
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskPoolBackend;

impl ComputeBackend for TaskPoolBackend {
    fn label(&self) -> &'static str {
        "task_pool"
    }

    fn dispatch<T, K>(&self, grid: &SimulationGrid, buffer: &mut [T], kernel: K)
    where
        T: Send,
        K: Fn(UVec2, &mut T) + Send + Sync,
    {
        debug_assert_eq!(buffer.len(), grid.cell_count());
        let width = grid.width() as usize;
        let band_rows = THREAD_GROUP_SIZE as usize;
        let pool = ComputeTaskPool::get_or_init(TaskPool::default);
        let kernel = &kernel;

        let mut cells = buffer;
        cells.par_chunk_map_mut(pool, width * band_rows, move |band, chunk| {
            let first_row = band * band_rows;
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let x = offset % width;
                let y = first_row + offset / width;
                kernel(UVec2::new(x as u32, y as u32), slot);
            }
        });
    }
}

/// Timing for one named kernel
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KernelTiming {
    pub dispatches: u64,
    pub total: Duration,
    pub last: Duration,
    pub last_groups: UVec2,
}

impl KernelTiming {
    pub fn average_ms(&self) -> f64 {
        if self.dispatches == 0 {
            return 0.0;
        }
        self.total.as_secs_f64() * 1000.0 / self.dispatches as f64
    }
}

/// Per-kernel dispatch counters, kept in first-submission order
#[derive(Clone, Debug, Default)]
pub struct DispatchStats {
    kernels: IndexMap<&'static str, KernelTiming>,
}

impl DispatchStats {
    pub fn record(&mut self, kernel: &'static str, groups: UVec2, elapsed: Duration) {
        let timing = self.kernels.entry(kernel).or_default();
        timing.dispatches += 1;
        timing.total += elapsed;
        timing.last = elapsed;
        timing.last_groups = groups;
    }

    pub fn get(&self, kernel: &str) -> Option<&KernelTiming> {
        self.kernels.get(kernel)
    }

    pub fn dispatch_count(&self, kernel: &str) -> u64 {
        self.kernels.get(kernel).map_or(0, |timing| timing.dispatches)
    }

    pub fn total_dispatches(&self) -> u64 {
        self.kernels.values().map(|timing| timing.dispatches).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &KernelTiming)> {
        self.kernels.iter().map(|(&name, timing)| (name, timing))
    }

    pub fn clear(&mut self) {
        self.kernels.clear();
    }
}

/// Dispatch `kernel` on `backend` and record its timing under `name`.
#[inline]
pub fn timed_dispatch<B, T, K>(
    backend: &B,
    stats: &mut DispatchStats,
    name: &'static str,
    grid: &SimulationGrid,
    buffer: &mut [T],
    kernel: K,
) where
    B: ComputeBackend,
    T: Send,
    K: Fn(UVec2, &mut T) + Send + Sync,
{
    let start = Instant::now();
    backend.dispatch(grid, buffer, kernel);
    stats.record(name, grid.dispatch_groups(), start.elapsed());
}
