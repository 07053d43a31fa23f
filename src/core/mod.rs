pub mod buffers;
pub mod compute;
pub mod grid;
pub mod maps;
pub mod time_accumulator;

pub use buffers::{SimulationBuffers, StateSlot};
pub use compute::{
    ComputeBackend, DispatchStats, KernelTiming, SerialBackend, TaskPoolBackend, timed_dispatch,
};
pub use grid::{AxisTap, EdgeMode, SimulationGrid, WaveCell};
pub use maps::{AuxiliaryMaps, MapTexel, SampledMap, ScalarMap, VectorMap};
pub use time_accumulator::TimeAccumulator;
