use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod math;
pub mod output;
pub mod simulation;
pub mod solver;

// Public re-exports for clean API
pub use config::{RippleConfig, SimulationParams, TimeStepConfig};
pub use crate::core::{
    AuxiliaryMaps, ComputeBackend, DispatchStats, EdgeMode, SampledMap, ScalarMap, SerialBackend,
    SimulationGrid, StateSlot, TaskPoolBackend, TimeAccumulator, VectorMap, WaveCell,
};
pub use error::{Result, RippleError};
pub use output::OutputTarget;
pub use simulation::RippleSimulation;

/// Stamp a radial brush into the force accumulator this frame
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct RippleBrushStroke {
    pub uv: Vec2,
    pub radius: f32,
    pub strength: f32,
    pub falloff: f32,
}

/// Zero the force accumulator before this frame's strokes are applied
#[derive(Message, Clone, Copy, Debug, Default, PartialEq)]
pub struct ClearRippleForce;

/// Input handling and frame advance of the ripple simulation
#[derive(SystemSet, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RippleSimulationSet;

#[derive(Default)]
pub struct RipplePlugin {
    pub config: RippleConfig,
}

impl Plugin for RipplePlugin {
    fn build(&self, app: &mut App) {
        let grid = self.config.grid();
        info!(
            "Ripple simulation {}x{}, wave speed {}, courant {:.3} at fixed step",
            grid.width(),
            grid.height(),
            self.config.params.wave_speed,
            self.config
                .params
                .courant_number(self.config.time_step.fixed_time_step)
        );

        app.insert_resource(RippleSimulation::new(self.config.clone()))
            .add_message::<RippleBrushStroke>()
            .add_message::<ClearRippleForce>()
            .add_systems(
                Update,
                (apply_ripple_input, advance_ripple_simulation)
                    .chain()
                    .in_set(RippleSimulationSet),
            );
    }
}

fn apply_ripple_input(
    mut clears: MessageReader<ClearRippleForce>,
    mut strokes: MessageReader<RippleBrushStroke>,
    mut simulation: ResMut<RippleSimulation>,
) {
    if clears.read().count() > 0 {
        simulation.clear_force();
    }
    for stroke in strokes.read() {
        simulation.add_force(stroke.uv, stroke.radius, stroke.strength, stroke.falloff);
    }
}

fn advance_ripple_simulation(time: Res<Time>, mut simulation: ResMut<RippleSimulation>) {
    simulation.advance(time.delta_secs());
}
