//! The contracts through which Cairn drives a simulation and reports
//! profiling frames.

use crate::attributes::ReplayAttributes;
use crate::command::Command;
use crate::digest::{DigestMode, StateDigest};
use crate::error::SimulationError;
use crate::id::{TurnIndex, TurnLength};

/// Debug switches a replay session forwards to the simulation.
///
/// All switches default to off. They do not change what the player feeds
/// the simulation, only what the simulation checks or logs while running.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticOptions {
    /// Serialize and deserialize the state every turn and check it round-trips.
    pub serialization_test: bool,
    /// Simulate a client rejoining at this turn and verify its state.
    pub rejoin_test_turn: Option<u32>,
    /// Write a detailed out-of-sync log alongside digests.
    pub oos_log: bool,
}

/// A deterministic, turn-based simulation.
///
/// One implementation instance is driven by exactly one recorder or
/// player at a time. Implementations must apply commands strictly in the
/// order given: reordering may change the resulting state.
pub trait Simulation {
    /// Apply diagnostic switches. Called once, before [`bootstrap`](Simulation::bootstrap).
    fn configure(&mut self, _options: &DiagnosticOptions) {}

    /// Initialise the simulation from the run attributes.
    fn bootstrap(&mut self, attributes: &ReplayAttributes) -> Result<(), SimulationError>;

    /// Complete start-of-game setup after [`bootstrap`](Simulation::bootstrap)
    /// (e.g. finish loading the map). No turn is advanced before this returns.
    fn finish_start(&mut self) -> Result<(), SimulationError> {
        Ok(())
    }

    /// Apply `commands` in order, then advance time by `turn_length`.
    fn advance_turn(
        &mut self,
        turn_length: TurnLength,
        commands: &[Command],
    ) -> Result<(), SimulationError>;

    /// Digest of the current state. Must not mutate simulation state.
    fn compute_state_digest(&self, mode: DigestMode) -> Result<StateDigest, SimulationError>;
}

impl<S: Simulation + ?Sized> Simulation for &mut S {
    fn configure(&mut self, options: &DiagnosticOptions) {
        (**self).configure(options)
    }

    fn bootstrap(&mut self, attributes: &ReplayAttributes) -> Result<(), SimulationError> {
        (**self).bootstrap(attributes)
    }

    fn finish_start(&mut self) -> Result<(), SimulationError> {
        (**self).finish_start()
    }

    fn advance_turn(
        &mut self,
        turn_length: TurnLength,
        commands: &[Command],
    ) -> Result<(), SimulationError> {
        (**self).advance_turn(turn_length, commands)
    }

    fn compute_state_digest(&self, mode: DigestMode) -> Result<StateDigest, SimulationError> {
        (**self).compute_state_digest(mode)
    }
}

impl<S: Simulation + ?Sized> Simulation for Box<S> {
    fn configure(&mut self, options: &DiagnosticOptions) {
        (**self).configure(options)
    }

    fn bootstrap(&mut self, attributes: &ReplayAttributes) -> Result<(), SimulationError> {
        (**self).bootstrap(attributes)
    }

    fn finish_start(&mut self) -> Result<(), SimulationError> {
        (**self).finish_start()
    }

    fn advance_turn(
        &mut self,
        turn_length: TurnLength,
        commands: &[Command],
    ) -> Result<(), SimulationError> {
        (**self).advance_turn(turn_length, commands)
    }

    fn compute_state_digest(&self, mode: DigestMode) -> Result<StateDigest, SimulationError> {
        (**self).compute_state_digest(mode)
    }
}

/// Receives profiling frames while a replay runs.
///
/// Purely a side channel: nothing a sink does can influence playback.
pub trait ProfileSink {
    /// A turn is about to be applied.
    fn frame_start(&mut self, _turn: TurnIndex) {}

    /// A turn has been applied.
    fn frame_end(&mut self, _turn: TurnIndex) {}

    /// Persist accumulated statistics. Called on the profiling cadence.
    fn save_snapshot(&mut self, _turn: TurnIndex) {}

    /// Playback reached end of stream.
    fn finish(&mut self) {}
}

/// A [`ProfileSink`] that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProfiler;

impl ProfileSink for NoopProfiler {}

impl<P: ProfileSink + ?Sized> ProfileSink for &mut P {
    fn frame_start(&mut self, turn: TurnIndex) {
        (**self).frame_start(turn)
    }

    fn frame_end(&mut self, turn: TurnIndex) {
        (**self).frame_end(turn)
    }

    fn save_snapshot(&mut self, turn: TurnIndex) {
        (**self).save_snapshot(turn)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}
