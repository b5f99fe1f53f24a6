//! Test utilities and mock types for Cairn development.
//!
//! Provides a [`MockSimulation`] that records every contract call and
//! derives deterministic digests from what it was fed, a
//! [`RecordingProfiler`], and [`init_tracing`] for test log output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::RefCell;

use cairn_core::{
    Command, DiagnosticOptions, DigestHasher, DigestMode, ProfileSink, ReplayAttributes,
    Simulation, SimulationError, StateDigest, TurnIndex, TurnLength,
};
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Respects `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One `advance_turn` call as observed by [`MockSimulation`].
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedTurn {
    pub length: TurnLength,
    pub commands: Vec<Command>,
}

/// Contract calls in the order [`MockSimulation`] received them.
#[derive(Clone, Debug, PartialEq)]
pub enum SimCall {
    Configure(DiagnosticOptions),
    Bootstrap,
    FinishStart,
    AdvanceTurn,
}

/// Mock implementation of [`Simulation`].
///
/// Its "state" is the full history of applied turns. The full digest
/// folds in every turn length and command; the quick digest only counts
/// turns and commands, so the two modes disagree on any non-trivial state.
#[derive(Debug, Default)]
pub struct MockSimulation {
    calls: Vec<SimCall>,
    attributes: Option<ReplayAttributes>,
    turns: Vec<AppliedTurn>,
    digest_requests: RefCell<Vec<DigestMode>>,
    fail_bootstrap: Option<String>,
    fail_turn: Option<usize>,
    diverge_after: Option<usize>,
}

impl MockSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `bootstrap` fail with `reason`.
    pub fn failing_bootstrap(mut self, reason: &str) -> Self {
        self.fail_bootstrap = Some(reason.to_string());
        self
    }

    /// Make the `n`-th `advance_turn` call (0-based) fail.
    pub fn failing_turn(mut self, n: usize) -> Self {
        self.fail_turn = Some(n);
        self
    }

    /// Perturb both digests once more than `n` turns have been applied,
    /// as if this run had gone out of sync.
    pub fn diverging_after(mut self, n: usize) -> Self {
        self.diverge_after = Some(n);
        self
    }

    pub fn calls(&self) -> &[SimCall] {
        &self.calls
    }

    pub fn attributes(&self) -> Option<&ReplayAttributes> {
        self.attributes.as_ref()
    }

    pub fn turns(&self) -> &[AppliedTurn] {
        &self.turns
    }

    /// Modes of every `compute_state_digest` call so far.
    pub fn digest_requests(&self) -> Vec<DigestMode> {
        self.digest_requests.borrow().clone()
    }

    /// The digest for the current state, without logging a request.
    pub fn state_digest(&self, mode: DigestMode) -> StateDigest {
        let mut h = DigestHasher::new();
        h.write_u64(self.turns.len() as u64);
        match mode {
            DigestMode::Quick => {
                h.write_str("quick");
                let total: usize = self.turns.iter().map(|t| t.commands.len()).sum();
                h.write_u64(total as u64);
            }
            DigestMode::Full => {
                h.write_str("full");
                for turn in &self.turns {
                    h.write_u32(turn.length.0);
                    h.write_u32(turn.commands.len() as u32);
                    for cmd in &turn.commands {
                        h.write_u32(cmd.player.0);
                        h.write_str(&cmd.data.value().to_string());
                    }
                }
            }
        }
        if matches!(self.diverge_after, Some(n) if self.turns.len() > n) {
            h.write_str("diverged");
        }
        h.finish()
    }
}

impl Simulation for MockSimulation {
    fn configure(&mut self, options: &DiagnosticOptions) {
        self.calls.push(SimCall::Configure(options.clone()));
    }

    fn bootstrap(&mut self, attributes: &ReplayAttributes) -> Result<(), SimulationError> {
        self.calls.push(SimCall::Bootstrap);
        if let Some(reason) = &self.fail_bootstrap {
            return Err(SimulationError::BootstrapFailed {
                reason: reason.clone(),
            });
        }
        self.attributes = Some(attributes.clone());
        Ok(())
    }

    fn finish_start(&mut self) -> Result<(), SimulationError> {
        self.calls.push(SimCall::FinishStart);
        Ok(())
    }

    fn advance_turn(
        &mut self,
        turn_length: TurnLength,
        commands: &[Command],
    ) -> Result<(), SimulationError> {
        self.calls.push(SimCall::AdvanceTurn);
        if self.attributes.is_none() {
            return Err(SimulationError::NotStarted);
        }
        if self.fail_turn == Some(self.turns.len()) {
            return Err(SimulationError::TurnFailed {
                reason: format!("injected failure on turn call {}", self.turns.len()),
            });
        }
        self.turns.push(AppliedTurn {
            length: turn_length,
            commands: commands.to_vec(),
        });
        Ok(())
    }

    fn compute_state_digest(&self, mode: DigestMode) -> Result<StateDigest, SimulationError> {
        self.digest_requests.borrow_mut().push(mode);
        Ok(self.state_digest(mode))
    }
}

/// A [`ProfileSink`] that remembers every frame and snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingProfiler {
    pub frames_started: Vec<TurnIndex>,
    pub frames_ended: Vec<TurnIndex>,
    pub snapshots: Vec<TurnIndex>,
    pub finished: bool,
}

impl RecordingProfiler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileSink for RecordingProfiler {
    fn frame_start(&mut self, turn: TurnIndex) {
        self.frames_started.push(turn);
    }

    fn frame_end(&mut self, turn: TurnIndex) {
        self.frames_ended.push(turn);
    }

    fn save_snapshot(&mut self, turn: TurnIndex) {
        self.snapshots.push(turn);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::{Payload, PlayerId};
    use serde_json::json;

    fn started() -> MockSimulation {
        let mut sim = MockSimulation::new();
        sim.bootstrap(&ReplayAttributes::new()).unwrap();
        sim
    }

    #[test]
    fn digests_are_deterministic() {
        let cmd = Command::new(PlayerId(1), Payload::freeze(json!({"type": "walk"})));
        let mut a = started();
        let mut b = started();
        a.advance_turn(TurnLength(200), &[cmd.clone()]).unwrap();
        b.advance_turn(TurnLength(200), &[cmd]).unwrap();
        assert_eq!(
            a.compute_state_digest(DigestMode::Full).unwrap(),
            b.compute_state_digest(DigestMode::Full).unwrap()
        );
    }

    #[test]
    fn modes_differ() {
        let sim = started();
        assert_ne!(
            sim.state_digest(DigestMode::Full),
            sim.state_digest(DigestMode::Quick)
        );
    }

    #[test]
    fn full_digest_sees_command_order() {
        let c1 = Command::new(PlayerId(1), Payload::freeze(json!(1)));
        let c2 = Command::new(PlayerId(2), Payload::freeze(json!(2)));
        let mut a = started();
        let mut b = started();
        a.advance_turn(TurnLength(200), &[c1.clone(), c2.clone()]).unwrap();
        b.advance_turn(TurnLength(200), &[c2, c1]).unwrap();
        assert_ne!(a.state_digest(DigestMode::Full), b.state_digest(DigestMode::Full));
        assert_eq!(a.state_digest(DigestMode::Quick), b.state_digest(DigestMode::Quick));
    }

    #[test]
    fn turn_before_bootstrap_fails() {
        let mut sim = MockSimulation::new();
        assert_eq!(
            sim.advance_turn(TurnLength(200), &[]),
            Err(SimulationError::NotStarted)
        );
    }

    #[test]
    fn divergence_changes_digest() {
        let mut honest = started();
        let mut drifting = MockSimulation::new().diverging_after(1);
        drifting.bootstrap(&ReplayAttributes::new()).unwrap();
        for sim in [&mut honest, &mut drifting] {
            sim.advance_turn(TurnLength(200), &[]).unwrap();
        }
        assert_eq!(
            honest.state_digest(DigestMode::Full),
            drifting.state_digest(DigestMode::Full)
        );
        for sim in [&mut honest, &mut drifting] {
            sim.advance_turn(TurnLength(200), &[]).unwrap();
        }
        assert_ne!(
            honest.state_digest(DigestMode::Full),
            drifting.state_digest(DigestMode::Full)
        );
    }
}
