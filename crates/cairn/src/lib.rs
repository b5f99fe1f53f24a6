//! Cairn: record-and-replay for deterministic lockstep simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Cairn sub-crates. For most users, adding `cairn` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::io::Cursor;
//! use cairn::prelude::*;
//! use serde_json::json;
//!
//! // A simulation whose whole state is the sum of turn lengths.
//! #[derive(Default)]
//! struct Clock(u64);
//!
//! impl Simulation for Clock {
//!     fn bootstrap(&mut self, _: &ReplayAttributes) -> Result<(), SimulationError> {
//!         Ok(())
//!     }
//!     fn advance_turn(&mut self, len: TurnLength, _: &[Command]) -> Result<(), SimulationError> {
//!         self.0 += len.0 as u64;
//!         Ok(())
//!     }
//!     fn compute_state_digest(&self, _: DigestMode) -> Result<StateDigest, SimulationError> {
//!         let mut h = DigestHasher::new();
//!         h.write_u64(self.0);
//!         Ok(h.finish())
//!     }
//! }
//!
//! // Record two turns.
//! let mut live = Clock::default();
//! let mut rec = ReplayRecorder::with_writer(
//!     Vec::new(),
//!     &RecorderConfig::default(),
//!     ReplayAttributes::new(),
//! )
//! .unwrap();
//! let cmd = Command::new(PlayerId(1), Payload::freeze(json!({"type": "stop"})));
//! for turn in 0..2 {
//!     live.advance_turn(TurnLength(200), &[cmd.clone()]).unwrap();
//!     rec.turn(TurnIndex(turn), TurnLength(200), &[cmd.clone()]).unwrap();
//! }
//! rec.hash(&live.compute_state_digest(DigestMode::Full).unwrap(), DigestMode::Full)
//!     .unwrap();
//! let log = rec.finish().unwrap();
//!
//! // Replay it into a fresh simulation.
//! let mut player = ReplayPlayer::new(Clock::default(), PlayerConfig::default()).unwrap();
//! player.bind(Cursor::new(log)).unwrap();
//! let summary = player.run().unwrap();
//! assert_eq!(summary.turns_played, 2);
//! assert!(summary.in_sync());
//! assert_eq!(player.simulation().0, 400);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cairn-core` | IDs, payloads, commands, attributes, digests, core traits |
//! | [`replay`] | `cairn-replay` | Log format, recorder, player, verification policy |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`cairn-core`).
///
/// Contains turn and player identifiers, frozen payloads, run attributes,
/// digests, and the [`types::Simulation`] and [`types::ProfileSink`] traits.
pub use cairn_core as types;

/// Recording, playback and verification (`cairn-replay`).
///
/// Record live runs with [`replay::ReplayRecorder`], replay and verify them
/// with [`replay::ReplayPlayer`].
pub use cairn_replay as replay;

/// Common imports for typical Cairn usage.
///
/// ```rust
/// use cairn::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use cairn_core::{
        Command, DigestHasher, DigestMode, ModList, Payload, PlayerId, ProfileSink,
        ReplayAttributes, Simulation, StateDigest, TurnIndex, TurnLength,
    };

    // Errors
    pub use cairn_core::{CodecError, SimulationError};
    pub use cairn_replay::ReplayError;

    // Recording and playback
    pub use cairn_replay::{
        PlayerConfig, RecorderConfig, ReplayPlayer, ReplayRecorder, ReplaySummary,
        ReplayWarning, VerificationPolicy,
    };
}
