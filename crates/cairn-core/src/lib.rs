//! Core types and traits for Cairn lockstep record-and-replay.
//!
//! This is the leaf crate of the Cairn workspace. It defines the
//! vocabulary shared by the recorder and the player: turn and player
//! identifiers, frozen command payloads, run attributes, state digests,
//! and the narrow traits through which an external simulation is driven.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attributes;
pub mod codec;
pub mod command;
pub mod digest;
pub mod error;
pub mod id;
pub mod payload;
pub mod traits;

pub use attributes::{ModList, ReplayAttributes, RESERVED_USER_MOD};
pub use codec::{JsonCodec, ValueCodec};
pub use command::Command;
pub use digest::{DigestHasher, DigestMode, StateDigest};
pub use error::{CodecError, SimulationError};
pub use id::{PlayerId, TurnIndex, TurnLength};
pub use payload::Payload;
pub use traits::{DiagnosticOptions, NoopProfiler, ProfileSink, Simulation};
