//! Error types for the replay system.

use std::io;
use std::path::PathBuf;

use cairn_core::{CodecError, SimulationError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::player::PlayerPhase;
use crate::record::RecordKind;

/// Errors that stop recording or playback.
///
/// Advisory conditions (unknown records, mod mismatches, digest
/// mismatches) are never errors; they are reported as
/// [`ReplayWarning`](crate::ReplayWarning)s instead.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// An I/O error occurred while reading or writing the log stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A log file or replay directory could not be opened or created.
    #[error("cannot open {path:?}: {source}")]
    Open {
        /// The path that could not be opened.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A `start` or `cmd` payload could not be encoded or decoded.
    #[error("line {line}: {source}")]
    Codec {
        /// 1-based log line number (0 when writing).
        line: usize,
        /// The codec failure.
        source: CodecError,
    },
    /// A known record kind has missing or unparseable fields.
    #[error("line {line}: malformed record: {detail}")]
    MalformedRecord {
        /// 1-based log line number.
        line: usize,
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A record arrived in a state where it is not allowed.
    #[error("line {line}: unexpected `{record}` record while {phase}")]
    UnexpectedRecord {
        /// 1-based log line number.
        line: usize,
        /// The record that arrived.
        record: RecordKind,
        /// What the player was doing.
        phase: PlayerPhase,
    },
    /// The log ended before its `start` record.
    #[error("log ended before the start record")]
    MissingStart,
    /// The simulation rejected an operation.
    #[error("simulation: {0}")]
    Simulation(#[from] SimulationError),
    /// Playback was requested before a log source was bound.
    #[error("no log source bound")]
    NotBound,
    /// A log source is already bound to this player.
    #[error("a log source is already bound")]
    AlreadyBound,
    /// The player already reached a terminal state.
    #[error("replay already finished")]
    AlreadyFinished,
    /// Recorder or player configuration is invalid.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}
