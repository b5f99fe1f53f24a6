//! Advisory diagnostics collected during playback.

use std::fmt;

use cairn_core::{ReplayAttributes, StateDigest, TurnIndex};

use crate::compat::ModMismatch;
use crate::verify::DigestCheck;

/// A condition worth reporting that does not stop playback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayWarning {
    /// The recorded and active mod lists differ.
    Mod(ModMismatch),
    /// The recording was made with a different engine version.
    EngineVersion {
        /// Version stored in the recording, if any.
        recorded: Option<String>,
        /// Version of this session.
        current: String,
    },
    /// A record token this reader does not understand was skipped.
    UnknownRecord {
        /// 1-based log line number.
        line: usize,
        /// The unrecognized token.
        token: String,
    },
    /// A digest comparison found the replay out of sync.
    DigestMismatch(DigestCheck),
    /// The log ended inside a turn; its commands were never applied.
    UnterminatedTurn {
        /// The turn left open.
        turn: TurnIndex,
        /// Number of commands discarded.
        discarded: usize,
    },
}

impl fmt::Display for ReplayWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mod(m) => write!(f, "{m}"),
            Self::EngineVersion { recorded, current } => write!(
                f,
                "replay recorded with engine version {}, running {current}",
                recorded.as_deref().unwrap_or("<unknown>")
            ),
            Self::UnknownRecord { line, token } => {
                write!(f, "line {line}: unrecognised replay token '{token}'")
            }
            Self::DigestMismatch(check) => write!(f, "{check}"),
            Self::UnterminatedTurn { turn, discarded } => write!(
                f,
                "log ended inside turn {turn}; {discarded} command(s) not applied"
            ),
        }
    }
}

/// Everything a finished (or interrupted) replay observed.
#[derive(Clone, Debug, Default)]
pub struct ReplaySummary {
    /// Attributes decoded from the `start` record.
    pub attributes: Option<ReplayAttributes>,
    /// Turns closed and applied to the simulation.
    pub turns_played: u64,
    /// Commands applied across all turns.
    pub commands_applied: u64,
    /// Every digest comparison made, in log order.
    pub digest_checks: Vec<DigestCheck>,
    /// Digest records read off the cadence and not compared.
    pub digests_skipped: u64,
    /// Advisory conditions, in the order they occurred.
    pub warnings: Vec<ReplayWarning>,
    /// Full-state digest after the last turn, once the replay finished.
    pub final_digest: Option<StateDigest>,
}

impl ReplaySummary {
    /// Comparisons that found a divergence.
    pub fn mismatches(&self) -> impl Iterator<Item = &DigestCheck> {
        self.digest_checks.iter().filter(|c| c.is_mismatch())
    }

    /// `true` if no comparison found a divergence.
    pub fn in_sync(&self) -> bool {
        self.mismatches().next().is_none()
    }
}
