//! Digest verification policy.
//!
//! Recorded digests are sparse. The player compares a recorded digest
//! against a freshly computed one only when the current turn lies on the
//! digest cadence; digests found anywhere else are read and skipped
//! without being decoded. Comparison is on the hex text, as logged. A
//! second, independent cadence drives profiling snapshots.

use std::fmt;

use cairn_core::{DigestMode, Simulation, StateDigest, TurnIndex};
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::error::ReplayError;

/// Turns between digest comparisons.
pub const DIGEST_CADENCE: u32 = 100;
/// Turns between profiling snapshots.
pub const PROFILE_CADENCE: u32 = 20;

/// When digests are compared and when profiling snapshots are taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Compare digests on turns that are multiples of this. Default: 100.
    pub digest_cadence: u32,
    /// Snapshot profiling data on closed turns that are multiples of this.
    /// Default: 20.
    pub profile_cadence: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            digest_cadence: DIGEST_CADENCE,
            profile_cadence: PROFILE_CADENCE,
        }
    }
}

impl VerificationPolicy {
    /// Check that both cadences are non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.digest_cadence == 0 {
            return Err(ConfigError::ZeroCadence { name: "digest" });
        }
        if self.profile_cadence == 0 {
            return Err(ConfigError::ZeroCadence { name: "profile" });
        }
        Ok(())
    }

    /// Whether a digest read at `turn` is compared.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn_core::TurnIndex;
    /// use cairn_replay::VerificationPolicy;
    ///
    /// let policy = VerificationPolicy::default();
    /// assert!(policy.should_compare(TurnIndex(0)));
    /// assert!(!policy.should_compare(TurnIndex(99)));
    /// assert!(policy.should_compare(TurnIndex(300)));
    /// ```
    pub fn should_compare(&self, turn: TurnIndex) -> bool {
        turn.is_multiple_of(self.digest_cadence)
    }

    /// Whether closing `turn` triggers a profiling snapshot.
    pub fn should_snapshot(&self, turn: TurnIndex) -> bool {
        turn.is_multiple_of(self.profile_cadence)
    }
}

/// Result of comparing a recorded digest against the replayed state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestCheck {
    /// Turn at which the comparison was made.
    pub turn: TurnIndex,
    /// Mode used for both the recorded and the recomputed digest.
    pub mode: DigestMode,
    /// Digest text read from the log, verbatim.
    pub recorded: String,
    /// Digest computed from the replayed simulation.
    pub replayed: StateDigest,
}

impl DigestCheck {
    /// `true` when the replay has diverged from the recording.
    ///
    /// The recorded text must equal the replayed digest's lowercase hex
    /// exactly; garbled or differently cased text is a mismatch.
    pub fn is_mismatch(&self) -> bool {
        self.recorded != self.replayed.to_hex()
    }

    /// Whether the recorded text is a well-formed hex digest at all.
    pub fn recorded_is_valid(&self) -> bool {
        StateDigest::from_hex(&self.recorded).is_ok()
    }
}

impl fmt::Display for DigestCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mismatch() {
            write!(
                f,
                "{} digest mismatch at turn {}: replayed={} recorded={}",
                self.mode, self.turn, self.replayed, self.recorded
            )
        } else {
            write!(f, "{} digest ok at turn {} ({})", self.mode, self.turn, self.replayed)
        }
    }
}

/// Compare a recorded digest against the simulation's current state.
///
/// Returns `Ok(None)` without touching the simulation when `turn` is off
/// the digest cadence. Otherwise recomputes the digest in the recorded
/// `mode` (never the other one) and returns the check; a mismatch is
/// reported, not raised.
pub fn verify_digest<S: Simulation + ?Sized>(
    simulation: &S,
    policy: &VerificationPolicy,
    turn: TurnIndex,
    mode: DigestMode,
    recorded: &str,
) -> Result<Option<DigestCheck>, ReplayError> {
    if !policy.should_compare(turn) {
        return Ok(None);
    }

    let replayed = simulation.compute_state_digest(mode)?;
    let check = DigestCheck {
        turn,
        mode,
        recorded: recorded.to_string(),
        replayed,
    };
    if !check.recorded_is_valid() {
        warn!(
            turn = turn.0,
            %mode,
            recorded = %check.recorded,
            "recorded digest is not valid hex, treating as mismatch"
        );
    } else if check.is_mismatch() {
        warn!(
            turn = turn.0,
            %mode,
            replayed = %check.replayed,
            recorded = %check.recorded,
            "state digest mismatch"
        );
    } else {
        debug!(turn = turn.0, %mode, digest = %check.replayed, "state digest ok");
    }
    Ok(Some(check))
}
