//! Recorder and player configuration, validation, and error types.
//!
//! [`RecorderConfig`] and [`PlayerConfig`] are plain structs with sensible
//! defaults. Both are validated when a recorder or player is constructed.

use std::path::PathBuf;

use cairn_core::{DiagnosticOptions, ModList};
use thiserror::Error;

use crate::verify::VerificationPolicy;

/// Engine version stamped into recordings by default.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the log file inside a replay directory.
pub const DEFAULT_LOG_FILE: &str = "commands.txt";

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by `validate()`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A cadence of zero would never trigger.
    #[error("{name} cadence must be non-zero")]
    ZeroCadence {
        /// Which cadence was zero.
        name: &'static str,
    },
    /// The rejoin test turn must be positive.
    #[error("rejoin test turn must be greater than zero")]
    InvalidRejoinTurn,
    /// The log file name is empty or contains a path separator.
    #[error("invalid log file name {name:?}")]
    InvalidFileName {
        /// The rejected name.
        name: String,
    },
    /// The engine version is empty or contains whitespace.
    #[error("invalid engine version {version:?}")]
    InvalidEngineVersion {
        /// The rejected version string.
        version: String,
    },
}

// ── RecorderConfig ─────────────────────────────────────────────────

/// Where and how a [`ReplayRecorder`](crate::ReplayRecorder) writes.
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    /// Directory under which date-indexed replay directories are created.
    /// Default: `replays`.
    pub replay_root: PathBuf,
    /// Engine version stamped into the attributes. Default: this crate's version.
    pub engine_version: String,
    /// Mods active for the recorded run, in mount order.
    pub active_mods: ModList,
    /// Log file name inside the replay directory. Default: `commands.txt`.
    pub file_name: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            replay_root: PathBuf::from("replays"),
            engine_version: ENGINE_VERSION.to_string(),
            active_mods: ModList::new(),
            file_name: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl RecorderConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_name.is_empty()
            || self.file_name.contains(['/', '\\'])
            || self.file_name == "."
            || self.file_name == ".."
        {
            return Err(ConfigError::InvalidFileName {
                name: self.file_name.clone(),
            });
        }
        if self.engine_version.is_empty() || self.engine_version.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidEngineVersion {
                version: self.engine_version.clone(),
            });
        }
        Ok(())
    }
}

// ── PlayerConfig ───────────────────────────────────────────────────

/// Replay-session settings for a [`ReplayPlayer`](crate::ReplayPlayer).
#[derive(Clone, Debug, Default)]
pub struct PlayerConfig {
    /// Mods active for this replay session, compared against the recording.
    pub active_mods: ModList,
    /// Engine version of this session. When set, a different recorded
    /// version is reported as a warning.
    pub engine_version: Option<String>,
    /// Digest comparison and profiling cadences.
    pub policy: VerificationPolicy,
    /// Debug switches forwarded to the simulation before bootstrap.
    pub diagnostics: DiagnosticOptions,
}

impl PlayerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        if self.diagnostics.rejoin_test_turn == Some(0) {
            return Err(ConfigError::InvalidRejoinTurn);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        RecorderConfig::default().validate().unwrap();
        PlayerConfig::default().validate().unwrap();
    }

    #[test]
    fn file_name_with_separator_rejected() {
        let cfg = RecorderConfig {
            file_name: "../escape.txt".into(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidFileName { .. })
        ));
    }

    #[test]
    fn engine_version_with_space_rejected() {
        let cfg = RecorderConfig {
            engine_version: "0.1 beta".into(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidEngineVersion { .. })
        ));
    }

    #[test]
    fn zero_cadence_rejected() {
        let cfg = PlayerConfig {
            policy: VerificationPolicy {
                digest_cadence: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroCadence { name: "digest" })
        );
    }

    #[test]
    fn rejoin_turn_zero_rejected() {
        let mut cfg = PlayerConfig::default();
        cfg.diagnostics.rejoin_test_turn = Some(0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidRejoinTurn));
        cfg.diagnostics.rejoin_test_turn = Some(50);
        cfg.validate().unwrap();
    }
}
