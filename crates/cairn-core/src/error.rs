//! Error types shared by the recorder, the player and simulations.

use thiserror::Error;

/// Errors reported by a [`Simulation`](crate::Simulation) implementation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The simulation could not be initialised from the run attributes.
    #[error("bootstrap failed: {reason}")]
    BootstrapFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Applying a turn's commands or advancing time failed.
    #[error("turn failed: {reason}")]
    TurnFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The state digest could not be computed.
    #[error("state digest unavailable: {reason}")]
    DigestUnavailable {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The simulation was driven before it was bootstrapped.
    #[error("simulation not started")]
    NotStarted,
}

/// Errors from encoding or decoding structured values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The text is not valid JSON, or a value could not be serialized.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Run attributes must be a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// The JSON kind that was found instead.
        found: &'static str,
    },
    /// A digest string is not valid hexadecimal.
    #[error("invalid hex digest: {detail}")]
    InvalidHex {
        /// What was wrong with the input.
        detail: String,
    },
}
