//! Record-and-replay for deterministic lockstep simulations.
//!
//! Persists every input that drives a simulation run so the run can be
//! reproduced exactly, and checks that a reproduction matches the original
//! by comparing periodic state digests.
//!
//! # Architecture
//!
//! - [`ReplayRecorder`] captures a live run into a log
//! - [`ReplayPlayer`] feeds a log back into a fresh simulation
//! - [`LogWriter`] / [`LogReader`] encode and decode individual records
//! - [`verify_digest`] and [`VerificationPolicy`] decide when digests are compared
//! - [`check_mod_compatibility`] reports mod-list differences
//!
//! Recorder and player share nothing but the log format.
//!
//! # Format
//!
//! UTF-8 text, one record per line:
//!
//! ```text
//! start <json-object>
//! turn <turn> <length>
//! cmd <player> <json-value>
//! ...
//! end
//! hash <hex> | hash-quick <hex>
//! ```
//!
//! Unknown leading tokens are skipped, so newer writers can add record
//! kinds without breaking older players.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod compat;
pub mod config;
pub mod directory;
pub mod error;
pub mod player;
pub mod reader;
pub mod record;
pub mod recorder;
pub mod report;
pub mod verify;
pub mod writer;

pub use compat::{check_mod_compatibility, ModMismatch};
pub use config::{ConfigError, PlayerConfig, RecorderConfig, DEFAULT_LOG_FILE, ENGINE_VERSION};
pub use directory::create_date_index_subdirectory;
pub use error::ReplayError;
pub use player::{PlayerPhase, PlayerState, ReplayPlayer};
pub use reader::{LogReader, RecordIter};
pub use record::{Record, RecordKind};
pub use recorder::ReplayRecorder;
pub use report::{ReplaySummary, ReplayWarning};
pub use verify::{verify_digest, DigestCheck, VerificationPolicy, DIGEST_CADENCE, PROFILE_CADENCE};
pub use writer::LogWriter;
