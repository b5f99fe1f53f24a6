//! Replay playback state machine.
//!
//! [`ReplayPlayer`] consumes a log from start to end and drives an owned
//! simulation with exactly the attributes and command batches that were
//! recorded, at the same turn boundaries, checking recorded digests on
//! the verification cadence.
//!
//! # States
//!
//! ```text
//! Idle ──bind──▶ AwaitingStart ──start──▶ Between ──turn──▶ InTurn ─┐
//!                                            ▲                 │ cmd │
//!                                            └──────end────────┴─────┘
//! Between ──(end of stream)──▶ Finished        any ──(fatal)──▶ Failed
//! ```
//!
//! `hash`/`hash-quick` are accepted in `InTurn` and `Between` and never
//! change state. Unknown tokens are skipped with a warning in any bound
//! state. Every other record/state pair is an
//! [`UnexpectedRecord`](ReplayError::UnexpectedRecord) error.
//!
//! # Ownership model
//!
//! The player owns its simulation (pass `&mut sim` to keep ownership
//! outside) and its log stream. The stream is released as soon as the
//! player reaches a terminal state, on success and on failure alike.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cairn_core::{
    Command, DigestMode, JsonCodec, NoopProfiler, PlayerId, ProfileSink, ReplayAttributes,
    Simulation, TurnIndex, TurnLength, ValueCodec,
};
use tracing::{debug, error, info, trace, warn};

use crate::compat::check_mod_compatibility;
use crate::config::PlayerConfig;
use crate::error::ReplayError;
use crate::reader::LogReader;
use crate::record::Record;
use crate::report::{ReplaySummary, ReplayWarning};
use crate::verify::verify_digest;

// ── PlayerState ─────────────────────────────────────────────────

/// Where the player is in the log.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerState {
    /// No log source bound yet.
    Idle,
    /// Bound; the next record must be `start`.
    AwaitingStart,
    /// A turn is open and accumulating commands.
    InTurn {
        /// The open turn.
        turn: TurnIndex,
        /// Its length.
        length: TurnLength,
        /// Commands read so far, in log order.
        pending: Vec<Command>,
    },
    /// No turn is open. `turn` is the last closed turn (0 right after `start`).
    Between {
        /// Most recent turn index.
        turn: TurnIndex,
    },
    /// End of stream reached cleanly.
    Finished,
    /// A fatal error stopped playback.
    Failed,
}

impl PlayerState {
    /// The state without its data, for diagnostics.
    pub fn phase(&self) -> PlayerPhase {
        match self {
            Self::Idle => PlayerPhase::Idle,
            Self::AwaitingStart => PlayerPhase::AwaitingStart,
            Self::InTurn { .. } => PlayerPhase::InTurn,
            Self::Between { .. } => PlayerPhase::Between,
            Self::Finished => PlayerPhase::Finished,
            Self::Failed => PlayerPhase::Failed,
        }
    }

    /// `true` for [`Finished`](Self::Finished) and [`Failed`](Self::Failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

/// Data-free discriminant of [`PlayerState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerPhase {
    /// See [`PlayerState::Idle`].
    Idle,
    /// See [`PlayerState::AwaitingStart`].
    AwaitingStart,
    /// See [`PlayerState::InTurn`].
    InTurn,
    /// See [`PlayerState::Between`].
    Between,
    /// See [`PlayerState::Finished`].
    Finished,
    /// See [`PlayerState::Failed`].
    Failed,
}

impl fmt::Display for PlayerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingStart => "awaiting start",
            Self::InTurn => "inside a turn",
            Self::Between => "between turns",
            Self::Finished => "finished",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ── ReplayPlayer ────────────────────────────────────────────────

/// Replays a recorded log into a simulation.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use cairn_core::{DigestMode, DigestHasher, ReplayAttributes, Simulation, SimulationError,
///     StateDigest, TurnLength, Command};
/// use cairn_replay::{PlayerConfig, PlayerPhase, ReplayPlayer};
///
/// #[derive(Default)]
/// struct Counter { elapsed: u64, applied: u64 }
///
/// impl Simulation for Counter {
///     fn bootstrap(&mut self, _: &ReplayAttributes) -> Result<(), SimulationError> { Ok(()) }
///     fn advance_turn(&mut self, len: TurnLength, cmds: &[Command]) -> Result<(), SimulationError> {
///         self.elapsed += len.0 as u64;
///         self.applied += cmds.len() as u64;
///         Ok(())
///     }
///     fn compute_state_digest(&self, _: DigestMode) -> Result<StateDigest, SimulationError> {
///         let mut h = DigestHasher::new();
///         h.write_u64(self.elapsed);
///         h.write_u64(self.applied);
///         Ok(h.finish())
///     }
/// }
///
/// let log = "start {\"mods\":[]}\nturn 0 200\ncmd 1 {\"type\":\"stop\"}\nend\nturn 1 200\nend\n";
/// let mut sim = Counter::default();
/// let mut player = ReplayPlayer::new(&mut sim, PlayerConfig::default()).unwrap();
/// player.bind(Cursor::new(log)).unwrap();
/// let summary = player.run().unwrap();
/// assert_eq!(player.phase(), PlayerPhase::Finished);
/// assert_eq!(summary.turns_played, 2);
/// drop(player);
/// assert_eq!((sim.elapsed, sim.applied), (400, 1));
/// ```
pub struct ReplayPlayer<S: Simulation, P: ProfileSink = NoopProfiler> {
    simulation: S,
    profiler: P,
    codec: Box<dyn ValueCodec>,
    config: PlayerConfig,
    source: Option<LogReader<Box<dyn BufRead>>>,
    state: PlayerState,
    summary: ReplaySummary,
}

impl<S: Simulation> ReplayPlayer<S> {
    /// Create an idle player driving `simulation`.
    pub fn new(simulation: S, config: PlayerConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Self {
            simulation,
            profiler: NoopProfiler,
            codec: Box::new(JsonCodec),
            config,
            source: None,
            state: PlayerState::Idle,
            summary: ReplaySummary::default(),
        })
    }
}

impl<S: Simulation, P: ProfileSink> ReplayPlayer<S, P> {
    /// Replace the profiling sink.
    pub fn with_profiler<Q: ProfileSink>(self, profiler: Q) -> ReplayPlayer<S, Q> {
        ReplayPlayer {
            simulation: self.simulation,
            profiler,
            codec: self.codec,
            config: self.config,
            source: self.source,
            state: self.state,
            summary: self.summary,
        }
    }

    /// Replace the payload codec.
    pub fn with_codec(mut self, codec: impl ValueCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Open a log file and bind it.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        if self.state != PlayerState::Idle {
            return Err(ReplayError::AlreadyBound);
        }
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReplayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loading replay");
        self.bind(BufReader::new(file))
    }

    /// Bind a log source. Only valid while idle.
    pub fn bind<R: BufRead + 'static>(&mut self, reader: R) -> Result<(), ReplayError> {
        if self.state != PlayerState::Idle {
            return Err(ReplayError::AlreadyBound);
        }
        self.source = Some(LogReader::new(Box::new(reader)));
        self.state = PlayerState::AwaitingStart;
        Ok(())
    }

    /// Consume one record (or end of stream).
    ///
    /// Returns `Ok(true)` while more records may follow and `Ok(false)` once
    /// the player has finished. Any error moves the player to
    /// [`PlayerState::Failed`] and releases the stream.
    pub fn step(&mut self) -> Result<bool, ReplayError> {
        match self.state {
            PlayerState::Idle => return Err(ReplayError::NotBound),
            PlayerState::Finished | PlayerState::Failed => {
                return Err(ReplayError::AlreadyFinished)
            }
            _ => {}
        }

        let result = self.advance();
        if let Err(e) = &result {
            error!(error = %e, "replay failed");
            self.state = PlayerState::Failed;
            self.source = None;
        }
        result
    }

    /// Play the bound log to the end.
    pub fn run(&mut self) -> Result<ReplaySummary, ReplayError> {
        while self.step()? {}
        Ok(self.summary.clone())
    }

    /// Current state.
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Current state without its data.
    pub fn phase(&self) -> PlayerPhase {
        self.state.phase()
    }

    /// Diagnostics gathered so far.
    pub fn summary(&self) -> &ReplaySummary {
        &self.summary
    }

    /// The driven simulation.
    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// The profiling sink.
    pub fn profiler(&self) -> &P {
        &self.profiler
    }

    /// Tear down the player, returning the simulation, the profiler and the
    /// diagnostics.
    pub fn into_parts(self) -> (S, P, ReplaySummary) {
        (self.simulation, self.profiler, self.summary)
    }

    fn advance(&mut self) -> Result<bool, ReplayError> {
        let next = match self.source.as_mut() {
            Some(source) => source.next_record()?,
            None => return Err(ReplayError::NotBound),
        };
        match next {
            Some((line, record)) => {
                self.apply(line, record)?;
                Ok(true)
            }
            None => {
                self.finish()?;
                Ok(false)
            }
        }
    }

    /// The transition table.
    fn apply(&mut self, line: usize, record: Record) -> Result<(), ReplayError> {
        // Left as Failed if any transition errors out.
        let state = std::mem::replace(&mut self.state, PlayerState::Failed);
        self.state = match (state, record) {
            (PlayerState::AwaitingStart, Record::Start { attributes }) => {
                self.start(line, &attributes)?;
                PlayerState::Between { turn: TurnIndex(0) }
            }
            (PlayerState::Between { .. }, Record::Turn { turn, length }) => {
                trace!(turn = turn.0, length = length.0, "turn");
                PlayerState::InTurn {
                    turn,
                    length,
                    pending: Vec::new(),
                }
            }
            (
                PlayerState::InTurn {
                    turn,
                    length,
                    mut pending,
                },
                Record::Cmd { player, payload },
            ) => {
                pending.push(self.decode_command(line, player, &payload)?);
                PlayerState::InTurn {
                    turn,
                    length,
                    pending,
                }
            }
            (
                PlayerState::InTurn {
                    turn,
                    length,
                    pending,
                },
                Record::End,
            ) => {
                self.close_turn(turn, length, &pending)?;
                PlayerState::Between { turn }
            }
            (
                PlayerState::InTurn {
                    turn,
                    length,
                    pending,
                },
                Record::Hash { mode, digest },
            ) => {
                self.check_digest(turn, mode, &digest)?;
                PlayerState::InTurn {
                    turn,
                    length,
                    pending,
                }
            }
            (PlayerState::Between { turn }, Record::Hash { mode, digest }) => {
                self.check_digest(turn, mode, &digest)?;
                PlayerState::Between { turn }
            }
            (state, Record::Unknown { token, .. }) => {
                warn!(line, %token, "unrecognised replay token");
                self.summary
                    .warnings
                    .push(ReplayWarning::UnknownRecord { line, token });
                state
            }
            (state, record) => {
                return Err(ReplayError::UnexpectedRecord {
                    line,
                    record: record.kind(),
                    phase: state.phase(),
                })
            }
        };
        Ok(())
    }

    fn start(&mut self, line: usize, text: &str) -> Result<(), ReplayError> {
        let attributes = self
            .codec
            .deserialize(text)
            .and_then(ReplayAttributes::try_from)
            .map_err(|source| ReplayError::Codec { line, source })?;

        for mismatch in check_mod_compatibility(&attributes.mods(), &self.config.active_mods) {
            warn!("{mismatch}");
            self.summary.warnings.push(ReplayWarning::Mod(mismatch));
        }
        if let Some(current) = &self.config.engine_version {
            let recorded = attributes.engine_version();
            if recorded != Some(current.as_str()) {
                let warning = ReplayWarning::EngineVersion {
                    recorded: recorded.map(str::to_owned),
                    current: current.clone(),
                };
                warn!("{warning}");
                self.summary.warnings.push(warning);
            }
        }

        self.simulation.configure(&self.config.diagnostics);
        self.simulation.bootstrap(&attributes)?;
        self.simulation.finish_start()?;
        info!(mods = %attributes.mods(), "replay started");
        self.summary.attributes = Some(attributes);
        Ok(())
    }

    fn decode_command(
        &self,
        line: usize,
        player: PlayerId,
        payload: &str,
    ) -> Result<Command, ReplayError> {
        let data = self
            .codec
            .deserialize_frozen(payload)
            .map_err(|source| ReplayError::Codec { line, source })?;
        Ok(Command::new(player, data))
    }

    fn close_turn(
        &mut self,
        turn: TurnIndex,
        length: TurnLength,
        commands: &[Command],
    ) -> Result<(), ReplayError> {
        self.profiler.frame_start(turn);
        self.simulation.advance_turn(length, commands)?;
        self.profiler.frame_end(turn);

        self.summary.turns_played += 1;
        self.summary.commands_applied += commands.len() as u64;
        if self.config.policy.should_snapshot(turn) {
            self.profiler.save_snapshot(turn);
        }
        Ok(())
    }

    fn check_digest(
        &mut self,
        turn: TurnIndex,
        mode: DigestMode,
        recorded: &str,
    ) -> Result<(), ReplayError> {
        match verify_digest(&self.simulation, &self.config.policy, turn, mode, recorded)? {
            Some(check) => {
                if check.is_mismatch() {
                    self.summary
                        .warnings
                        .push(ReplayWarning::DigestMismatch(check.clone()));
                }
                self.summary.digest_checks.push(check);
            }
            None => {
                debug!(turn = turn.0, %mode, "digest off cadence, not compared");
                self.summary.digests_skipped += 1;
            }
        }
        Ok(())
    }

    /// End of stream.
    fn finish(&mut self) -> Result<(), ReplayError> {
        match std::mem::replace(&mut self.state, PlayerState::Failed) {
            PlayerState::AwaitingStart => return Err(ReplayError::MissingStart),
            PlayerState::InTurn { turn, pending, .. } => {
                let warning = ReplayWarning::UnterminatedTurn {
                    turn,
                    discarded: pending.len(),
                };
                warn!("{warning}");
                self.summary.warnings.push(warning);
            }
            _ => {}
        }
        self.source = None;
        self.profiler.finish();

        let digest = self.simulation.compute_state_digest(DigestMode::Full)?;
        info!(
            turns = self.summary.turns_played,
            final_state = %digest,
            "replay finished"
        );
        self.summary.final_digest = Some(digest);
        self.state = PlayerState::Finished;
        Ok(())
    }
}
