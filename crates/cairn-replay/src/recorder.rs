//! Live-run recorder.
//!
//! [`ReplayRecorder`] captures a running simulation as a replay log: the
//! augmented run attributes once, then every turn's commands in the order
//! the simulation applied them, plus whatever digests the caller chooses
//! to log. Recording never feeds back into the simulation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use cairn_core::{
    Command, DigestMode, JsonCodec, ReplayAttributes, StateDigest, TurnIndex, TurnLength,
    ValueCodec,
};
use chrono::Utc;
use tracing::{debug, info};

use crate::config::RecorderConfig;
use crate::directory::create_date_index_subdirectory;
use crate::error::ReplayError;
use crate::writer::LogWriter;

/// Records a simulation run.
///
/// Each turn is flushed as soon as it is written. Call
/// [`finish`](ReplayRecorder::finish) to flush trailing digests and get the
/// sink back; a dropped `BufWriter<File>` recorder flushes on drop.
///
/// # Examples
///
/// ```
/// use cairn_core::{ReplayAttributes, StateDigest, DigestMode, TurnIndex, TurnLength};
/// use cairn_replay::{RecorderConfig, ReplayRecorder};
///
/// let config = RecorderConfig::default();
/// let mut rec = ReplayRecorder::with_writer(Vec::new(), &config, ReplayAttributes::new()).unwrap();
/// rec.turn(TurnIndex(0), TurnLength(200), &[]).unwrap();
/// rec.hash(&StateDigest::from_bytes(&[0xaa]), DigestMode::Quick).unwrap();
///
/// let log = String::from_utf8(rec.finish().unwrap()).unwrap();
/// assert!(log.starts_with("start {"));
/// assert!(log.ends_with("turn 0 200\nend\nhash-quick aa\n"));
/// ```
pub struct ReplayRecorder<W: Write, C: ValueCodec = JsonCodec> {
    writer: LogWriter<W, C>,
    directory: Option<PathBuf>,
    attributes: ReplayAttributes,
    turns_recorded: u64,
}

impl ReplayRecorder<BufWriter<File>> {
    /// Start recording to a fresh date-indexed directory under
    /// `config.replay_root`.
    ///
    /// Creates the directory, truncates-and-opens the log file inside it and
    /// writes the `start` record. Any failure is returned: a recorder that
    /// could not write its header would produce an unreplayable log.
    pub fn start_game(
        config: &RecorderConfig,
        attributes: ReplayAttributes,
    ) -> Result<Self, ReplayError> {
        config.validate()?;
        let now = Utc::now();
        let directory = create_date_index_subdirectory(&config.replay_root, now.date_naive())
            .map_err(|source| ReplayError::Open {
                path: config.replay_root.clone(),
                source,
            })?;
        info!(directory = %directory.display(), "writing replay");

        let path = directory.join(&config.file_name);
        let file = File::create(&path).map_err(|source| ReplayError::Open {
            path: path.clone(),
            source,
        })?;
        let mut recorder = Self::begin(
            LogWriter::new(BufWriter::new(file)),
            config,
            attributes,
            now.timestamp(),
        )?;
        recorder.directory = Some(directory);
        Ok(recorder)
    }
}

impl<W: Write> ReplayRecorder<W> {
    /// Start recording to an arbitrary sink with the JSON codec.
    pub fn with_writer(
        writer: W,
        config: &RecorderConfig,
        attributes: ReplayAttributes,
    ) -> Result<Self, ReplayError> {
        config.validate()?;
        Self::begin(
            LogWriter::new(writer),
            config,
            attributes,
            Utc::now().timestamp(),
        )
    }
}

impl<W: Write, C: ValueCodec> ReplayRecorder<W, C> {
    /// Start recording to an arbitrary sink with a custom codec.
    pub fn with_codec(
        writer: W,
        codec: C,
        config: &RecorderConfig,
        attributes: ReplayAttributes,
    ) -> Result<Self, ReplayError> {
        config.validate()?;
        Self::begin(
            LogWriter::with_codec(writer, codec),
            config,
            attributes,
            Utc::now().timestamp(),
        )
    }

    fn begin(
        mut writer: LogWriter<W, C>,
        config: &RecorderConfig,
        mut attributes: ReplayAttributes,
        unix_secs: i64,
    ) -> Result<Self, ReplayError> {
        // The file timestamp can change; the attribute cannot.
        attributes.set_timestamp(unix_secs);
        attributes.set_engine_version(&config.engine_version);
        attributes.set_mods(&config.active_mods);

        writer.write_start(&attributes)?;
        writer.flush()?;
        Ok(Self {
            writer,
            directory: None,
            attributes,
            turns_recorded: 0,
        })
    }

    /// Record one turn's commands in application order and flush.
    pub fn turn(
        &mut self,
        turn: TurnIndex,
        length: TurnLength,
        commands: &[Command],
    ) -> Result<(), ReplayError> {
        self.writer.write_turn(turn, length, commands)?;
        self.turns_recorded += 1;
        debug!(turn = turn.0, commands = commands.len(), "recorded turn");
        Ok(())
    }

    /// Record a state digest. The caller decides the cadence.
    pub fn hash(&mut self, digest: &StateDigest, mode: DigestMode) -> Result<(), ReplayError> {
        self.writer.write_hash(digest, mode)
    }

    /// Directory holding the log, when recording to the filesystem.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// The attributes as written, including the recorder's additions.
    pub fn attributes(&self) -> &ReplayAttributes {
        &self.attributes
    }

    /// Number of turns recorded so far.
    pub fn turns_recorded(&self) -> u64 {
        self.turns_recorded
    }

    /// Flush and return the underlying sink.
    pub fn finish(mut self) -> Result<W, ReplayError> {
        self.writer.flush()?;
        Ok(self.writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOG_FILE;
    use crate::reader::LogReader;
    use crate::record::Record;
    use cairn_core::{JsonCodec, ModList, Payload, PlayerId};
    use serde_json::json;

    fn config(mods: &[&str]) -> RecorderConfig {
        RecorderConfig {
            engine_version: "0.9.0".into(),
            active_mods: mods.iter().copied().collect::<ModList>(),
            ..Default::default()
        }
    }

    #[test]
    fn start_record_is_augmented() {
        let attrs = ReplayAttributes::try_from(json!({"map": "oasis", "mods": ["stale"]})).unwrap();
        let rec = ReplayRecorder::with_writer(Vec::new(), &config(&["public"]), attrs).unwrap();
        assert_eq!(rec.attributes().engine_version(), Some("0.9.0"));
        assert!(rec.attributes().timestamp().unwrap() > 0);
        assert_eq!(rec.directory(), None);

        let buf = rec.finish().unwrap();
        let (_, first) = LogReader::new(buf.as_slice()).next_record().unwrap().unwrap();
        let Record::Start { attributes } = first else {
            panic!("expected start record, got {first:?}");
        };
        let value = JsonCodec.deserialize(&attributes).unwrap();
        assert_eq!(value["map"], "oasis");
        assert_eq!(value["mods"], json!(["public"]));
        assert_eq!(value["engine_version"], "0.9.0");
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn turns_are_counted() {
        let mut rec =
            ReplayRecorder::with_writer(Vec::new(), &config(&[]), ReplayAttributes::new()).unwrap();
        let cmd = Command::new(PlayerId(1), Payload::freeze(json!({"type": "stop"})));
        rec.turn(TurnIndex(0), TurnLength(200), &[cmd]).unwrap();
        rec.turn(TurnIndex(1), TurnLength(200), &[]).unwrap();
        assert_eq!(rec.turns_recorded(), 2);
    }

    #[test]
    fn invalid_config_is_rejected_before_writing() {
        let cfg = RecorderConfig {
            file_name: String::new(),
            ..Default::default()
        };
        let err = ReplayRecorder::with_writer(Vec::new(), &cfg, ReplayAttributes::new());
        assert!(matches!(err, Err(ReplayError::Config(_))));
    }

    #[test]
    fn start_game_creates_date_indexed_log() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = RecorderConfig {
            replay_root: tmp.path().join("replays"),
            ..config(&["public"])
        };

        let mut rec = ReplayRecorder::start_game(&cfg, ReplayAttributes::new()).unwrap();
        rec.turn(TurnIndex(0), TurnLength(200), &[]).unwrap();
        let dir = rec.directory().unwrap().to_path_buf();
        drop(rec);

        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_0001"), "unexpected directory {name}");
        let log = std::fs::read_to_string(dir.join(DEFAULT_LOG_FILE)).unwrap();
        assert!(log.starts_with("start {"));
        assert!(log.ends_with("turn 0 200\nend\n"));

        let second = ReplayRecorder::start_game(&cfg, ReplayAttributes::new()).unwrap();
        assert_ne!(second.directory().unwrap(), dir.as_path());
    }

    #[test]
    fn unwritable_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let cfg = RecorderConfig {
            replay_root: blocker,
            ..Default::default()
        };
        let err = ReplayRecorder::start_game(&cfg, ReplayAttributes::new());
        assert!(matches!(err, Err(ReplayError::Open { .. })));
    }
}
