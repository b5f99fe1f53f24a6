//! Log writer.
//!
//! [`LogWriter`] encodes attributes, turns and digests as log records on
//! any `Write` sink. It knows nothing about files, directories or
//! attribute augmentation; see [`ReplayRecorder`](crate::ReplayRecorder)
//! for that.

use std::io::Write;

use cairn_core::{
    Command, DigestMode, JsonCodec, ReplayAttributes, StateDigest, TurnIndex, TurnLength,
    ValueCodec,
};

use crate::error::ReplayError;
use crate::record::{write_record, Record};

/// Writes log records to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use cairn_core::{Command, Payload, PlayerId, ReplayAttributes, TurnIndex, TurnLength};
/// use cairn_replay::LogWriter;
/// use serde_json::json;
///
/// let mut writer = LogWriter::new(Vec::new());
/// writer.write_start(&ReplayAttributes::new()).unwrap();
/// let cmd = Command::new(PlayerId(1), Payload::freeze(json!({"type": "stop"})));
/// writer.write_turn(TurnIndex(0), TurnLength(200), &[cmd]).unwrap();
///
/// let text = String::from_utf8(writer.into_inner()).unwrap();
/// assert_eq!(text, "start {}\nturn 0 200\ncmd 1 {\"type\":\"stop\"}\nend\n");
/// ```
pub struct LogWriter<W: Write, C: ValueCodec = JsonCodec> {
    writer: W,
    codec: C,
    records_written: u64,
}

impl<W: Write> LogWriter<W> {
    /// Create a writer using the JSON codec.
    pub fn new(writer: W) -> Self {
        Self::with_codec(writer, JsonCodec)
    }
}

impl<W: Write, C: ValueCodec> LogWriter<W, C> {
    /// Create a writer using a custom codec.
    pub fn with_codec(writer: W, codec: C) -> Self {
        Self {
            writer,
            codec,
            records_written: 0,
        }
    }

    /// Write the `start` record.
    pub fn write_start(&mut self, attributes: &ReplayAttributes) -> Result<(), ReplayError> {
        let attributes = self
            .codec
            .serialize(&attributes.clone().into_value())
            .map_err(|source| ReplayError::Codec { line: 0, source })?;
        self.write(&Record::Start { attributes })
    }

    /// Write a complete turn (`turn`, one `cmd` per command in order, `end`)
    /// and flush, so a crash never leaves a buffered half-turn behind.
    pub fn write_turn(
        &mut self,
        turn: TurnIndex,
        length: TurnLength,
        commands: &[Command],
    ) -> Result<(), ReplayError> {
        // Encode every payload before writing anything, so a codec failure
        // cannot leave an unterminated turn in the log.
        let payloads = commands
            .iter()
            .map(|cmd| {
                self.codec
                    .serialize(cmd.data.value())
                    .map(|payload| Record::Cmd {
                        player: cmd.player,
                        payload,
                    })
                    .map_err(|source| ReplayError::Codec { line: 0, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.write(&Record::Turn { turn, length })?;
        for record in &payloads {
            self.write(record)?;
        }
        self.write(&Record::End)?;
        self.flush()
    }

    /// Write a `hash` or `hash-quick` record.
    pub fn write_hash(&mut self, digest: &StateDigest, mode: DigestMode) -> Result<(), ReplayError> {
        self.write(&Record::Hash {
            mode,
            digest: digest.to_hex(),
        })
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, record: &Record) -> Result<(), ReplayError> {
        write_record(&mut self.writer, record)?;
        self.records_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LogReader;
    use cairn_core::{CodecError, Payload, PlayerId};
    use serde_json::{json, Value};

    struct FailingCodec;

    impl ValueCodec for FailingCodec {
        fn serialize(&self, value: &Value) -> Result<String, CodecError> {
            if value.get("poison").is_some() {
                return Err(CodecError::NotAnObject { found: "poison" });
            }
            JsonCodec.serialize(value)
        }

        fn deserialize(&self, text: &str) -> Result<Value, CodecError> {
            JsonCodec.deserialize(text)
        }
    }

    #[test]
    fn empty_turn_is_turn_then_end() {
        let mut w = LogWriter::new(Vec::new());
        w.write_turn(TurnIndex(7), TurnLength(500), &[]).unwrap();
        assert_eq!(w.records_written(), 2);
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "turn 7 500\nend\n");
    }

    #[test]
    fn commands_keep_supplied_order() {
        let cmds: Vec<_> = [3u32, 1, 2]
            .iter()
            .map(|&p| Command::new(PlayerId(p), Payload::freeze(json!({"n": p}))))
            .collect();
        let mut w = LogWriter::new(Vec::new());
        w.write_turn(TurnIndex(0), TurnLength(200), &cmds).unwrap();
        let buf = w.into_inner();

        let players: Vec<_> = LogReader::new(buf.as_slice())
            .records()
            .filter_map(|r| match r.unwrap().1 {
                Record::Cmd { player, .. } => Some(player.0),
                _ => None,
            })
            .collect();
        assert_eq!(players, vec![3, 1, 2]);
    }

    #[test]
    fn codec_failure_writes_nothing() {
        let cmds = vec![
            Command::new(PlayerId(1), Payload::freeze(json!({"ok": true}))),
            Command::new(PlayerId(1), Payload::freeze(json!({"poison": true}))),
        ];
        let mut w = LogWriter::with_codec(Vec::new(), FailingCodec);
        let err = w.write_turn(TurnIndex(0), TurnLength(200), &cmds).unwrap_err();
        assert!(matches!(err, ReplayError::Codec { .. }));
        assert!(w.get_ref().is_empty());
        assert_eq!(w.records_written(), 0);
    }

    #[test]
    fn hash_records() {
        let mut w = LogWriter::new(Vec::new());
        let d = StateDigest::from_bytes(&[0xab, 0xcd]);
        w.write_hash(&d, DigestMode::Full).unwrap();
        w.write_hash(&d, DigestMode::Quick).unwrap();
        assert_eq!(
            String::from_utf8(w.into_inner()).unwrap(),
            "hash abcd\nhash-quick abcd\n"
        );
    }
}
