//! Sequential log reader.
//!
//! [`LogReader`] pulls records from any `BufRead` source one line at a
//! time, tracking line numbers for diagnostics. The format is strictly
//! sequential: there is no seeking and no rewind.

use std::io::BufRead;

use crate::error::ReplayError;
use crate::record::Record;

/// Reads records from a line-oriented log.
///
/// Generic over `R: BufRead` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`.
///
/// # Examples
///
/// ```
/// use cairn_replay::{LogReader, Record};
///
/// let log = "start {}\n\nturn 0 200\nend\n";
/// let mut reader = LogReader::new(log.as_bytes());
/// let (line, first) = reader.next_record().unwrap().unwrap();
/// assert_eq!(line, 1);
/// assert!(matches!(first, Record::Start { .. }));
/// // Blank lines are skipped but still counted.
/// let (line, _) = reader.next_record().unwrap().unwrap();
/// assert_eq!(line, 3);
/// ```
pub struct LogReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
    records_read: u64,
}

impl<R: BufRead> LogReader<R> {
    /// Wrap a buffered source positioned at the start of a log.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            records_read: 0,
        }
    }

    /// Read the next record with its 1-based line number, or `None` at
    /// end of stream.
    pub fn next_record(&mut self) -> Result<Option<(usize, Record)>, ReplayError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if let Some(record) = Record::parse(&self.buf, self.line_no)? {
                self.records_read += 1;
                return Ok(Some((self.line_no, record)));
            }
        }
    }

    /// Number of non-blank records read so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Convert into a record iterator.
    pub fn records(self) -> RecordIter<R> {
        RecordIter {
            reader: self,
            done: false,
        }
    }
}

/// Iterator adapter over log records. Stops after the first error.
pub struct RecordIter<R: BufRead> {
    reader: LogReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for RecordIter<R> {
    type Item = Result<(usize, Record), ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    #[test]
    fn reads_all_kinds_in_order() {
        let log = "start {\"mods\":[]}\nturn 0 200\ncmd 1 {}\nend\nhash 00\nturn 1 200\nend\n";
        let kinds: Vec<_> = LogReader::new(log.as_bytes())
            .records()
            .map(|r| r.unwrap().1.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::Start,
                RecordKind::Turn,
                RecordKind::Cmd,
                RecordKind::End,
                RecordKind::Hash,
                RecordKind::Turn,
                RecordKind::End,
            ]
        );
    }

    #[test]
    fn missing_trailing_newline() {
        let mut reader = LogReader::new("start {}\nend".as_bytes());
        reader.next_record().unwrap();
        let (line, rec) = reader.next_record().unwrap().unwrap();
        assert_eq!(line, 2);
        assert_eq!(rec, Record::End);
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 2);
    }

    #[test]
    fn iterator_stops_after_error() {
        let log = "turn 1\nend\n";
        let mut iter = LogReader::new(log.as_bytes()).records();
        assert!(matches!(
            iter.next(),
            Some(Err(ReplayError::MalformedRecord { line: 1, .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn invalid_utf8_is_io_error() {
        let bytes: &[u8] = b"start {}\n\xff\xfe\n";
        let mut reader = LogReader::new(bytes);
        reader.next_record().unwrap();
        assert!(matches!(reader.next_record(), Err(ReplayError::Io(_))));
    }
}
