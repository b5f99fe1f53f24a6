//! Date-indexed replay directory allocation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Largest per-day index before allocation gives up.
const MAX_DAILY_INDEX: u32 = 9999;

/// Create and return a fresh `<root>/<YYYY-MM-DD>_<NNNN>` directory.
///
/// `NNNN` is the smallest 1-based, zero-padded index whose directory does
/// not exist yet. `root` is created if missing. Creation uses
/// `create_dir`, so two recorders racing for the same index cannot both
/// win it.
pub fn create_date_index_subdirectory(root: &Path, date: NaiveDate) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let prefix = date.format("%Y-%m-%d").to_string();
    for index in 1..=MAX_DAILY_INDEX {
        let candidate = root.join(format!("{prefix}_{index:04}"));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("all {MAX_DAILY_INDEX} replay directories for {prefix} are taken"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn indices_increase_per_day() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("replays");
        let a = create_date_index_subdirectory(&root, date()).unwrap();
        let b = create_date_index_subdirectory(&root, date()).unwrap();
        assert_eq!(a.file_name().unwrap(), "2024-03-09_0001");
        assert_eq!(b.file_name().unwrap(), "2024-03-09_0002");
        assert!(a.is_dir() && b.is_dir());
    }

    #[test]
    fn gaps_are_reused() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("2024-03-09_0002")).unwrap();
        let a = create_date_index_subdirectory(tmp.path(), date()).unwrap();
        let b = create_date_index_subdirectory(tmp.path(), date()).unwrap();
        assert_eq!(a.file_name().unwrap(), "2024-03-09_0001");
        assert_eq!(b.file_name().unwrap(), "2024-03-09_0003");
    }
}
