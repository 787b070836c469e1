//! Stream lines from a journal file, resuming after EOF, plus bulk
//! historical reads.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const EOF_POLL: Duration = Duration::from_millis(50);

/// Last journal file in `dir` by lexicographic filename order (journal file
/// names embed an ISO-8601 timestamp, so this is also chronological order).
pub fn latest_journal(dir: &Path) -> Option<PathBuf> {
    all_journals(dir).into_iter().last()
}

/// Every regular file in `dir` whose name contains `Journal`, lexicographically sorted.
pub fn all_journals(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut journals: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.path().is_file()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .contains("Journal")
        })
        .map(|entry| entry.path())
        .collect();

    journals.sort();
    journals
}

/// Reads `path` line-by-line to EOF, once, calling `cb` per line. Used for
/// historical backfill.
pub fn read_once(path: &Path, mut cb: impl FnMut(&str)) -> std::io::Result<()> {
    let file = File::open(path)?;
    for line in BufReader::new(file).lines() {
        cb(&line?);
    }
    Ok(())
}

/// Reads existing content of `path` line-by-line, then follows the file:
/// on EOF, sleeps ~50ms and retries until `cancel` is set. Rotation is not
/// handled here; callers choose the active file.
pub fn tail(path: &Path, mut cb: impl FnMut(&str), cancel: &Arc<AtomicBool>) -> std::io::Result<()> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            if cancel.load(Ordering::Relaxed) {
                return Ok(());
            }
            std::thread::sleep(EOF_POLL);
            // Re-seek to the current position so a subsequent write is seen.
            let pos = reader.stream_position()?;
            reader.seek(SeekFrom::Start(pos))?;
            continue;
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        cb(trimmed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn latest_journal_picks_lexicographically_last() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Journal.2024-01-01T000000.01.log", "Journal.2024-02-01T000000.01.log", "not-a-log.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let latest = latest_journal(dir.path()).unwrap();
        assert_eq!(latest.file_name().unwrap().to_str().unwrap(), "Journal.2024-02-01T000000.01.log");
    }

    #[test]
    fn empty_directory_has_no_latest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(latest_journal(dir.path()).is_none());
    }

    #[test]
    fn read_once_calls_back_for_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.log");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "line one").unwrap();
        writeln!(file, "line two").unwrap();

        let mut seen = Vec::new();
        read_once(&path, |line| seen.push(line.to_string())).unwrap();
        assert_eq!(seen, vec!["line one", "line two"]);
    }
}
