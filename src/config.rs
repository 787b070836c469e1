//! CLI configuration: journal directory/file selection, store location, and
//! the trace-level switch, all parsed via `clap::Parser`.

use std::path::PathBuf;

use clap::Parser;

/// Elite Dangerous writes journals under this directory on Windows; used as
/// the default so the binary runs unconfigured during manual testing.
fn default_journal_dir() -> PathBuf {
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return PathBuf::from(userprofile)
            .join("Saved Games")
            .join("Frontier Developments")
            .join("Elite Dangerous");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join("Saved Games")
            .join("Frontier Developments")
            .join("Elite Dangerous");
    }
    PathBuf::from(".")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("journal-store.sqlite")
}

#[derive(Parser, Debug, Clone)]
#[command(name = "elite-journal-store", about = "Ingests an Elite Dangerous journal into a queryable store")]
pub struct Config {
    /// Directory to watch for the active journal file; ignored if `--file` is
    /// set. Defaults to the platform-appropriate Elite Dangerous journal
    /// directory if omitted.
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Pin a specific journal file instead of discovering the latest one in `--dir`.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Path to the persistent SQLite store. Defaults to `journal-store.sqlite`
    /// in the working directory if omitted.
    #[arg(short = 'b', long)]
    database: Option<PathBuf>,

    /// Replay every historical journal in `--dir` once, then exit without tailing.
    #[arg(long)]
    pub backfill_only: bool,

    /// Raise the default trace level from `info` to `debug`.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// The journal directory, resolved to the platform default if `--dir`
    /// was not given.
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_journal_dir)
    }

    /// The persistent store path, resolved to the default filename if
    /// `--database` was not given.
    pub fn database(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }

    /// Resolves the journal file to open: the pinned `--file` if given, else
    /// the lexicographically-latest journal in the resolved directory.
    pub fn journal_path(&self) -> Option<PathBuf> {
        if let Some(file) = &self.file {
            return Some(file.clone());
        }
        crate::journal::tailer::latest_journal(&self.dir())
    }

    pub fn env_filter_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_filter_directive() {
        let mut config = Config::parse_from(["elite-journal-store"]);
        assert_eq!(config.env_filter_directive(), "info");
        config.verbose = true;
        assert_eq!(config.env_filter_directive(), "debug");
    }

    #[test]
    fn pinned_file_overrides_directory_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let discovered = dir.path().join("Journal.2024-01-01T000000.01.log");
        std::fs::write(&discovered, "").unwrap();

        let mut config = Config::parse_from(["elite-journal-store", "--dir", dir.path().to_str().unwrap()]);
        assert_eq!(config.journal_path(), Some(discovered));

        let pinned = dir.path().join("Journal.pinned.log");
        std::fs::write(&pinned, "").unwrap();
        config.file = Some(pinned.clone());
        assert_eq!(config.journal_path(), Some(pinned));
    }

    #[test]
    fn database_defaults_when_not_given() {
        let config = Config::parse_from(["elite-journal-store"]);
        assert_eq!(config.database(), default_database_path());
    }
}
