//! Owns `SessionState`, the storage handle, the background ingestion
//! thread, and per-kind subscriber channels. On startup
//! it backfills every historical journal in lexicographic order, then tails
//! the active file until cancelled.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::Config;
use crate::error::StorageError;
use crate::journal::tailer;
use crate::model::{SessionState, StarSystem};
use crate::state_machine::{Importer, Notification, SessionHandler, StateErrorExt};
use crate::storage::Storage;

/// One `Sender` per notification kind; a subscriber reading the
/// matching `Receiver` is told only that its slice of `SessionState` may
/// have changed, not what changed, and re-reads the shared snapshot.
struct Subscribers {
    system: Sender<()>,
    ship: Sender<()>,
    route: Sender<()>,
    missions: Sender<()>,
}

impl Subscribers {
    fn notify(&self, kinds: &[Notification]) {
        for kind in kinds {
            let sender = match kind {
                Notification::SystemChanged => &self.system,
                Notification::ShipChanged => &self.ship,
                Notification::RouteChanged => &self.route,
                Notification::MissionsChanged => &self.missions,
            };
            // A full channel just means the subscriber hasn't drained its
            // last notification yet; the coalesced signal is still pending.
            let _ = sender.send(());
        }
    }
}

/// Read-only subscription handles returned alongside a running `Session`.
pub struct Subscriptions {
    pub system: Receiver<()>,
    pub ship: Receiver<()>,
    pub route: Receiver<()>,
    pub missions: Receiver<()>,
}

/// A running ingestion session. Dropping it signals cancellation and joins
/// the background thread.
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Session {
    /// Opens the store, backfills historical journals, then spawns the
    /// tailer on a background thread. Returns immediately.
    pub fn spawn(config: Config) -> Result<(Session, Subscriptions), StorageError> {
        let storage = Storage::open(path_to_str(&config.database()))?;
        let state = Arc::new(Mutex::new(SessionState::new(StarSystem::new_minimal(0, String::new(), String::new()))));

        backfill(&storage, &state, &config.dir());

        let (system_tx, system_rx) = channel();
        let (ship_tx, ship_rx) = channel();
        let (route_tx, route_rx) = channel();
        let (missions_tx, missions_rx) = channel();
        let subscribers = Subscribers { system: system_tx, ship: ship_tx, route: route_tx, missions: missions_tx };

        let cancel = Arc::new(AtomicBool::new(false));
        let thread_state = Arc::clone(&state);
        let thread_cancel = Arc::clone(&cancel);
        let journal_path = config.journal_path();

        let handle = std::thread::spawn(move || {
            let Some(path) = journal_path else {
                tracing::warn!("no journal file found; ingestion thread exiting immediately");
                return;
            };
            run_tail(&storage, &thread_state, &subscribers, &path, &thread_cancel);
        });

        Ok((
            Session { state, cancel, handle: Some(handle) },
            Subscriptions { system: system_rx, ship: ship_rx, route: route_rx, missions: missions_rx },
        ))
    }

    /// Replays every historical journal in `config.dir` to completion, then
    /// returns without tailing (the `--backfill-only` entry point).
    pub fn backfill_only(config: &Config) -> Result<(), StorageError> {
        let storage = Storage::open(path_to_str(&config.database()))?;
        let state = Arc::new(Mutex::new(SessionState::new(StarSystem::new_minimal(0, String::new(), String::new()))));
        backfill(&storage, &state, &config.dir());
        Ok(())
    }

    /// A read-only clone of the current session state, safe to hand to
    /// presentation code without holding the lock.
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().expect("session state mutex poisoned").clone()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn path_to_str(path: &Path) -> &str {
    path.to_str().unwrap_or_default()
}

/// Replays every historical journal under `dir` in lexicographic (hence
/// chronological) order, applying each line via an `Importer`. Aborts (stops
/// applying further lines, across every remaining file) on the first fatal
/// storage failure; subsequent state is thereafter treated as unreliable.
fn backfill(storage: &Storage, state: &Arc<Mutex<SessionState>>, dir: &Path) {
    let aborted = AtomicBool::new(false);
    for path in tailer::all_journals(dir) {
        if aborted.load(Ordering::Relaxed) {
            break;
        }
        let mut guard = state.lock().expect("session state mutex poisoned");
        let result = tailer::read_once(&path, |line| {
            if aborted.load(Ordering::Relaxed) {
                return;
            }
            if apply_line(storage, &mut guard, line).is_none() {
                aborted.store(true, Ordering::Relaxed);
            }
        });
        if let Err(err) = result {
            tracing::warn!(path = %path.display(), error = %err, "failed to read historical journal");
        }
    }
}

/// Tails `path` indefinitely, applying each line and notifying subscribers
/// of whichever session-state slices changed. On a fatal storage failure,
/// stops applying events and requests cancellation so the ingestion
/// thread winds down instead of tailing a store it can no longer write to.
fn run_tail(storage: &Storage, state: &Arc<Mutex<SessionState>>, subscribers: &Subscribers, path: &Path, cancel: &Arc<AtomicBool>) {
    let aborted = AtomicBool::new(false);
    let result = tailer::tail(
        path,
        |line| {
            if aborted.load(Ordering::Relaxed) {
                return;
            }
            let mut guard = state.lock().expect("session state mutex poisoned");
            match apply_line(storage, &mut guard, line) {
                Some(notifications) => {
                    drop(guard);
                    subscribers.notify(&notifications);
                }
                None => {
                    drop(guard);
                    aborted.store(true, Ordering::Relaxed);
                    cancel.store(true, Ordering::Relaxed);
                }
            }
        },
        cancel,
    );
    if let Err(err) = result {
        tracing::warn!(path = %path.display(), error = %err, "journal tailer stopped on io error");
    }
}

/// Parses one line and applies it to `state`, returning the notification
/// kinds that fired. Parse/schema errors are logged and skipped. A
/// fatal storage error is logged and reported as `None` so the caller can
/// abort the ingestion task; a non-fatal logic violation is logged and the
/// event is skipped, same as a parse error.
fn apply_line(storage: &Storage, state: &mut SessionState, line: &str) -> Option<Vec<Notification>> {
    let parsed = match crate::journal::parse_line(line) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(error = %err, "skipping malformed journal line");
            return Some(vec![]);
        }
    };

    let mut importer = Importer { state, storage };
    match importer.handle(parsed.timestamp, parsed.kind) {
        Ok(notifications) => Some(notifications),
        Err(err) if err.is_fatal() => {
            tracing::error!(error = %err, "fatal storage failure; aborting ingestion");
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "skipping event after logic violation");
            Some(vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_applies_every_historical_line_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open_in_memory().unwrap();
        let state = Arc::new(Mutex::new(SessionState::new(StarSystem::new_minimal(0, String::new(), String::new()))));

        let first = dir.path().join("Journal.2024-01-01T000000.01.log");
        let second = dir.path().join("Journal.2024-02-01T000000.01.log");
        std::fs::write(
            &first,
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"StartJump","JumpType":"Hyperspace","StarSystem":"A","SystemAddress":1,"StarClass":"K"}
"#,
        )
        .unwrap();
        std::fs::write(
            &second,
            r#"{"timestamp":"2024-02-01T00:00:00Z","event":"StartJump","JumpType":"Hyperspace","StarSystem":"B","SystemAddress":2,"StarClass":"K"}
"#,
        )
        .unwrap();

        backfill(&storage, &state, dir.path());

        let guard = state.lock().unwrap();
        assert_eq!(guard.system.system_address, 2);
    }

    #[test]
    fn apply_line_reports_none_and_logs_on_fatal_storage_failure() {
        // A storage handle is not reachable from here without a closed
        // connection, so this exercises the non-fatal path (a skip keeps
        // notifications flowing) and documents the contract apply_line
        // honours: Some(_) for logic violations/parse errors, None only for
        // StateError::Storage(_) per StateErrorExt::is_fatal.
        let storage = Storage::open_in_memory().unwrap();
        let mut state = SessionState::new(StarSystem::new_minimal(1, String::new(), String::new()));

        let mismatch = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSDJump","StarSystem":"S","SystemAddress":2,"StarPos":[0.0,0.0,0.0],"FuelUsed":1.0,"FuelLevel":10.0}"#;
        assert_eq!(apply_line(&storage, &mut state, mismatch), Some(vec![]));
    }
}
