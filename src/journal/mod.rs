//! Journal ingestion: stream lines from disk, map lines to typed events.

pub mod codec;
pub mod events;
pub mod tailer;

pub use codec::{parse_line, EventKind, JournalEvent};
