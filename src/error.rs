//! Domain error types. Storage/codec/state errors are typed via `thiserror`;
//! `anyhow` is reserved for the CLI boundary in `main.rs`.

use crate::model::BodyId;

/// Failure modes for a single line of the journal: malformed JSON, or a
/// recognised event tag whose fields don't coerce to the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed json near offset {offset}: ...{excerpt}...")]
    MalformedJson { offset: usize, excerpt: String },

    #[error("event `{tag}` recognised but fields could not be coerced: {source}")]
    SchemaMismatch {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage-layer failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sql error for `{query}`: {message}")]
    BadMessage { query: String, message: String },

    #[error("io error opening store: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Wraps a `rusqlite` failure with the query text that produced it, so
    /// the log line names both the statement and the engine's message.
    pub fn bad_message(query: &str, err: rusqlite::Error) -> Self {
        StorageError::BadMessage { query: query.to_string(), message: err.to_string() }
    }
}

/// Logic violations the state machine detects while applying an event:
/// these are logged and the event is skipped, except where named otherwise.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("FSDJump system_address {event} does not match current system {current}")]
    SystemAddressMismatch { current: u64, event: u64 },

    #[error("ring body lookup failed for parent body {0}: system not yet scanned")]
    RingParentNotFound(BodyId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
