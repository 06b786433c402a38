// Error taxonomy for ledger operations

use thiserror::Error;

/// Which side of the boundary a failure belongs to.
///
/// An outer transport maps these to its own status space
/// (client input -> 422, not found -> 404, server -> 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or missing mutation fields; the mutation was never attempted.
    ClientInput,
    /// A referenced task identifier did not resolve; no side effects.
    NotFound,
    /// Persistence or encoding failure; no automatic retry.
    Server,
}

/// Errors surfaced by the store, recorder, and exporter.
#[derive(Error, Debug)]
pub enum Error {
    /// Mutation input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No task exists with the given identifier.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Underlying SQLite operation failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The task write committed but the history append did not.
    ///
    /// The task mutation is already durable at this point; there is no
    /// rollback. Callers see a server error and `Tracker::unaudited_tasks`
    /// can detect the resulting gap.
    #[error("task mutation committed but history append failed: {source}")]
    AuditAppend {
        #[source]
        source: Box<Error>,
    },

    /// Event payload could not be (de)serialized.
    #[error("event serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// CSV encoding failed.
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error for the caller. Anything without an explicit
    /// client-side classification is a server error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation(_) => ErrorCategory::ClientInput,
            Error::TaskNotFound(_) => ErrorCategory::NotFound,
            Error::Store(_)
            | Error::AuditAppend { .. }
            | Error::Serialize(_)
            | Error::Csv(_)
            | Error::Io(_) => ErrorCategory::Server,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
