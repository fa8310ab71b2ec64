// Error types shared across the crate. Validation problems and remote
// failures are kept as separate enums so the UI can decide per case
// whether to reprompt, report, or give up on a single entry.

use std::path::PathBuf;

use thiserror::Error;

/// Local, pre-flight validation failures. These never involve the
/// network and are always recoverable from the menu.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The entered kind is not one of the supported tables.
    #[error("unknown kind {0:?}, choose from: links, papers")]
    UnknownKind(String),

    /// One or more required fields were absent or empty.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// Failures coming back from the remote store. Each remote call is
/// independently fallible; nothing is retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a usable response (connection refused,
    /// DNS, malformed response body, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status. `message` carries
    /// the `message` field of the JSON error body when one is present,
    /// otherwise the raw body text.
    #[error("{table}: server returned {status}: {message}")]
    Api {
        table: String,
        status: reqwest::StatusCode,
        message: String,
    },

    /// A write was accepted but the response contained no row, so there
    /// is nothing to hand back to the caller.
    #[error("{table}: server accepted the request but returned no row")]
    EmptyReply { table: String },
}

/// Umbrella error for the operations layer. The menu loop prints these
/// and returns to the menu; only startup configuration errors are fatal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A single record inside a batch failed validation. `index` is
    /// 1-based, matching the record numbering shown to the user.
    #[error("record {index}: {source}")]
    Record {
        index: usize,
        source: ValidationError,
    },

    /// A clear pass stopped early. Deletions already issued stand;
    /// `deleted` says how many.
    #[error("stopped after deleting {deleted} records: {source}")]
    ClearInterrupted { deleted: usize, source: StoreError },

    #[error("could not access {}: {source}", .path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    MalformedJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}
