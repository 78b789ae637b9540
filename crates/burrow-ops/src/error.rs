//! Error types for batch operations.

use std::path::PathBuf;

use burrow_core::FsError;
use thiserror::Error;

use crate::operation::OperationKind;

/// Why a single batch item failed.
///
/// Item errors are absorbed by the batch: they are counted and recorded in
/// the [`Outcome`](crate::Outcome), and the next item still runs.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Cannot copy or move a directory into itself: {0}")]
    SourceIsAncestor(PathBuf),

    #[error("Source and destination are the same file: {0}")]
    SameFile(PathBuf),

    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Background task failed: {0}")]
    Task(String),

    /// The cancellation token fired while the item was in flight.
    #[error("Cancelled")]
    Cancelled,
}

impl ItemError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs(FsError::io(path, source))
    }
}

/// A malformed [`OperationRequest`](crate::OperationRequest).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{kind} requires a destination")]
    MissingDestination { kind: OperationKind },

    #[error("{kind} does not take a destination")]
    UnexpectedDestination { kind: OperationKind },

    #[error("{kind} does not take a password")]
    UnexpectedPassword { kind: OperationKind },

    #[error("{kind} requires at least one source")]
    NoSources { kind: OperationKind },

    #[error("Extract takes exactly one archive, got {count}")]
    SingleArchiveRequired { count: usize },

    #[error("{kind} is not a batch operation")]
    NotBatch { kind: OperationKind },

    #[error("Unknown operation '{0}'")]
    UnknownKind(String),
}

/// Fatal archive codec failures. Any of these aborts the whole compress or
/// extract call.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive is encrypted and no password was given: {path}")]
    PasswordRequired { path: PathBuf },

    #[error("Wrong password for archive: {path}")]
    InvalidPassword { path: PathBuf },

    #[error("Archive is corrupt or unsupported ({path}): {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Archive entry escapes the destination: {name}")]
    UnsafeEntry { name: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write archive {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Cancelled")]
    Cancelled,
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
