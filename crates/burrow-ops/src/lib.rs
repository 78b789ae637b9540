//! Batch file operations for burrow.
//!
//! Requests (copy, move, delete, compress, extract) run on a background task
//! and report [`ProgressEvent`]s followed by exactly one [`Outcome`] over a
//! per-batch channel. Batches on one [`OperationExecutor`] never overlap.
//! Every batch can be cancelled through its [`OperationHandle`]; items that
//! already finished stay finished.

mod archive;
mod batch;
mod conflict;
mod copy;
mod create;
mod delete;
mod error;
mod executor;
mod move_op;
mod operation;
mod progress;
mod rename;

pub use archive::{ArchiveCodec, ArchiveProgress, DEFAULT_COMPRESSION_LEVEL};
pub use conflict::{auto_rename_path, ConflictPolicy};
pub use error::{ArchiveError, ItemError, RequestError};
pub use executor::{
    ExecutorConfig, ExecutorConfigBuilder, OperationExecutor, OperationHandle,
    DEFAULT_COPY_BUFFER_SIZE,
};
pub use operation::{OperationError, OperationKind, OperationRequest, Password};
pub use progress::{OperationEvent, Outcome, OutcomeStatus, ProgressEvent};
pub use rename::validate_filename;

/// Default capacity of a batch's event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
