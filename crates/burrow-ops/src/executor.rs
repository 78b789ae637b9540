//! Background executor for batch requests and single-item mutations.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::archive::{ArchiveCodec, ArchiveProgress};
use crate::batch::{item_fn, run_items};
use crate::conflict::ConflictPolicy;
use crate::error::ArchiveError;
use crate::operation::{OperationKind, OperationRequest, Password};
use crate::progress::{OperationEvent, Outcome, OutcomeStatus, ProgressEvent};
use crate::{copy, create, delete, move_op, rename, DEFAULT_CHANNEL_CAPACITY};

/// Default chunk size for file copies, and the cancellation granularity
/// inside a single large file.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 1024 * 1024;

/// Executor settings.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ExecutorConfig {
    /// What copy and move do when the target exists.
    pub conflict_policy: ConflictPolicy,

    /// Capacity of each batch's event channel.
    pub channel_capacity: usize,

    /// Chunk size for file copies.
    pub copy_buffer_size: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
        }
    }
}

impl ExecutorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == Some(0) {
            return Err("Channel capacity must be at least 1".to_string());
        }
        if self.copy_buffer_size == Some(0) {
            return Err("Copy buffer size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ExecutorConfig {
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }
}

/// The caller's side of one running batch.
#[derive(Debug)]
pub struct OperationHandle {
    kind: OperationKind,
    events: mpsc::Receiver<OperationEvent>,
    cancel: CancellationToken,
}

impl OperationHandle {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Ask the batch to stop. Items already finished stay finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this batch, e.g. for a signal handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next event, or `None` once the terminal outcome has been received.
    pub async fn next_event(&mut self) -> Option<OperationEvent> {
        self.events.recv().await
    }

    /// Skip remaining progress and wait for the outcome.
    pub async fn outcome(mut self) -> Outcome {
        while let Some(event) = self.events.recv().await {
            if let OperationEvent::Complete(outcome) = event {
                return outcome;
            }
        }
        Outcome::fatal(self.kind, 1, "Operation task ended without an outcome")
    }
}

/// Runs batches off the caller's task, one at a time per executor.
///
/// Every request gets its own event channel and cancellation token. Batches
/// on one executor start in the order they were submitted, each after the
/// previous one has sent its outcome; use separate executors for parallel
/// batches.
#[derive(Debug, Clone, Default)]
pub struct OperationExecutor {
    config: ExecutorConfig,
    /// Completion signal of the most recently submitted batch.
    tail: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
}

impl OperationExecutor {
    /// Create a new executor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            tail: Arc::default(),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Start a batch. Must be called from within a tokio runtime.
    pub fn execute(&self, request: OperationRequest) -> OperationHandle {
        let kind = request.kind();
        self.spawn(kind, move |config, tx, cancel| async move {
            run_request(request, &config, &tx, &cancel).await
        })
    }

    /// Rename a single entry within its directory.
    pub fn rename(&self, source: PathBuf, new_name: impl Into<String>) -> OperationHandle {
        let new_name = new_name.into();
        self.spawn(OperationKind::Rename, move |_, tx, cancel| async move {
            let work = item_fn(move |source, _| rename::rename_item(source, &new_name).map(|_| 0));
            run_items(OperationKind::Rename, vec![source], &tx, &cancel, work).await
        })
    }

    /// Create an empty file.
    pub fn create_file(&self, path: PathBuf) -> OperationHandle {
        self.spawn(OperationKind::CreateFile, move |_, tx, cancel| async move {
            let work = item_fn(|path, _| create::create_file(path));
            run_items(OperationKind::CreateFile, vec![path], &tx, &cancel, work).await
        })
    }

    /// Create a directory.
    pub fn create_directory(&self, path: PathBuf) -> OperationHandle {
        self.spawn(OperationKind::CreateDirectory, move |_, tx, cancel| async move {
            let work = item_fn(|path, _| create::create_directory(path));
            run_items(OperationKind::CreateDirectory, vec![path], &tx, &cancel, work).await
        })
    }

    fn spawn<F, Fut>(&self, kind: OperationKind, job: F) -> OperationHandle
    where
        F: FnOnce(ExecutorConfig, mpsc::Sender<OperationEvent>, CancellationToken) -> Fut
            + Send
            + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let (tx, events) = mpsc::channel(self.config.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let config = self.config.clone();
        let token = cancel.clone();

        // Queue position is taken here, on the caller's side, not in the task.
        let (done_tx, done_rx) = oneshot::channel();
        let previous = self
            .tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(done_rx);

        tokio::spawn(async move {
            if let Some(previous) = previous {
                // Err means the previous batch's task is gone; go ahead.
                let _ = previous.await;
            }
            info!(operation = %kind, "batch started");

            let outcome = job(config, tx.clone(), token).await;

            match &outcome.status {
                OutcomeStatus::Failed { reason } => {
                    error!(operation = %kind, %reason, "batch failed");
                }
                _ => info!(
                    operation = %kind,
                    succeeded = outcome.succeeded,
                    failed = outcome.failed,
                    cancelled = outcome.is_cancelled(),
                    "batch finished"
                ),
            }
            let _ = tx.send(OperationEvent::Complete(outcome)).await;
            let _ = done_tx.send(());
        });

        OperationHandle {
            kind,
            events,
            cancel,
        }
    }
}

async fn run_request(
    request: OperationRequest,
    config: &ExecutorConfig,
    tx: &mpsc::Sender<OperationEvent>,
    cancel: &CancellationToken,
) -> Outcome {
    let kind = request.kind();
    if let Err(err) = request.validate() {
        return Outcome::fatal(kind, request.item_count(), err.to_string());
    }

    match request {
        OperationRequest::Copy {
            sources,
            destination,
        } => copy::run(sources, destination, config, tx, cancel).await,
        OperationRequest::Move {
            sources,
            destination,
        } => move_op::run(sources, destination, config, tx, cancel).await,
        OperationRequest::Delete { targets } => delete::run(targets, tx, cancel).await,
        OperationRequest::Compress {
            sources,
            archive,
            password,
        } => run_compress(sources, archive, password, tx, cancel).await,
        OperationRequest::Extract {
            archive,
            destination,
            password,
        } => run_extract(archive, destination, password, tx, cancel).await,
    }
}

/// Compress counts top-level sources: all of them succeed or none do.
async fn run_compress(
    sources: Vec<PathBuf>,
    archive: PathBuf,
    password: Option<Password>,
    tx: &mpsc::Sender<OperationEvent>,
    cancel: &CancellationToken,
) -> Outcome {
    let kind = OperationKind::Compress;
    let total = sources.len();
    let mut progress = ProgressEvent::new(kind, total);
    progress.set_current(sources.first().cloned());
    let _ = tx.send(OperationEvent::Progress(progress)).await;

    let progress_tx = tx.clone();
    let token = cancel.clone();
    let result = tokio::task::spawn_blocking(move || {
        let password = password.as_ref().map(Password::expose);
        ArchiveCodec::new().write(&archive, &sources, password, &token, |step| {
            let _ = progress_tx.blocking_send(OperationEvent::Progress(archive_progress(kind, step)));
        })
    })
    .await;

    archive_outcome(kind, total, result)
}

/// Extract counts archive entries on success; a failure is one fatal item.
async fn run_extract(
    archive: PathBuf,
    destination: PathBuf,
    password: Option<Password>,
    tx: &mpsc::Sender<OperationEvent>,
    cancel: &CancellationToken,
) -> Outcome {
    let kind = OperationKind::Extract;
    let progress_tx = tx.clone();
    let token = cancel.clone();
    let result = tokio::task::spawn_blocking(move || {
        let total = ArchiveCodec::entry_count(&archive).unwrap_or(0);
        let mut progress = ProgressEvent::new(kind, total);
        progress.set_current(Some(archive.clone()));
        let _ = progress_tx.blocking_send(OperationEvent::Progress(progress));

        let password = password.as_ref().map(Password::expose);
        let result = ArchiveCodec::new().read(&archive, &destination, password, &token, |step| {
            let _ = progress_tx.blocking_send(OperationEvent::Progress(archive_progress(kind, step)));
        });
        (total, result)
    })
    .await;

    match result {
        Ok((total, result)) => archive_outcome(kind, total, Ok(result)),
        Err(err) => archive_outcome(kind, 1, Err(err)),
    }
}

fn archive_progress(kind: OperationKind, step: ArchiveProgress<'_>) -> ProgressEvent {
    let mut progress = ProgressEvent::new(kind, step.total);
    progress.completed = step.completed;
    progress.bytes_processed = step.bytes;
    progress.set_current(Some(step.path.to_path_buf()));
    progress
}

fn archive_outcome(
    kind: OperationKind,
    items: usize,
    result: Result<Result<u64, ArchiveError>, tokio::task::JoinError>,
) -> Outcome {
    match result {
        Ok(Ok(bytes)) => Outcome {
            kind,
            status: OutcomeStatus::Completed,
            succeeded: items,
            failed: 0,
            bytes_processed: bytes,
            errors: Vec::new(),
        },
        Ok(Err(ArchiveError::Cancelled)) => Outcome {
            kind,
            status: OutcomeStatus::Cancelled,
            succeeded: 0,
            failed: 0,
            bytes_processed: 0,
            errors: Vec::new(),
        },
        Ok(Err(err)) => Outcome::fatal(kind, 1, err.to_string()),
        Err(err) => Outcome::fatal(kind, 1, format!("Background task failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.conflict_policy, ConflictPolicy::Skip);
        assert_eq!(config.channel_capacity, 100);
        assert_eq!(config.copy_buffer_size, 1024 * 1024);
    }

    #[test]
    fn test_config_builder() {
        let config = ExecutorConfig::builder()
            .conflict_policy(ConflictPolicy::AutoRename)
            .copy_buffer_size(4096usize)
            .build()
            .unwrap();
        assert_eq!(config.conflict_policy, ConflictPolicy::AutoRename);
        assert_eq!(config.copy_buffer_size, 4096);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);

        assert!(ExecutorConfig::builder().channel_capacity(0usize).build().is_err());
    }

    #[tokio::test]
    async fn test_invalid_request_fails_fatally() {
        let executor = OperationExecutor::new();
        let outcome = executor
            .execute(OperationRequest::compress(Vec::new(), "/tmp/x.zip", None))
            .outcome()
            .await;

        assert!(matches!(outcome.status, OutcomeStatus::Failed { .. }));
        assert_eq!(outcome.succeeded, 0);
    }

    #[tokio::test]
    async fn test_empty_copy_completes_immediately() {
        let temp = tempfile::Builder::new().prefix("burrow-exec").tempdir().unwrap();
        let outcome = OperationExecutor::new()
            .execute(OperationRequest::copy(Vec::new(), temp.path()))
            .outcome()
            .await;
        assert!(outcome.is_success());
        assert_eq!(outcome.summary(), "Copied 0 items");
    }
}
