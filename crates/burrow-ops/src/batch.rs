//! Sequential per-item batch driver shared by copy, move, delete and the
//! single-item mutations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::ItemError;
use crate::operation::{OperationError, OperationKind};
use crate::progress::{OperationEvent, Outcome, OutcomeStatus, ProgressEvent};

/// Work done for one item on the blocking pool. Returns bytes processed.
pub(crate) type ItemFn =
    Arc<dyn Fn(&Path, &CancellationToken) -> Result<u64, ItemError> + Send + Sync>;

pub(crate) fn item_fn<F>(f: F) -> ItemFn
where
    F: Fn(&Path, &CancellationToken) -> Result<u64, ItemError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run `work` over `items` strictly in order, one at a time.
///
/// The token is checked before each item. An item that reports
/// [`ItemError::Cancelled`] is counted neither as success nor failure, and
/// no later item is started. Every other error is recorded and the batch
/// moves on.
pub(crate) async fn run_items(
    kind: OperationKind,
    items: Vec<PathBuf>,
    tx: &mpsc::Sender<OperationEvent>,
    cancel: &CancellationToken,
    work: ItemFn,
) -> Outcome {
    let mut progress = ProgressEvent::new(kind, items.len());
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors = Vec::new();
    let mut status = OutcomeStatus::Completed;

    for item in items {
        if cancel.is_cancelled() {
            status = OutcomeStatus::Cancelled;
            break;
        }

        progress.set_current(Some(item.clone()));
        let _ = tx.send(OperationEvent::Progress(progress.clone())).await;

        let job = Arc::clone(&work);
        let token = cancel.clone();
        let path = item.clone();
        let result = tokio::task::spawn_blocking(move || job(&path, &token))
            .await
            .unwrap_or_else(|e| Err(ItemError::Task(e.to_string())));

        match result {
            Ok(bytes) => {
                succeeded += 1;
                progress.complete_item(bytes);
            }
            Err(ItemError::Cancelled) => {
                status = OutcomeStatus::Cancelled;
                break;
            }
            Err(err) => {
                warn!(operation = %kind, path = %item.display(), error = %err, "item failed");
                failed += 1;
                errors.push(OperationError::new(item, err.to_string()));
                progress.complete_item(0);
            }
        }

        let _ = tx.send(OperationEvent::Progress(progress.clone())).await;
    }

    Outcome {
        kind,
        status,
        succeeded,
        failed,
        bytes_processed: progress.bytes_processed,
        errors,
    }
}
