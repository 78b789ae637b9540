use std::fs;
use std::path::{Path, PathBuf};

use burrow_ops::{
    ConflictPolicy, ExecutorConfig, OperationEvent, OperationExecutor, OperationKind,
    OperationRequest, OutcomeStatus, Password, RequestError,
};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::Builder::new().prefix("burrow-ops").tempdir().unwrap()
}

fn write(path: &Path, contents: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}

#[tokio::test]
async fn test_copy_partial_failure_keeps_going() {
    let temp = temp_dir();
    let a = write(&temp.path().join("A"), "alpha");
    let missing = temp.path().join("B");
    let dest = temp.path().join("D");

    let outcome = OperationExecutor::new()
        .execute(OperationRequest::copy(vec![a.clone(), missing.clone()], &dest))
        .outcome()
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].path, missing);
    assert_eq!(fs::read_to_string(dest.join("A")).unwrap(), "alpha");
    assert!(a.exists());
    assert_eq!(outcome.summary(), "Copied 1 items, 1 failed");
}

#[tokio::test]
async fn test_progress_is_monotonic_and_ends_with_outcome() {
    let temp = temp_dir();
    let sources: Vec<PathBuf> = (0..3)
        .map(|i| write(&temp.path().join(format!("f{i}.txt")), "xx"))
        .collect();

    let mut handle =
        OperationExecutor::new().execute(OperationRequest::copy(sources, temp.path().join("out")));

    let mut last_completed = 0;
    let mut outcome = None;
    while let Some(event) = handle.next_event().await {
        match event {
            OperationEvent::Progress(progress) => {
                assert!(outcome.is_none(), "progress after outcome");
                assert!(progress.completed >= last_completed);
                assert!(progress.completed <= progress.total);
                assert_eq!(progress.total, 3);
                last_completed = progress.completed;
            }
            OperationEvent::Complete(done) => outcome = Some(done),
        }
    }

    let outcome = outcome.expect("no outcome");
    assert_eq!(last_completed, 3);
    assert!(outcome.is_success());
    assert_eq!(outcome.bytes_processed, 6);
}

#[tokio::test]
async fn test_copy_into_file_destination_is_fatal() {
    let temp = temp_dir();
    let a = write(&temp.path().join("a.txt"), "a");
    let not_dir = write(&temp.path().join("plain"), "");

    let outcome = OperationExecutor::new()
        .execute(OperationRequest::copy(vec![a], &not_dir))
        .outcome()
        .await;

    assert!(matches!(outcome.status, OutcomeStatus::Failed { .. }));
    assert_eq!(outcome.succeeded, 0);
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn test_copy_conflict_policies() {
    let temp = temp_dir();
    let source = write(&temp.path().join("src/report.txt"), "new");
    let dest = temp.path().join("dest");
    write(&dest.join("report.txt"), "old");

    let skip = OperationExecutor::new()
        .execute(OperationRequest::copy(vec![source.clone()], &dest))
        .outcome()
        .await;
    assert_eq!(skip.failed, 1);
    assert_eq!(fs::read_to_string(dest.join("report.txt")).unwrap(), "old");

    let renaming = OperationExecutor::with_config(ExecutorConfig {
        conflict_policy: ConflictPolicy::AutoRename,
        ..ExecutorConfig::default()
    });
    let renamed = renaming
        .execute(OperationRequest::copy(vec![source.clone()], &dest))
        .outcome()
        .await;
    assert!(renamed.is_success());
    assert_eq!(fs::read_to_string(dest.join("report (1).txt")).unwrap(), "new");

    let overwriting = OperationExecutor::with_config(ExecutorConfig {
        conflict_policy: ConflictPolicy::Overwrite,
        ..ExecutorConfig::default()
    });
    let overwritten = overwriting
        .execute(OperationRequest::copy(vec![source], &dest))
        .outcome()
        .await;
    assert!(overwritten.is_success());
    assert_eq!(fs::read_to_string(dest.join("report.txt")).unwrap(), "new");
}

#[tokio::test]
async fn test_move_and_delete() {
    let temp = temp_dir();
    let file = write(&temp.path().join("one.txt"), "1");
    let dir = temp.path().join("tree");
    write(&dir.join("nested/two.txt"), "22");
    let dest = temp.path().join("moved");

    let executor = OperationExecutor::new();
    let moved = executor
        .execute(OperationRequest::move_to(vec![file.clone(), dir.clone()], &dest))
        .outcome()
        .await;
    assert!(moved.is_success());
    assert_eq!(moved.succeeded, 2);
    assert!(!file.exists());
    assert!(!dir.exists());
    assert!(dest.join("tree/nested/two.txt").exists());

    let deleted = executor
        .execute(OperationRequest::delete(vec![
            dest.join("one.txt"),
            dest.join("tree"),
            dest.join("never-existed"),
        ]))
        .outcome()
        .await;
    assert_eq!(deleted.succeeded, 2);
    assert_eq!(deleted.failed, 1);
    assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
}

#[tokio::test]
async fn test_cancel_before_start_runs_nothing() {
    let temp = temp_dir();
    let sources: Vec<PathBuf> = (0..5)
        .map(|i| write(&temp.path().join(format!("f{i}")), "data"))
        .collect();

    let handle = OperationExecutor::new().execute(OperationRequest::delete(sources.clone()));
    handle.cancel();
    let outcome = handle.outcome().await;

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.succeeded + outcome.failed, 0);
    assert!(sources.iter().all(|s| s.exists()));
    assert!(outcome.summary().starts_with("Delete cancelled"));
}

#[tokio::test]
async fn test_cancelled_compress_writes_no_archive() {
    let temp = temp_dir();
    let source = write(&temp.path().join("doc.txt"), "text");
    let archive = temp.path().join("out.zip");

    let handle = OperationExecutor::new().execute(OperationRequest::compress(
        vec![source],
        &archive,
        None,
    ));
    handle.cancellation_token().cancel();
    let outcome = handle.outcome().await;

    assert!(outcome.is_cancelled());
    assert!(!archive.exists());
}

#[tokio::test]
async fn test_encrypted_round_trip() {
    let temp = temp_dir();
    let tree = temp.path().join("project");
    write(&tree.join("readme.md"), "# hello");
    write(&tree.join("src/main.rs"), "fn main() {}");
    let loose = write(&temp.path().join("notes.txt"), "remember");
    let archive = temp.path().join("bundle.zip");
    let out = temp.path().join("unpacked");

    let executor = OperationExecutor::new();
    let compressed = executor
        .execute(OperationRequest::compress(
            vec![tree, loose],
            &archive,
            Some(Password::new("s3cret")),
        ))
        .outcome()
        .await;
    assert!(compressed.is_success(), "{}", compressed.summary());
    assert_eq!(compressed.succeeded, 2);
    assert!(archive.is_file());

    let extracted = executor
        .execute(OperationRequest::extract(&archive, &out, Some("s3cret".into())))
        .outcome()
        .await;
    assert!(extracted.is_success(), "{}", extracted.summary());
    assert_eq!(
        fs::read_to_string(out.join("project/src/main.rs")).unwrap(),
        "fn main() {}"
    );
    assert_eq!(fs::read_to_string(out.join("project/readme.md")).unwrap(), "# hello");
    assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "remember");
}

#[tokio::test]
async fn test_wrong_password_is_fatal_and_writes_nothing() {
    let temp = temp_dir();
    let source = write(&temp.path().join("secret.txt"), "classified");
    let archive = temp.path().join("locked.zip");
    let out = temp.path().join("out");

    let executor = OperationExecutor::new();
    let compressed = executor
        .execute(OperationRequest::compress(
            vec![source],
            &archive,
            Some(Password::new("right")),
        ))
        .outcome()
        .await;
    assert!(compressed.is_success());

    for password in [Some(Password::new("wrong")), None] {
        let outcome = executor
            .execute(OperationRequest::extract(&archive, &out, password))
            .outcome()
            .await;
        assert!(matches!(outcome.status, OutcomeStatus::Failed { .. }));
        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.failed, 1);
        assert!(!out.exists());
    }
}

#[tokio::test]
async fn test_corrupt_archive_is_fatal() {
    let temp = temp_dir();
    let archive = write(&temp.path().join("broken.zip"), "this is not a zip file");
    let out = temp.path().join("out");

    let outcome = OperationExecutor::new()
        .execute(OperationRequest::extract(&archive, &out, None))
        .outcome()
        .await;

    match outcome.status {
        OutcomeStatus::Failed { reason } => assert!(!reason.is_empty()),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!out.exists());
}

#[tokio::test]
async fn test_single_item_mutations() {
    let temp = temp_dir();
    let executor = OperationExecutor::new();

    let file = temp.path().join("deep/new.txt");
    let created = executor.create_file(file.clone()).outcome().await;
    assert!(created.is_success());
    assert!(file.is_file());

    let dir = temp.path().join("folder");
    let made = executor.create_directory(dir.clone()).outcome().await;
    assert_eq!(made.kind, OperationKind::CreateDirectory);
    assert!(dir.is_dir());

    let renamed = executor.rename(file.clone(), "renamed.txt").outcome().await;
    assert!(renamed.is_success());
    assert!(temp.path().join("deep/renamed.txt").is_file());
    assert!(!file.exists());

    write(&temp.path().join("deep/taken.txt"), "");
    let clash = executor
        .rename(temp.path().join("deep/renamed.txt"), "taken.txt")
        .outcome()
        .await;
    assert_eq!(clash.failed, 1);
    assert!(temp.path().join("deep/renamed.txt").exists());
}

#[tokio::test]
async fn test_batches_on_one_executor_run_in_order() {
    let temp = temp_dir();
    let source = write(&temp.path().join("src.txt"), "payload");
    let dest = temp.path().join("dest");

    let executor = OperationExecutor::new();
    let copy = executor.execute(OperationRequest::copy(vec![source], &dest));
    let delete = executor.execute(OperationRequest::delete(vec![dest.join("src.txt")]));

    // The delete only succeeds if the copy finished first.
    let deleted = delete.outcome().await;
    assert!(deleted.is_success(), "{}", deleted.summary());
    assert!(copy.outcome().await.is_success());
    assert!(!dest.join("src.txt").exists());
}

#[test]
fn test_from_parts_rejects_bad_shapes() {
    let a = PathBuf::from("/a");

    assert_eq!(
        OperationRequest::from_parts(OperationKind::Copy, vec![a.clone()], None, None).unwrap_err(),
        RequestError::MissingDestination {
            kind: OperationKind::Copy
        }
    );
    assert_eq!(
        OperationRequest::from_parts(
            OperationKind::Delete,
            vec![a.clone()],
            Some("/d".into()),
            None
        )
        .unwrap_err(),
        RequestError::UnexpectedDestination {
            kind: OperationKind::Delete
        }
    );
    assert_eq!(
        OperationRequest::from_parts(
            OperationKind::Extract,
            vec![a.clone(), a.clone()],
            Some("/d".into()),
            None
        )
        .unwrap_err(),
        RequestError::SingleArchiveRequired { count: 2 }
    );

    let request = OperationRequest::from_parts(
        OperationKind::Compress,
        vec![a],
        Some("/out.zip".into()),
        Some(Password::new("pw")),
    )
    .unwrap();
    assert_eq!(request.kind(), OperationKind::Compress);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batches_keep_submission_order_on_worker_threads() {
    let temp = temp_dir();

    for round in 0..50 {
        let source = write(&temp.path().join(format!("src-{round}.txt")), "payload");
        let dest = temp.path().join(format!("dest-{round}"));

        let executor = OperationExecutor::new();
        let copy = executor.execute(OperationRequest::copy(vec![source.clone()], &dest));
        let delete = executor.execute(OperationRequest::delete(vec![
            dest.join(format!("src-{round}.txt")),
        ]));

        let (copied, deleted) = tokio::join!(copy.outcome(), delete.outcome());
        assert!(copied.is_success(), "round {round}: {}", copied.summary());
        assert!(deleted.is_success(), "round {round}: {}", deleted.summary());
        assert!(!dest.join(format!("src-{round}.txt")).exists());
    }
}

#[tokio::test]
async fn test_extract_reports_entry_total_up_front() {
    let temp = temp_dir();
    let sources = vec![
        write(&temp.path().join("one.txt"), "1"),
        write(&temp.path().join("two.txt"), "22"),
    ];
    let archive = temp.path().join("pair.zip");
    let out = temp.path().join("out");

    let executor = OperationExecutor::new();
    assert!(executor
        .execute(OperationRequest::compress(sources, &archive, None))
        .outcome()
        .await
        .is_success());

    let mut handle = executor.execute(OperationRequest::extract(&archive, &out, None));
    let mut totals = Vec::new();
    let mut outcome = None;
    while let Some(event) = handle.next_event().await {
        match event {
            OperationEvent::Progress(progress) => totals.push((progress.completed, progress.total)),
            OperationEvent::Complete(done) => outcome = Some(done),
        }
    }

    assert_eq!(totals.first(), Some(&(0, 2)));
    assert_eq!(totals.last(), Some(&(2, 2)));
    let outcome = outcome.expect("no outcome");
    assert!(outcome.is_success());
    assert_eq!(outcome.succeeded, 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_copy_permission_denied_item_fails_alone() {
    use std::os::unix::fs::PermissionsExt;

    let temp = temp_dir();
    let a = write(&temp.path().join("A"), "alpha");
    let locked_dir = temp.path().join("Bdir");
    let locked = write(&locked_dir.join("secret.bin"), "no");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root reads anything; the denial cannot be reproduced there.
    if fs::File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let dest = temp.path().join("D");
    let outcome = OperationExecutor::new()
        .execute(OperationRequest::copy(vec![a, locked_dir.clone()], &dest))
        .outcome()
        .await;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.errors[0].path, locked_dir);
    assert!(dest.join("A").exists());
    assert!(!dest.join("Bdir").exists());
}
