//! Rollback behaviour against a simulated host

mod helpers;

use deployer::core::DeployError;
use deployer::execution::ExecutionEngine;
use deployer::release::RollbackTarget;
use helpers::*;

const A: &str = "20240101000000";
const B: &str = "20240201000000";
const C: &str = "20240301000000";

fn version(id: &str) -> RollbackTarget {
    RollbackTarget::Version(id.to_string())
}

#[tokio::test]
async fn test_implicit_rollback_to_previous() {
    let executor = MockExecutor::with_releases(&[A, B, C]);
    let engine = ExecutionEngine::new(&executor);

    let report = engine.rollback(&config(), &RollbackTarget::Previous).await.unwrap();

    assert_eq!(report.target.as_str(), B);
    assert_eq!(report.displaced.as_str(), C);
    assert!(report.archived_as.starts_with("20240301000000_rollback_"));

    let tree = executor.tree();
    assert_eq!(tree.current.as_deref(), Some(B));
    assert!(tree.entries.contains(A));
    assert!(tree.entries.contains(B));
    assert!(!tree.entries.contains(C));
    assert!(tree.entries.contains(&report.archived_as));
    assert!(tree.lock.is_none());
}

#[tokio::test]
async fn test_explicit_rollback_archives_newest() {
    let executor = MockExecutor::with_releases(&[A, B, C]);
    let engine = ExecutionEngine::new(&executor);

    let report = engine.rollback(&config(), &version(A)).await.unwrap();

    assert_eq!(report.target.as_str(), A);
    assert_eq!(report.displaced.as_str(), C);
    let tree = executor.tree();
    assert_eq!(tree.current.as_deref(), Some(A));
    assert!(tree.entries.contains(B));
    assert!(!tree.entries.contains(C));
}

#[tokio::test]
async fn test_archived_release_is_no_longer_listed() {
    let executor = MockExecutor::with_releases(&[A, B, C]);
    let engine = ExecutionEngine::new(&executor);

    engine.rollback(&config(), &RollbackTarget::Previous).await.unwrap();
    let second = engine.rollback(&config(), &RollbackTarget::Previous).await.unwrap();

    assert_eq!(second.target.as_str(), A);
    assert_eq!(second.displaced.as_str(), B);
}

#[tokio::test]
async fn test_unknown_version_changes_nothing() {
    let executor = MockExecutor::with_releases(&[A, B, C]);
    let engine = ExecutionEngine::new(&executor);

    let err = engine.rollback(&config(), &version("Z")).await.unwrap_err();

    assert!(matches!(err, DeployError::UnknownVersion(ref v) if v == "Z"));
    assert!(!executor.ran(".current.tmp"));
    assert_eq!(executor.tree().current.as_deref(), Some(C));
    assert!(executor.tree().lock.is_none());
}

#[tokio::test]
async fn test_insufficient_history() {
    for releases in [vec![], vec![A]] {
        let executor = MockExecutor::with_releases(&releases);
        let engine = ExecutionEngine::new(&executor);

        let err = engine.rollback(&config(), &RollbackTarget::Previous).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::InsufficientHistory { found } if found == releases.len()
        ));
        assert!(!executor.ran(".current.tmp"));
    }
}

#[tokio::test]
async fn test_rollback_to_newest_is_refused() {
    let executor = MockExecutor::with_releases(&[A, B, C]);
    let engine = ExecutionEngine::new(&executor);

    let err = engine.rollback(&config(), &version(C)).await.unwrap_err();

    assert!(matches!(err, DeployError::NothingToRollBack(_)));
    assert_eq!(executor.tree().entries.len(), 3);
}

#[tokio::test]
async fn test_restart_failure_stops_before_archive() {
    let executor = MockExecutor::with_releases(&[A, B, C]).fail_on("systemctl restart app");
    let engine = ExecutionEngine::new(&executor);

    let err = engine
        .rollback(&config_with("restart_command: \"systemctl restart app\""), &RollbackTarget::Previous)
        .await
        .unwrap_err();

    assert_eq!(err.task_name(), Some("Restart"));
    let tree = executor.tree();
    // current already moved; nothing is undone
    assert_eq!(tree.current.as_deref(), Some(B));
    assert!(tree.entries.contains(C));
    assert!(tree.lock.is_none());
}

#[tokio::test]
async fn test_rollback_skips_after_deploy_hooks() {
    let executor = MockExecutor::with_releases(&[A, B]);
    let engine = ExecutionEngine::new(&executor);

    engine
        .rollback(
            &config_with("restart_command: \"systemctl restart app\"\nafter_deploy: [\"php artisan cache:clear\"]"),
            &RollbackTarget::Previous,
        )
        .await
        .unwrap();

    assert!(executor.ran("systemctl restart app"));
    assert!(!executor.ran("cache:clear"));
}

#[tokio::test]
async fn test_rollback_respects_lock() {
    let executor = MockExecutor::with_releases(&[A, B]).locked_by("bob");
    let engine = ExecutionEngine::new(&executor);

    let err = engine.rollback(&config(), &RollbackTarget::Previous).await.unwrap_err();

    assert!(matches!(err, DeployError::Locked { .. }));
    assert_eq!(executor.tree().current.as_deref(), Some(B));
}

#[tokio::test]
async fn test_rollback_never_creates_directories() {
    let executor = MockExecutor::with_releases(&[A, B, C]);
    let engine = ExecutionEngine::new(&executor);

    engine.rollback(&config(), &RollbackTarget::Previous).await.unwrap();

    assert!(!executor.ran("mkdir -p"));
}
