#![cfg(unix)]

use service_migrator::executor::{CommandExecutor, CommandSpec, ExecutorError, ShellExecutor};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn executor() -> ShellExecutor {
    ShellExecutor::new(Duration::from_secs(10))
}

#[tokio::test]
async fn test_captures_stdout() {
    let spec = CommandSpec::parse("echo hello migrator").unwrap();
    let output = executor()
        .execute(&spec, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output.exit_code, 0);
    assert_eq!(output.stdout.trim(), "hello migrator");
}

#[tokio::test]
async fn test_non_zero_exit_is_an_error() {
    let spec = CommandSpec::parse("sh -c 'echo nope >&2; exit 3'").unwrap();
    let err = executor()
        .execute(&spec, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        ExecutorError::Failed {
            exit_code, stderr, ..
        } => {
            assert_eq!(exit_code, 3);
            assert_eq!(stderr, "nope");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_program() {
    let spec = CommandSpec::new("definitely-not-a-real-program-7c2a");
    let err = executor()
        .execute(&spec, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::ProgramNotFound { .. }));
}

#[tokio::test]
async fn test_timeout_kills_the_command() {
    let spec = CommandSpec::new("sleep").arg("30");
    let started = Instant::now();
    let err = ShellExecutor::new(Duration::from_millis(200))
        .execute(&spec, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_cancellation_stops_the_command() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let spec = CommandSpec::new("sleep").arg("30");
    let err = executor().execute(&spec, &cancel).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Cancelled { .. }));
}

#[tokio::test]
async fn test_stdin_and_stdout_files() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.sql");
    let output = dir.path().join("out.sql");
    std::fs::write(&input, "INSERT INTO t VALUES (1);\n").unwrap();

    let spec = CommandSpec::new("cat").stdin_from(&input).stdout_to(&output);
    let result = executor()
        .execute(&spec, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.stdout.is_empty());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "INSERT INTO t VALUES (1);\n"
    );
}

#[tokio::test]
async fn test_environment_is_passed() {
    let spec = CommandSpec::parse("sh -c 'echo $BOSH_ENVIRONMENT'")
        .unwrap()
        .envs(vec![(
            "BOSH_ENVIRONMENT".to_string(),
            "https://10.0.0.5:25555".to_string(),
        )]);
    let output = executor()
        .execute(&spec, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output.stdout.trim(), "https://10.0.0.5:25555");
}
