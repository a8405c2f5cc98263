use jobcast::agent::executor;
use uuid::Uuid;

#[tokio::test]
async fn test_execute_simple_command() {
    let id = Uuid::new_v4();

    let outcome = executor::execute(id, "echo hello").await;

    assert_eq!(outcome.id, id);
    assert!(outcome.success);
    assert_eq!(outcome.std_out, "hello\n");
    assert_eq!(outcome.std_err, "");
}

#[tokio::test]
async fn test_execute_failing_command() {
    let outcome = executor::execute(Uuid::new_v4(), "false").await;

    assert!(!outcome.success);
    assert_eq!(outcome.std_out, "");
    assert_eq!(outcome.std_err, "");
}

#[tokio::test]
async fn test_execute_captures_stderr() {
    let outcome = executor::execute(Uuid::new_v4(), "echo oops 1>&2").await;

    assert!(outcome.success);
    assert_eq!(outcome.std_out, "");
    assert_eq!(outcome.std_err, "oops\n");
}

#[tokio::test]
async fn test_failing_command_still_reports_output() {
    let outcome = executor::execute(Uuid::new_v4(), "echo partial; exit 3").await;

    assert!(!outcome.success);
    assert_eq!(outcome.std_out, "partial\n");
}

#[tokio::test]
async fn test_unknown_command_fails() {
    let outcome = executor::execute(Uuid::new_v4(), "definitely-not-a-real-binary-9000").await;

    assert!(!outcome.success);
    assert!(!outcome.std_err.is_empty());
}

#[tokio::test]
async fn test_shell_pipelines_work() {
    let outcome = executor::execute(Uuid::new_v4(), "printf 'a\\nb\\nc\\n' | wc -l").await;

    assert!(outcome.success);
    assert_eq!(outcome.std_out.trim(), "3");
}
