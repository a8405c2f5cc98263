use std::process::Stdio;

use tokio::process::Command;
use uuid::Uuid;

/// What running one assignment produced. Output buffers are complete;
/// nothing is streamed while the job runs.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub id: Uuid,
    pub success: bool,
    pub std_out: String,
    pub std_err: String,
}

/// Run `command` under the POSIX shell and capture everything.
///
/// Success means the subprocess exited normally with code zero. A spawn
/// failure is reported as a job failure with the error text on stderr.
pub async fn execute(id: Uuid, command: &str) -> ExecutionOutcome {
    tracing::info!(id = %id, command, "Launching /bin/sh -c");

    let result = Command::new("/bin/sh")
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(output) => {
            let success = output.status.success();
            tracing::info!(id = %id, success, exit_code = ?output.status.code(), "Job finished");
            ExecutionOutcome {
                id,
                success,
                std_out: String::from_utf8_lossy(&output.stdout).to_string(),
                std_err: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Unable to spawn shell");
            ExecutionOutcome {
                id,
                success: false,
                std_out: String::new(),
                std_err: e.to_string(),
            }
        }
    }
}
