//! Remote worker launch over ssh.
//!
//! Fire-and-forget: the launch command is spawned in the background and
//! its outcome only logged. A successful launch does not mean the worker
//! will ever connect back.

use tokio::process::Command;

const SSH_PATH: &str = "/usr/bin/ssh";

/// The url a launched worker should dial back to.
pub fn callback_url(port: u16) -> String {
    let host = sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_string());
    format!("tcp://{host}:{port}")
}

/// Build the remote-login invocation: ssh in background-detach mode with
/// password prompts disabled, running the worker executable detached on
/// the far side.
pub fn remote_command(host: &str, exe_path: &str, url: &str) -> (String, Vec<String>) {
    let args = vec![
        "-o".to_string(),
        "PasswordAuthentication=no".to_string(),
        "-f".to_string(),
        host.to_string(),
        format!("nohup {exe_path} -c {url} &"),
    ];
    (SSH_PATH.to_string(), args)
}

/// Launch a worker agent on `host`, dialing back to this coordinator.
pub fn launch(host: String, exe_path: String, port: u16) {
    let url = callback_url(port);
    let (program, args) = remote_command(&host, &exe_path, &url);

    tracing::info!(host = %host, url = %url, "Launching remote worker: {program} {}", args.join(" "));

    tokio::spawn(async move {
        match Command::new(&program).args(&args).output().await {
            Ok(output) if output.status.success() => {
                tracing::info!(host = %host, "Remote worker launched");
            }
            Ok(output) => {
                tracing::error!(
                    host = %host,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "Unable to launch remote worker"
                );
            }
            Err(e) => {
                tracing::error!(host = %host, error = %e, "Unable to run {program}");
            }
        }
    });
}
