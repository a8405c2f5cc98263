//! Worker agent: the process launched on remote hosts.
//!
//! Connects back to the coordinator, holds at most one assignment at a
//! time, supervises the subprocess for it, and reports the outcome. The
//! run loop keeps reading frames while a job runs so a double assignment
//! is refused immediately instead of queueing behind the subprocess.

pub mod executor;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::{JobcastError, Result};
use crate::protocol::{self, JobOutcome, Message};
use crate::transport;

use executor::ExecutionOutcome;

/// Run the agent until the coordinator hangs up.
///
/// Connection loss is a clean exit. A message the coordinator should
/// never send (or a frame we cannot decode) is fatal: the coordinator is
/// confused and there is nothing useful left to do.
pub async fn run(config: AgentConfig) -> Result<()> {
    tracing::info!(url = %config.url, "Connecting to coordinator");
    let framed = transport::connect(&config.url).await?;
    tracing::info!("Connected");

    let (mut sink, mut stream) = framed.split();
    let (done_tx, mut done_rx) = mpsc::channel::<ExecutionOutcome>(1);
    let mut current: Option<Uuid> = None;

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(bytes)) => {
                        if let Some(reply) = handle_frame(&bytes, &mut current, &done_tx)? {
                            sink.send(Bytes::from(protocol::encode(&reply))).await?;
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        tracing::info!("Connection closed");
                        return Ok(());
                    }
                }
            }
            Some(outcome) = done_rx.recv() => {
                current = None;
                let report = JobOutcome {
                    id: outcome.id,
                    std_out: outcome.std_out,
                    std_err: outcome.std_err,
                };
                let message = if outcome.success {
                    Message::Success(report)
                } else {
                    Message::Failure(report)
                };
                sink.send(Bytes::from(protocol::encode(&message))).await?;
            }
        }
    }
}

fn handle_frame(
    bytes: &[u8],
    current: &mut Option<Uuid>,
    done_tx: &mpsc::Sender<ExecutionOutcome>,
) -> Result<Option<Message>> {
    let message = match protocol::decode(bytes) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, "Undecodable frame from coordinator, bailing");
            return Err(e.into());
        }
    };

    match message {
        Message::Assignment(assignment) => {
            if current.is_some() {
                tracing::error!(id = %assignment.id, "Assignment while busy, refusing");
                return Ok(Some(Message::Failure(JobOutcome {
                    id: assignment.id,
                    std_out: "Already have assignment!".to_string(),
                    std_err: String::new(),
                })));
            }

            tracing::info!(id = %assignment.id, "New job");
            *current = Some(assignment.id);
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let outcome = executor::execute(assignment.id, &assignment.command).await;
                let _ = done_tx.send(outcome).await;
            });
            Ok(None)
        }
        other => {
            tracing::error!(kind = other.kind(), "Confusing message from coordinator");
            Err(JobcastError::Fatal(format!(
                "unexpected {} message",
                other.kind()
            )))
        }
    }
}
