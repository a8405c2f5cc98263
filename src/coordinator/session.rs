//! Coordinator-side state for one worker connection.
//!
//! The session is a plain state machine driven by the coordinator event
//! loop; the socket itself lives in per-connection reader/writer tasks.
//! A session holds at most one outstanding assignment, so an in-work job
//! always has exactly one owner.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::protocol::{JobAssignment, JobOutcome, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Assigned,
    Closed,
}

/// What a session hands back to the coordinator after digesting an
/// inbound message or a disconnect.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    Success {
        id: Uuid,
        std_out: String,
        std_err: String,
        elapsed_secs: f64,
    },
    Failure {
        id: Uuid,
        std_out: String,
        std_err: String,
    },
}

#[derive(Debug)]
pub struct WorkerSession {
    worker_id: u64,
    remote_label: String,
    state: SessionState,
    current: Option<JobAssignment>,
    started_at: Option<DateTime<Utc>>,
    outbound: mpsc::UnboundedSender<Message>,
    cancel: CancellationToken,
}

impl WorkerSession {
    pub fn new(
        worker_id: u64,
        remote_label: String,
        outbound: mpsc::UnboundedSender<Message>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            worker_id,
            remote_label,
            state: SessionState::Idle,
            current: None,
            started_at: None,
            outbound,
            cancel,
        }
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub fn remote_label(&self) -> &str {
        &self.remote_label
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn has_assignment(&self) -> bool {
        self.current.is_some()
    }

    pub fn assignment_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|a| a.id)
    }

    /// Hand the worker a job and push the wire message. Only valid while
    /// idle; returns false otherwise.
    pub fn assign(&mut self, assignment: JobAssignment) -> bool {
        if self.state != SessionState::Idle {
            tracing::warn!(
                worker_id = self.worker_id,
                "refusing to assign to a non-idle session"
            );
            return false;
        }

        let message = Message::Assignment(assignment.clone());
        self.current = Some(assignment);
        self.started_at = Some(Utc::now());
        self.state = SessionState::Assigned;

        if self.outbound.send(message).is_err() {
            // Writer is gone; the disconnect event is already on its way
            // and will fail the job.
            tracing::debug!(worker_id = self.worker_id, "outbound channel closed");
        }
        true
    }

    /// Digest one decoded message from this worker. Protocol violations
    /// are logged and ignored; the connection stays up for the operator
    /// to deal with.
    pub fn on_message(&mut self, message: Message) -> Option<SessionReply> {
        if self.state == SessionState::Closed {
            tracing::warn!(
                worker_id = self.worker_id,
                kind = message.kind(),
                "message on a closed session"
            );
            return None;
        }

        match message {
            Message::Assignment(_) => {
                tracing::error!(worker_id = self.worker_id, "confusing message from worker");
                None
            }
            Message::Success(outcome) => {
                let outcome = self.accept_outcome(outcome)?;
                let elapsed_secs = self.elapsed_secs();
                self.finish();
                Some(SessionReply::Success {
                    id: outcome.id,
                    std_out: outcome.std_out,
                    std_err: outcome.std_err,
                    elapsed_secs,
                })
            }
            Message::Failure(outcome) => {
                let outcome = self.accept_outcome(outcome)?;
                self.finish();
                Some(SessionReply::Failure {
                    id: outcome.id,
                    std_out: outcome.std_out,
                    std_err: outcome.std_err,
                })
            }
        }
    }

    /// Transport closed. If a job was in flight, synthesize its failure.
    pub fn on_disconnected(&mut self) -> Option<SessionReply> {
        self.state = SessionState::Closed;
        self.started_at = None;
        self.current.take().map(|assignment| SessionReply::Failure {
            id: assignment.id,
            std_out: "Connection closed".to_string(),
            std_err: String::new(),
        })
    }

    /// Close this worker's connection. The reader task observes the
    /// cancellation and the ordinary disconnect path runs.
    pub fn kill(&self) {
        self.cancel.cancel();
    }

    /// One console line for `status` / `worker list`.
    pub fn status_line(&self) -> String {
        let state = match &self.current {
            Some(assignment) => assignment.id.braced().to_string(),
            None => "idle".to_string(),
        };
        format!("- {} {} : {}", self.worker_id, self.remote_label, state)
    }

    fn accept_outcome(&mut self, outcome: JobOutcome) -> Option<JobOutcome> {
        match &self.current {
            Some(assignment) if assignment.id == outcome.id => Some(outcome),
            Some(assignment) => {
                tracing::error!(
                    worker_id = self.worker_id,
                    expected = %assignment.id,
                    got = %outcome.id,
                    "outcome for a job this worker does not hold"
                );
                None
            }
            None => {
                tracing::error!(
                    worker_id = self.worker_id,
                    id = %outcome.id,
                    "outcome from an idle worker"
                );
                None
            }
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started_at
            .map(|start| (Utc::now() - start).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    fn finish(&mut self) {
        self.current = None;
        self.started_at = None;
        self.state = SessionState::Idle;
    }
}
