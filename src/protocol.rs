//! Wire messages exchanged between the coordinator and worker agents.
//!
//! Each frame carries exactly one JSON object with a single top-level key
//! naming the message kind:
//!
//! ```json
//! {"assignment": {"id": "<uuid>", "command": "<str>"}}
//! {"success":    {"id": "<uuid>", "std_out": "<str>", "std_err": "<str>"}}
//! {"failed":     {"id": "<uuid>", "std_out": "<str>", "std_err": "<str>"}}
//! ```
//!
//! Ids are written in braced dashed-hex form (`{xxxxxxxx-...}`); the
//! decoder accepts both braced and unbraced forms.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The `(id, command)` pair handed to a worker; a view of a job record
/// without its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAssignment {
    #[serde(with = "braced_uuid")]
    pub id: Uuid,
    pub command: String,
}

/// Outcome report for a finished (or refused) assignment. Output buffers
/// are carried whole; there is no streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    #[serde(with = "braced_uuid")]
    pub id: Uuid,
    pub std_out: String,
    pub std_err: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Message {
    /// Coordinator → worker: run this command.
    Assignment(JobAssignment),
    /// Worker → coordinator: subprocess exited cleanly with code zero.
    Success(JobOutcome),
    /// Worker → coordinator: subprocess failed, or the assignment was
    /// refused.
    #[serde(rename = "failed")]
    Failure(JobOutcome),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Assignment(_) => "assignment",
            Message::Success(_) => "success",
            Message::Failure(_) => "failed",
        }
    }
}

/// Encode a message for the wire. Total: the message types contain
/// nothing serde_json can reject.
pub fn encode(message: &Message) -> Vec<u8> {
    serde_json::to_vec(message).expect("wire messages always serialize")
}

/// Decode one frame. Malformed JSON and unknown top-level keys are
/// protocol errors; the caller decides whether they are survivable.
pub fn decode(data: &[u8]) -> Result<Message, ProtocolError> {
    Ok(serde_json::from_slice(data)?)
}

mod braced_uuid {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&id.braced())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let text = String::deserialize(deserializer)?;
        Uuid::parse_str(&text).map_err(serde::de::Error::custom)
    }
}
