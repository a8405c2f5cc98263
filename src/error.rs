use thiserror::Error;

use crate::protocol::ProtocolError;

#[derive(Error, Debug)]
pub enum JobcastError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid transport url: {0}")]
    BadUrl(String),

    #[error("state file is corrupt: {0}")]
    CorruptStateFile(String),

    #[error("coordinator sent an unrecoverable message: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, JobcastError>;
