//! Durable halt/resume of the job map.
//!
//! The on-disk layout is deliberately explicit so files round-trip
//! across implementations: a u32-BE entry count, then per entry a
//! 16-byte big-endian id, a u32-BE byte length plus UTF-8 command, and
//! one status tag byte (0=pending, 1=in-work, 2=done, 3=failed).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use uuid::Uuid;

use crate::coordinator::registry::{JobRecord, JobStatus};
use crate::error::{JobcastError, Result};

const TAG_PENDING: u8 = 0;
const TAG_IN_WORK: u8 = 1;
const TAG_DONE: u8 = 2;
const TAG_FAILED: u8 = 3;

fn status_tag(status: JobStatus) -> u8 {
    match status {
        JobStatus::Pending => TAG_PENDING,
        JobStatus::InWork => TAG_IN_WORK,
        JobStatus::Done => TAG_DONE,
        JobStatus::Failed => TAG_FAILED,
    }
}

fn status_from_tag(tag: u8) -> Option<JobStatus> {
    match tag {
        TAG_PENDING => Some(JobStatus::Pending),
        TAG_IN_WORK => Some(JobStatus::InWork),
        TAG_DONE => Some(JobStatus::Done),
        TAG_FAILED => Some(JobStatus::Failed),
        _ => None,
    }
}

/// Write the full job map to `path`.
pub fn save<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = &'a JobRecord>,
{
    let records: Vec<&JobRecord> = records.into_iter().collect();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_u32::<BigEndian>(records.len() as u32)?;
    for record in records {
        writer.write_all(record.id.as_bytes())?;
        let command = record.command.as_bytes();
        writer.write_u32::<BigEndian>(command.len() as u32)?;
        writer.write_all(command)?;
        writer.write_u8(status_tag(record.status))?;
    }
    writer.flush()?;

    Ok(())
}

/// Read a job map back from `path`.
pub fn load(path: &Path) -> Result<Vec<JobRecord>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let count = reader.read_u32::<BigEndian>()?;
    let mut records = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let mut id_bytes = [0u8; 16];
        reader.read_exact(&mut id_bytes)?;
        let id = Uuid::from_bytes(id_bytes);

        let len = reader.read_u32::<BigEndian>()? as usize;
        let mut command_bytes = vec![0u8; len];
        reader.read_exact(&mut command_bytes)?;
        let command = String::from_utf8(command_bytes)
            .map_err(|e| JobcastError::CorruptStateFile(format!("command for {id}: {e}")))?;

        let tag = reader.read_u8()?;
        let status = status_from_tag(tag)
            .ok_or_else(|| JobcastError::CorruptStateFile(format!("status tag {tag} for {id}")))?;

        records.push(JobRecord {
            id,
            command,
            status,
        });
    }

    Ok(records)
}
