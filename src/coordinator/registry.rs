use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::JobAssignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InWork,
    Done,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::InWork => write!(f, "in-work"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: Uuid,
    pub command: String,
    pub status: JobStatus,
}

impl JobRecord {
    pub fn new(command: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            command,
            status: JobStatus::Pending,
        }
    }

    pub fn to_assignment(&self) -> JobAssignment {
        JobAssignment {
            id: self.id,
            command: self.command.clone(),
        }
    }
}

/// Owns the authoritative job map, the FIFO pending queue, the failed
/// list, and the in-work ownership map. Mutated only by the coordinator
/// event loop.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<Uuid, JobRecord>,
    pending: VecDeque<Uuid>,
    failed: Vec<Uuid>,
    in_work: HashMap<Uuid, u64>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create one pending job per non-empty line. Returns the number of
    /// jobs added.
    pub fn ingest_lines<I, S>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let record = JobRecord::new(line.to_string());
            self.pending.push_back(record.id);
            self.jobs.insert(record.id, record);
            added += 1;
        }
        added
    }

    /// Dequeue the oldest pending job, mark it in-work, and hand back the
    /// assignment for the given worker. FIFO: assignment order equals
    /// enqueue order.
    pub fn take_next(&mut self, worker_id: u64) -> Option<JobAssignment> {
        let id = self.pending.pop_front()?;
        let record = self
            .jobs
            .get_mut(&id)
            .expect("pending queue only holds known job ids");
        record.status = JobStatus::InWork;
        self.in_work.insert(id, worker_id);
        Some(record.to_assignment())
    }

    /// Record a successful completion. Returns false for an unknown id.
    pub fn mark_done(&mut self, id: &Uuid) -> bool {
        self.in_work.remove(id);
        match self.jobs.get_mut(id) {
            Some(record) => {
                record.status = JobStatus::Done;
                true
            }
            None => false,
        }
    }

    /// Record a failure. The job stays failed; there are no retries.
    pub fn mark_failed(&mut self, id: &Uuid) -> bool {
        self.in_work.remove(id);
        match self.jobs.get_mut(id) {
            Some(record) => {
                record.status = JobStatus::Failed;
                self.failed.push(*id);
                true
            }
            None => false,
        }
    }

    /// Drop all queued jobs. Records stay in the map; in-work jobs are
    /// unaffected.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Merge restored records, keeping only pending ones. Existing
    /// records are overwritten on id collision. Every retained id is
    /// re-queued. Returns the number of jobs queued.
    pub fn restore_merge(&mut self, records: Vec<JobRecord>) -> usize {
        let mut queued = 0;
        for record in records {
            if record.status != JobStatus::Pending {
                continue;
            }
            self.pending.push_back(record.id);
            self.jobs.insert(record.id, record);
            queued += 1;
        }
        queued
    }

    pub fn job(&self, id: &Uuid) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    /// Which worker owns an in-work job, if any.
    pub fn worker_for(&self, id: &Uuid) -> Option<u64> {
        self.in_work.get(id).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn failed_ids(&self) -> &[Uuid] {
        &self.failed
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_in_work(&self) -> bool {
        !self.in_work.is_empty()
    }

    /// Cross-check the registry's internal consistency. Used by tests;
    /// cheap enough to call after any sequence of operations.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for id in &self.pending {
            match self.jobs.get(id) {
                Some(record) if record.status == JobStatus::Pending => {}
                Some(record) => {
                    return Err(format!("queued job {id} has status {}", record.status))
                }
                None => return Err(format!("queued job {id} is not in the registry")),
            }
            if !seen.insert(*id) {
                return Err(format!("job {id} queued twice"));
            }
            if self.in_work.contains_key(id) {
                return Err(format!("job {id} is both queued and in work"));
            }
        }
        for (id, worker_id) in &self.in_work {
            match self.jobs.get(id) {
                Some(record) if record.status == JobStatus::InWork => {}
                Some(record) => {
                    return Err(format!(
                        "job {id} owned by worker {worker_id} has status {}",
                        record.status
                    ))
                }
                None => return Err(format!("in-work job {id} is not in the registry")),
            }
        }
        for record in self.jobs.values() {
            if record.status == JobStatus::InWork && !self.in_work.contains_key(&record.id) {
                return Err(format!("in-work job {} has no owning worker", record.id));
            }
        }
        for id in &self.failed {
            match self.jobs.get(id) {
                Some(record) if record.status == JobStatus::Failed => {}
                Some(record) => {
                    return Err(format!("failed-list job {id} has status {}", record.status))
                }
                None => return Err(format!("failed-list job {id} is not in the registry")),
            }
        }
        Ok(())
    }
}
