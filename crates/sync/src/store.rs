// crates/sync/src/store.rs
//! Shared, bounded, reactive table of job records.
//!
//! The store is the only shared mutable state in the subsystem. All writes
//! go through [`JobStore::insert`] / [`JobStore::apply_update`] /
//! [`JobStore::remove`]; reads are point-in-time snapshots. Mutations are
//! broadcast as [`StoreEvent`]s so any number of consumers can react
//! without polling.

use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use mediamill_types::{check_update, JobRecord, JobStatus, JobUpdate, UpdateDisposition};

/// The store keeps the 100 most recently inserted records; older ones are
/// evicted regardless of status. History beyond that is recoverable from
/// the remote service.
pub const MAX_TRACKED_JOBS: usize = 100;

/// Cap on the `recent_jobs` view of terminal records.
pub const RECENT_JOBS_WINDOW: usize = 20;

/// Change notifications broadcast to store subscribers. Carries snapshots,
/// not references — receivers may be arbitrarily slow.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Inserted { record: JobRecord },
    Updated { record: JobRecord },
    Removed { job_id: String },
}

/// Per-status record counts, for badge-style UI summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn active(&self) -> usize {
        self.pending + self.processing
    }
}

/// Outcome of [`JobStore::apply_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Fields merged; carries the post-merge snapshot.
    Applied(JobRecord),
    /// Record already terminal — idempotent no-op.
    IgnoredTerminal(JobRecord),
    /// Declared transition not in the lifecycle table — discarded.
    RejectedInvalid,
    /// No record with that id.
    Missing,
}

/// Process-wide job table, newest-first, capped at [`MAX_TRACKED_JOBS`].
pub struct JobStore {
    jobs: RwLock<Vec<JobRecord>>,
    events_tx: broadcast::Sender<StoreEvent>,
}

impl JobStore {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            jobs: RwLock::new(Vec::new()),
            events_tx,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events_tx.subscribe()
    }

    /// Add a record at the front of the table, evicting beyond the cap.
    /// Inserting an id that already exists replaces that record in place —
    /// callers are not expected to insert twice for the same id.
    pub fn insert(&self, record: JobRecord) {
        let snapshot = record.clone();
        match self.jobs.write() {
            Ok(mut jobs) => {
                if let Some(existing) = jobs.iter_mut().find(|j| j.job_id == record.job_id) {
                    *existing = record;
                } else {
                    jobs.insert(0, record);
                    jobs.truncate(MAX_TRACKED_JOBS);
                }
            }
            Err(e) => {
                tracing::error!("RwLock poisoned inserting job: {e}");
                return;
            }
        }
        self.notify(StoreEvent::Inserted { record: snapshot });
    }

    /// Merge partial fields into an existing, non-terminal record.
    ///
    /// Progress is clamped to 0–100 and never decreases while the record
    /// is non-terminal; `updated_at` is refreshed on every applied update.
    /// Updates to absent or terminal records are no-ops; updates declaring
    /// an invalid transition are discarded with a warning.
    pub fn apply_update(&self, job_id: &str, update: JobUpdate) -> ApplyOutcome {
        let outcome = {
            let mut jobs = match self.jobs.write() {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!("RwLock poisoned applying update: {e}");
                    return ApplyOutcome::Missing;
                }
            };
            let Some(record) = jobs.iter_mut().find(|j| j.job_id == job_id) else {
                return ApplyOutcome::Missing;
            };

            match check_update(record.status, update.status) {
                UpdateDisposition::Apply => {
                    merge(record, update);
                    ApplyOutcome::Applied(record.clone())
                }
                UpdateDisposition::IgnoredTerminal => {
                    ApplyOutcome::IgnoredTerminal(record.clone())
                }
                UpdateDisposition::RejectedInvalid => {
                    tracing::warn!(
                        %job_id,
                        current = %record.status,
                        incoming = ?update.status,
                        "discarding update with invalid status transition"
                    );
                    ApplyOutcome::RejectedInvalid
                }
            }
        };

        if let ApplyOutcome::Applied(record) = &outcome {
            self.notify(StoreEvent::Updated {
                record: record.clone(),
            });
        }
        outcome
    }

    /// Insert the record if unknown, otherwise merge it through the normal
    /// update path. Used by full-record reads (polls, list refreshes).
    pub fn upsert(&self, record: JobRecord) {
        let job_id = record.job_id.clone();
        if let ApplyOutcome::Missing = self.apply_update(&job_id, JobUpdate::from(record.clone())) {
            self.insert(record);
        }
    }

    /// Merge a refresh page from the remote service. Records arrive newest
    /// first; they are applied oldest-first so insertion order ends up
    /// matching the service's.
    pub fn sync_from(&self, records: Vec<JobRecord>) {
        for record in records.into_iter().rev() {
            self.upsert(record);
        }
    }

    /// Explicitly drop one record.
    pub fn remove(&self, job_id: &str) {
        let removed = match self.jobs.write() {
            Ok(mut jobs) => {
                let before = jobs.len();
                jobs.retain(|j| j.job_id != job_id);
                jobs.len() != before
            }
            Err(e) => {
                tracing::error!("RwLock poisoned removing job: {e}");
                false
            }
        };
        if removed {
            self.notify(StoreEvent::Removed {
                job_id: job_id.to_string(),
            });
        }
    }

    // ── Read views (point-in-time snapshots) ────────────────────────────

    pub fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.read(|jobs| jobs.iter().find(|j| j.job_id == job_id).cloned())
            .flatten()
    }

    /// Every tracked record, newest-first.
    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.read(|jobs| jobs.to_vec()).unwrap_or_default()
    }

    /// Non-terminal records, newest-first.
    pub fn active_jobs(&self) -> Vec<JobRecord> {
        self.read(|jobs| jobs.iter().filter(|j| !j.is_terminal()).cloned().collect())
            .unwrap_or_default()
    }

    /// Terminal records, newest-first, capped at [`RECENT_JOBS_WINDOW`].
    pub fn recent_jobs(&self) -> Vec<JobRecord> {
        self.read(|jobs| {
            jobs.iter()
                .filter(|j| j.is_terminal())
                .take(RECENT_JOBS_WINDOW)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn counts(&self) -> StatusCounts {
        self.read(|jobs| {
            let mut counts = StatusCounts::default();
            for job in jobs.iter() {
                match job.status {
                    JobStatus::Pending => counts.pending += 1,
                    JobStatus::Processing => counts.processing += 1,
                    JobStatus::Completed => counts.completed += 1,
                    JobStatus::Failed => counts.failed += 1,
                    JobStatus::Cancelled => counts.cancelled += 1,
                }
            }
            counts
        })
        .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.read(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<T>(&self, f: impl FnOnce(&Vec<JobRecord>) -> T) -> Option<T> {
        match self.jobs.read() {
            Ok(jobs) => Some(f(&jobs)),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs: {e}");
                None
            }
        }
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Field-wise merge of a partial update into a record. `job_id` is
/// immutable and never taken from the update.
fn merge(record: &mut JobRecord, update: JobUpdate) {
    if let Some(status) = update.status {
        record.status = status;
    }
    if let Some(progress) = update.progress {
        let clamped = progress.clamp(0, 100) as u8;
        // Monotonic while non-terminal; a terminal frame carries the
        // authoritative final value.
        record.progress = if record.is_terminal() {
            clamped
        } else {
            record.progress.max(clamped)
        };
    }
    if let Some(job_type) = update.job_type {
        record.job_type = job_type;
    }
    if update.message.is_some() {
        record.message = update.message;
    }
    if update.input_file.is_some() {
        record.input_file = update.input_file;
    }
    if update.output_file.is_some() {
        record.output_file = update.output_file;
    }
    if update.file_size.is_some() {
        record.file_size = update.file_size;
    }
    if update.error.is_some() {
        record.error = update.error;
    }
    if update.metadata.is_some() {
        record.metadata = update.metadata;
    }
    record.updated_at = Utc::now();
}

// =============================================================================
// Tests
// =============================================================================
