// crates/types/src/lifecycle.rs
//! Job lifecycle rules: which status transitions are valid and how an
//! inbound update should be treated.
//!
//! Pure functions, no I/O. Consulted by the store before merging and by the
//! subscription manager before touching the store.

use crate::job::JobStatus;

/// What to do with an inbound update, given the record's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDisposition {
    /// Merge the update into the record.
    Apply,
    /// The record is already terminal — drop the update silently
    /// (idempotent no-op, not an error).
    IgnoredTerminal,
    /// The declared transition is not in the lifecycle table — drop the
    /// update and keep the previous state. Callers log this at warn level.
    RejectedInvalid,
}

/// `pending → processing → {completed | failed | cancelled}`, with the
/// direct `pending → terminal` skip permitted because the service may
/// finish a job faster than the client observes the intermediate state.
/// Repeating the current status is valid — coalesced streams redeliver it.
pub fn is_valid_transition(from: JobStatus, to: JobStatus) -> bool {
    if from == to {
        return true;
    }
    match from {
        JobStatus::Pending => true,
        JobStatus::Processing => to != JobStatus::Pending,
        // Terminal states are absorbing.
        JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => false,
    }
}

/// Classify an update against the current status. `incoming` is `None`
/// when the frame carried no status change, which is always applicable to
/// a non-terminal record.
pub fn check_update(current: JobStatus, incoming: Option<JobStatus>) -> UpdateDisposition {
    if current.is_terminal() {
        return UpdateDisposition::IgnoredTerminal;
    }
    match incoming {
        None => UpdateDisposition::Apply,
        Some(next) if is_valid_transition(current, next) => UpdateDisposition::Apply,
        Some(_) => UpdateDisposition::RejectedInvalid,
    }
}
