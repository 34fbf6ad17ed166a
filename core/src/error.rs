use crate::types::{AllocationId, PersonId, ScheduleId};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RotaError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Person '{person_id}' is not eligible for allocation: {reason}")]
    IneligibleRole { person_id: PersonId, reason: String },

    #[error("LATE shift on {date} has no titular holding '{qualification}'")]
    CoverageViolation { date: NaiveDate, qualification: String },

    #[error("No eligible candidate for {kind} on {date}")]
    QueueExhausted { date: NaiveDate, kind: String },

    #[error("Person '{person_id}' is already allocated on {date}")]
    DuplicateAssignment { person_id: PersonId, date: NaiveDate },

    #[error("Invalid date '{value}'")]
    InvalidDate { value: String },

    #[error("Schedule '{schedule_id}' not found")]
    ScheduleNotFound { schedule_id: ScheduleId },

    #[error("Allocation {allocation_id} not found")]
    AllocationNotFound { allocation_id: AllocationId },

    #[error("Schedule '{schedule_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        schedule_id: ScheduleId,
        from: String,
        to: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RotaResult<T> = Result<T, RotaError>;
