//! Shared primitive types used across the entire rota.

/// A stable, unique identifier for a person.
pub type PersonId = String;

/// The organizational unit a roster belongs to (a section, a team).
pub type ScopeId = String;

/// The canonical schedule identifier (uuid v4 text).
pub type ScheduleId = String;

/// Row identifiers assigned by the store.
pub type DayId = i64;
pub type ShiftId = i64;
pub type AllocationId = i64;

/// A qualification code held by a person (e.g. "FLOOR", "MAINT").
pub type QualificationCode = String;
