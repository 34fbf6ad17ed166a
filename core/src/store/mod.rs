//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The allocator, standby planner and suggester reach it through the
//! traits in `ports`; they never execute SQL directly.

mod ledger;
mod roster;
mod schedule;

use crate::{
    error::{RotaError, RotaResult},
    ledger::PointsPolicy,
};
use chrono::NaiveDate;
use rusqlite::{types::Type, Connection, Row};

pub use schedule::ScheduleSummary;

pub struct RotaStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
    points: PointsPolicy,
}

impl RotaStore {
    pub fn open(path: &str) -> RotaResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
            points: PointsPolicy::default(),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RotaResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: None,
            points: PointsPolicy::default(),
        })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> RotaResult<Self> {
        let store = match &self.path {
            Some(p) => Self::open(p)?,
            None => Self::in_memory()?,
        };
        Ok(store.with_points_policy(self.points))
    }

    /// Points awarded by the ledger port and by close-out.
    pub fn with_points_policy(mut self, points: PointsPolicy) -> Self {
        self.points = points;
        self
    }

    pub fn points_policy(&self) -> &PointsPolicy {
        &self.points
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RotaResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_roster.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_schedule.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_points.sql"))?;
        Ok(())
    }
}

// ── Row helpers ──────────────────────────────────────────────────────────────

/// Read a text column through one of the domain `parse` functions.
fn text_column<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> RotaResult<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// UNIQUE failures on the allocation table surface as `DuplicateAssignment`.
fn duplicate_or_db(err: rusqlite::Error, person_id: &str, date: NaiveDate) -> RotaError {
    if is_unique_violation(&err) {
        RotaError::DuplicateAssignment {
            person_id: person_id.to_string(),
            date,
        }
    } else {
        err.into()
    }
}
