use super::{text_column, RotaStore};
use crate::{
    calendar::DayCategory,
    error::{RotaError, RotaResult},
    ledger::{PointsEntry, PointsOrigin},
    model::{AllocationRecord, AllocationRole},
    ports::PointsLedger,
};
use rusqlite::params;

impl RotaStore {
    // ── Points ledger ────────────────────────────────────────────────────────

    /// Update-or-create the schedule-sourced entry of one allocation.
    /// Zero points removes any entry the allocation already had.
    pub(super) fn settle(&self, record: &AllocationRecord, points: i64) -> RotaResult<()> {
        let allocation_id = record
            .id
            .ok_or_else(|| anyhow::anyhow!("allocation for '{}' on {} was never committed", record.person_id, record.date))?;

        if points == 0 {
            self.conn.execute(
                "DELETE FROM points_entry WHERE allocation_id = ?1",
                params![allocation_id],
            )?;
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO points_entry (allocation_id, person_id, category, origin, points)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(allocation_id) DO UPDATE SET
                category = excluded.category, points = excluded.points",
            params![
                allocation_id,
                &record.person_id,
                record.category.as_str(),
                PointsOrigin::Schedule.as_str(),
                points
            ],
        )?;
        Ok(())
    }

    /// Manual entries and adjustments, outside any schedule.
    pub fn add_points_entry(&self, entry: &PointsEntry) -> RotaResult<i64> {
        if entry.origin == PointsOrigin::Schedule {
            return Err(anyhow::anyhow!("schedule points are written by the ledger port only").into());
        }
        self.conn.execute(
            "INSERT INTO points_entry (allocation_id, person_id, category, origin, points)
             VALUES (NULL, ?1, ?2, ?3, ?4)",
            params![
                &entry.person_id,
                entry.category.as_str(),
                entry.origin.as_str(),
                entry.points
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn points_total(&self, person_id: &str) -> RotaResult<i64> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(points), 0) FROM points_entry WHERE person_id = ?1",
                params![person_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn points_entries(&self, person_id: &str) -> RotaResult<Vec<PointsEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT allocation_id, person_id, category, origin, points
             FROM points_entry WHERE person_id = ?1 ORDER BY entry_id ASC",
        )?;
        let rows = stmt.query_map(params![person_id], |row| {
            Ok(PointsEntry {
                allocation_id: row.get(0)?,
                person_id: row.get(1)?,
                category: text_column(row, 2, DayCategory::parse)?,
                origin: text_column(row, 3, PointsOrigin::parse)?,
                points: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl PointsLedger for RotaStore {
    fn record(&self, allocation: &AllocationRecord) -> RotaResult<()> {
        if allocation.role != AllocationRole::Titular {
            return Ok(());
        }
        if allocation.id.is_none() {
            return Err(RotaError::Other(anyhow::anyhow!(
                "cannot record points for an uncommitted allocation of '{}'",
                allocation.person_id
            )));
        }
        self.settle(allocation, self.points.on_allocation(allocation))
    }
}
