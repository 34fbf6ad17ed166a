use super::{duplicate_or_db, is_unique_violation, text_column, RotaStore};
use crate::{
    calendar::DayCategory,
    error::{RotaError, RotaResult},
    model::{AllocationRecord, AllocationRole, ScheduleKind, ScheduleStatus, ShiftKind},
    plan::{CommittedWeek, WeekPlan},
    ports::{HistoricalStatsProvider, PersistencePort, PointsLedger, ServiceHistoryProvider},
    stats::CohortStats,
    suggestion::ServiceEntry,
    types::{AllocationId, DayId, PersonId, ScheduleId, ScopeId, ShiftId},
};
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduleSummary {
    pub schedule_id: ScheduleId,
    pub scope: ScopeId,
    pub kind: ScheduleKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: ScheduleStatus,
}

/// Every query selecting these joins `shift s` and `schedule_day d`.
const ALLOCATION_COLUMNS: &str =
    "a.allocation_id, a.date, d.category, s.kind, a.person_id, a.role, a.triggered, a.substituted";

fn allocation_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<AllocationRecord> {
    Ok(AllocationRecord {
        id: Some(row.get(0)?),
        date: row.get(1)?,
        category: text_column(row, 2, DayCategory::parse)?,
        shift_kind: text_column(row, 3, ShiftKind::parse)?,
        person_id: row.get(4)?,
        role: text_column(row, 5, AllocationRole::parse)?,
        triggered: row.get::<_, i32>(6)? != 0,
        substituted: row.get::<_, i32>(7)? != 0,
    })
}

fn schedule_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleSummary> {
    Ok(ScheduleSummary {
        schedule_id: row.get(0)?,
        scope: row.get(1)?,
        kind: text_column(row, 2, ScheduleKind::parse)?,
        start: row.get(3)?,
        end: row.get(4)?,
        status: text_column(row, 5, ScheduleStatus::parse)?,
    })
}

impl RotaStore {
    // ── Schedules ────────────────────────────────────────────────────────────

    pub fn schedule(&self, schedule_id: &str) -> RotaResult<ScheduleSummary> {
        self.conn
            .query_row(
                "SELECT schedule_id, scope, kind, start_date, end_date, status
                 FROM schedule WHERE schedule_id = ?1",
                params![schedule_id],
                schedule_row_mapper,
            )
            .optional()?
            .ok_or_else(|| RotaError::ScheduleNotFound {
                schedule_id: schedule_id.to_string(),
            })
    }

    pub fn schedules(&self, scope: &str) -> RotaResult<Vec<ScheduleSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT schedule_id, scope, kind, start_date, end_date, status
             FROM schedule WHERE scope = ?1 ORDER BY start_date ASC, kind ASC",
        )?;
        let rows = stmt.query_map(params![scope], schedule_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn schedule_status(&self, schedule_id: &str) -> RotaResult<ScheduleStatus> {
        Ok(self.schedule(schedule_id)?.status)
    }

    /// DRAFT → PUBLISHED.
    pub fn publish_schedule(&self, schedule_id: &str) -> RotaResult<()> {
        self.transition(schedule_id, ScheduleStatus::Draft, ScheduleStatus::Published)?;
        log::info!("Published schedule {schedule_id}");
        Ok(())
    }

    /// PUBLISHED → CLOSED, settling every allocation into the points ledger
    /// in the same transaction.
    pub fn close_schedule(&self, schedule_id: &str) -> RotaResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.transition(schedule_id, ScheduleStatus::Published, ScheduleStatus::Closed)?;
        let records = self.allocations_for_schedule(schedule_id)?;
        for record in &records {
            let points = self.points.on_close(record);
            self.settle(record, points)?;
        }
        tx.commit()?;
        log::info!(
            "Closed schedule {schedule_id}: {} allocation(s) settled",
            records.len()
        );
        Ok(())
    }

    fn transition(&self, schedule_id: &str, from: ScheduleStatus, to: ScheduleStatus) -> RotaResult<()> {
        let current = self.schedule_status(schedule_id)?;
        if current != from {
            return Err(RotaError::InvalidTransition {
                schedule_id: schedule_id.to_string(),
                from: current.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.conn.execute(
            "UPDATE schedule SET status = ?1 WHERE schedule_id = ?2",
            params![to.as_str(), schedule_id],
        )?;
        Ok(())
    }

    // ── Allocations ──────────────────────────────────────────────────────────

    pub fn allocation(&self, allocation_id: AllocationId) -> RotaResult<AllocationRecord> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {ALLOCATION_COLUMNS} FROM allocation a
                     JOIN shift s ON s.shift_id = a.shift_id
                     JOIN schedule_day d ON d.day_id = s.day_id
                     WHERE a.allocation_id = ?1"
                ),
                params![allocation_id],
                allocation_row_mapper,
            )
            .optional()?
            .ok_or(RotaError::AllocationNotFound { allocation_id })
    }

    /// Every allocation of a schedule, in date then shift then insertion order.
    pub fn allocations_for_schedule(&self, schedule_id: &str) -> RotaResult<Vec<AllocationRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM allocation a
             JOIN shift s ON s.shift_id = a.shift_id
             JOIN schedule_day d ON d.day_id = s.day_id
             WHERE d.schedule_id = ?1
             ORDER BY a.date ASC, s.shift_id ASC, a.allocation_id ASC"
        ))?;
        let rows = stmt.query_map(params![schedule_id], allocation_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Mark a STANDBY duty as called in. Re-triggering is a no-op.
    pub fn trigger_standby(&self, allocation_id: AllocationId) -> RotaResult<()> {
        self.set_triggered(allocation_id, AllocationRole::Standby)
    }

    /// Mark a RESERVE as having stepped in for a titular.
    pub fn trigger_reserve(&self, allocation_id: AllocationId) -> RotaResult<()> {
        self.set_triggered(allocation_id, AllocationRole::Reserve)
    }

    fn set_triggered(&self, allocation_id: AllocationId, expected: AllocationRole) -> RotaResult<()> {
        let record = self.allocation(allocation_id)?;
        if record.role != expected {
            return Err(RotaError::IneligibleRole {
                person_id: record.person_id,
                reason: format!(
                    "allocation {allocation_id} is a {} duty, not {}",
                    record.role.as_str(),
                    expected.as_str()
                ),
            });
        }
        self.conn.execute(
            "UPDATE allocation SET triggered = 1 WHERE allocation_id = ?1",
            params![allocation_id],
        )?;
        log::debug!("allocation {allocation_id} triggered ({})", expected.as_str());
        Ok(())
    }

    /// Flag a titular as replaced by someone else; settles to zero at close.
    pub fn mark_substituted(&self, allocation_id: AllocationId) -> RotaResult<()> {
        let record = self.allocation(allocation_id)?;
        if record.role != AllocationRole::Titular {
            return Err(RotaError::IneligibleRole {
                person_id: record.person_id,
                reason: format!(
                    "allocation {allocation_id} is a {} duty; only titulars are substituted",
                    record.role.as_str()
                ),
            });
        }
        self.conn.execute(
            "UPDATE allocation SET substituted = 1 WHERE allocation_id = ?1",
            params![allocation_id],
        )?;
        Ok(())
    }
}

impl PersistencePort for RotaStore {
    fn commit_week(&self, plan: &WeekPlan, ledger: &dyn PointsLedger) -> RotaResult<CommittedWeek> {
        let schedule_id = Uuid::new_v4().to_string();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO schedule (schedule_id, scope, kind, start_date, end_date, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &schedule_id,
                &plan.scope,
                plan.kind.as_str(),
                plan.start,
                plan.end,
                ScheduleStatus::Draft.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RotaError::Other(anyhow::anyhow!(
                    "a {} schedule for '{}' starting {} already exists",
                    plan.kind.as_str(),
                    plan.scope,
                    plan.start
                ))
            } else {
                e.into()
            }
        })?;

        let mut day_ids: Vec<DayId> = Vec::with_capacity(plan.days.len());
        for day in &plan.days {
            tx.execute(
                "INSERT INTO schedule_day (schedule_id, date, category) VALUES (?1, ?2, ?3)",
                params![&schedule_id, day.date, day.category.as_str()],
            )?;
            day_ids.push(tx.last_insert_rowid());
        }

        let mut shift_ids: Vec<ShiftId> = Vec::with_capacity(plan.shifts.len());
        for shift in &plan.shifts {
            tx.execute(
                "INSERT INTO shift (day_id, kind) VALUES (?1, ?2)",
                params![day_ids[shift.day], shift.kind.as_str()],
            )?;
            shift_ids.push(tx.last_insert_rowid());
        }

        let mut records = plan.records();
        for (planned, record) in plan.allocations.iter().zip(records.iter_mut()) {
            tx.execute(
                "INSERT INTO allocation (shift_id, person_id, date, role) VALUES (?1, ?2, ?3, ?4)",
                params![
                    shift_ids[planned.shift],
                    &record.person_id,
                    record.date,
                    record.role.as_str()
                ],
            )
            .map_err(|e| duplicate_or_db(e, &record.person_id, record.date))?;
            record.id = Some(tx.last_insert_rowid());
        }

        // Dropping `tx` on error rolls back the week with any points written so far.
        for record in records.iter().filter(|r| r.role == AllocationRole::Titular) {
            ledger.record(record)?;
        }

        tx.commit()?;
        Ok(CommittedWeek {
            schedule_id,
            plan: plan.clone(),
            records,
        })
    }
}

impl HistoricalStatsProvider for RotaStore {
    fn cohort_stats(
        &self,
        scope: &str,
        as_of: NaiveDate,
        window_days: i64,
    ) -> RotaResult<HashMap<PersonId, CohortStats>> {
        let since = as_of - Duration::days(window_days);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM allocation a
             JOIN shift s ON s.shift_id = a.shift_id
             JOIN schedule_day d ON d.day_id = s.day_id
             JOIN schedule sc ON sc.schedule_id = d.schedule_id
             WHERE sc.scope = ?1 AND a.role = 'titular'
               AND a.date >= ?2 AND a.date < ?3"
        ))?;
        let rows = stmt.query_map(params![scope, since, as_of], allocation_row_mapper)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(CohortStats::from_records(&records, as_of, window_days))
    }
}

impl ServiceHistoryProvider for RotaStore {
    fn service_history(&self, scope: &str) -> RotaResult<HashMap<PersonId, Vec<ServiceEntry>>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.person_id, a.date, s.kind, a.triggered FROM allocation a
             JOIN shift s ON s.shift_id = a.shift_id
             JOIN schedule_day d ON d.day_id = s.day_id
             JOIN schedule sc ON sc.schedule_id = d.schedule_id
             WHERE sc.scope = ?1
             ORDER BY a.date ASC, a.allocation_id ASC",
        )?;
        let rows = stmt.query_map(params![scope], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ServiceEntry {
                    date: row.get(1)?,
                    kind: text_column(row, 2, ShiftKind::parse)?,
                    triggered: row.get::<_, i32>(3)? != 0,
                },
            ))
        })?;

        let mut history: HashMap<PersonId, Vec<ServiceEntry>> = HashMap::new();
        for row in rows {
            let (person_id, entry) = row?;
            history.entry(person_id).or_default().push(entry);
        }
        Ok(history)
    }
}
