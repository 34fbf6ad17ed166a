//! In-memory schedule arena built before anything is persisted.
//!
//! Days, shifts and allocations live in flat vectors. Children point at
//! their parent by index (forward-only keys); reverse lookups are derived
//! by scanning, never stored.

use crate::{
    calendar::{week_dates, DayCategory},
    error::{RotaError, RotaResult},
    model::{AllocationRecord, AllocationRole, ScheduleKind, ShiftKind},
    types::{PersonId, ScheduleId, ScopeId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedDay {
    pub date: NaiveDate,
    pub category: DayCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedShift {
    /// Index into `WeekPlan::days`.
    pub day: usize,
    pub kind: ShiftKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedAllocation {
    /// Index into `WeekPlan::shifts`.
    pub shift: usize,
    pub person_id: PersonId,
    pub role: AllocationRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekPlan {
    pub scope: ScopeId,
    pub kind: ScheduleKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<PlannedDay>,
    pub shifts: Vec<PlannedShift>,
    pub allocations: Vec<PlannedAllocation>,
}

impl WeekPlan {
    /// Seven days from `start`; EARLY and LATE slots on every non-OFF day.
    pub fn skeleton(scope: &str, start: NaiveDate) -> Self {
        let dates = week_dates(start);
        let end = dates[dates.len() - 1];
        let mut plan = Self::empty(scope, ScheduleKind::Normal, start, end);
        for date in dates {
            let category = DayCategory::for_date(date);
            plan.days.push(PlannedDay { date, category });
            if !category.has_shifts() {
                continue;
            }
            let day = plan.days.len() - 1;
            for kind in ShiftKind::WORKING {
                plan.shifts.push(PlannedShift { day, kind });
            }
        }
        plan
    }

    /// A single OFF day carrying one STANDBY slot.
    pub fn standby_day(scope: &str, date: NaiveDate) -> Self {
        let mut plan = Self::empty(scope, ScheduleKind::Standby, date, date);
        plan.days.push(PlannedDay { date, category: DayCategory::Off });
        plan.shifts.push(PlannedShift { day: 0, kind: ShiftKind::Standby });
        plan
    }

    fn empty(scope: &str, kind: ScheduleKind, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            scope: scope.to_string(),
            kind,
            start,
            end,
            days: Vec::new(),
            shifts: Vec::new(),
            allocations: Vec::new(),
        }
    }

    pub fn shift_date(&self, shift: usize) -> NaiveDate {
        self.days[self.shifts[shift].day].date
    }

    pub fn shift_category(&self, shift: usize) -> DayCategory {
        self.days[self.shifts[shift].day].category
    }

    /// Shift indices on days of `category`, in calendar then kind order.
    pub fn shifts_in(&self, category: DayCategory) -> Vec<usize> {
        (0..self.shifts.len())
            .filter(|&i| self.shift_category(i) == category)
            .collect()
    }

    /// People holding a TITULAR or RESERVE record on `date`.
    pub fn used_on(&self, date: NaiveDate) -> HashSet<PersonId> {
        self.allocations
            .iter()
            .filter(|a| a.role.is_daily_exclusive() && self.shift_date(a.shift) == date)
            .map(|a| a.person_id.clone())
            .collect()
    }

    pub fn holders(&self, shift: usize, role: AllocationRole) -> impl Iterator<Item = &PersonId> + '_ {
        self.allocations
            .iter()
            .filter(move |a| a.shift == shift && a.role == role)
            .map(|a| &a.person_id)
    }

    /// Place a person, enforcing one duty per person per date, one
    /// record per person per shift and at most one RESERVE per shift.
    pub fn assign(&mut self, shift: usize, person_id: &str, role: AllocationRole) -> RotaResult<()> {
        let date = self.shift_date(shift);
        let duplicate = |person: &str| RotaError::DuplicateAssignment {
            person_id: person.to_string(),
            date,
        };

        if self
            .allocations
            .iter()
            .any(|a| a.shift == shift && a.person_id == person_id)
        {
            return Err(duplicate(person_id));
        }
        if role.is_daily_exclusive() && self.used_on(date).contains(person_id) {
            return Err(duplicate(person_id));
        }
        if role == AllocationRole::Reserve && self.holders(shift, AllocationRole::Reserve).next().is_some() {
            return Err(duplicate(person_id));
        }

        self.allocations.push(PlannedAllocation {
            shift,
            person_id: person_id.to_string(),
            role,
        });
        Ok(())
    }

    pub fn records(&self) -> Vec<AllocationRecord> {
        self.allocations
            .iter()
            .map(|a| {
                AllocationRecord::new(
                    self.shift_date(a.shift),
                    self.shift_category(a.shift),
                    self.shifts[a.shift].kind,
                    a.person_id.clone(),
                    a.role,
                )
            })
            .collect()
    }
}

/// A plan after the store accepted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedWeek {
    pub schedule_id: ScheduleId,
    pub plan: WeekPlan,
    /// Same order as `plan.allocations`, with store ids filled in.
    pub records: Vec<AllocationRecord>,
}

impl CommittedWeek {
    pub fn with_role(&self, role: AllocationRole) -> impl Iterator<Item = &AllocationRecord> + '_ {
        self.records.iter().filter(move |r| r.role == role)
    }

    pub fn on(&self, date: NaiveDate) -> impl Iterator<Item = &AllocationRecord> + '_ {
        self.records.iter().filter(move |r| r.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn skeleton_skips_off_days() {
        let plan = WeekPlan::skeleton("ops", monday());
        assert_eq!(plan.days.len(), 7);
        assert_eq!(plan.shifts.len(), 10);
        assert_eq!(plan.shifts_in(DayCategory::Special).len(), 2);
        assert!(plan.shifts_in(DayCategory::Off).is_empty());
    }

    #[test]
    fn same_person_cannot_take_two_duties_on_one_date() {
        let mut plan = WeekPlan::skeleton("ops", monday());
        plan.assign(0, "ana", AllocationRole::Titular).unwrap();
        let err = plan.assign(1, "ana", AllocationRole::Reserve).unwrap_err();
        assert!(matches!(err, RotaError::DuplicateAssignment { .. }));
        // next day is fine
        plan.assign(2, "ana", AllocationRole::Titular).unwrap();
    }

    #[test]
    fn one_reserve_per_shift() {
        let mut plan = WeekPlan::skeleton("ops", monday());
        plan.assign(0, "ana", AllocationRole::Reserve).unwrap();
        assert!(plan.assign(0, "bia", AllocationRole::Reserve).is_err());
    }
}
