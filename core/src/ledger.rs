//! Points awarded for duty, as written to the points ledger.
//!
//! Two moments award points:
//!   - on allocation: a TITULAR earns its day category's points.
//!   - on close-out: every record is settled again with the flags it
//!     ended up carrying (triggered standby, substituted titular, ...).
//! Both are update-or-create keyed by allocation, so re-recording is a no-op.

use crate::{
    calendar::DayCategory,
    error::RotaResult,
    model::{AllocationRecord, AllocationRole},
    types::{AllocationId, PersonId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PointsPolicy {
    pub regular: i64,
    pub special: i64,
    pub off: i64,
    pub standby_triggered: i64,
    pub standby_untriggered: i64,
    pub reserve_triggered: i64,
}

impl Default for PointsPolicy {
    fn default() -> Self {
        Self {
            regular: 1,
            special: 2,
            off: 3,
            standby_triggered: 10,
            standby_untriggered: 1,
            reserve_triggered: 1,
        }
    }
}

impl PointsPolicy {
    pub fn category_points(&self, category: DayCategory) -> i64 {
        match category {
            DayCategory::Regular => self.regular,
            DayCategory::Special => self.special,
            DayCategory::Off => self.off,
        }
    }

    /// Reserve and standby records earn nothing until close-out.
    pub fn on_allocation(&self, record: &AllocationRecord) -> i64 {
        match record.role {
            AllocationRole::Titular => self.category_points(record.category),
            AllocationRole::Reserve | AllocationRole::Standby => 0,
        }
    }

    pub fn on_close(&self, record: &AllocationRecord) -> i64 {
        match record.role {
            AllocationRole::Standby if record.triggered => self.standby_triggered,
            AllocationRole::Standby => self.standby_untriggered,
            AllocationRole::Titular if record.substituted => 0,
            AllocationRole::Titular => self.category_points(record.category),
            AllocationRole::Reserve if record.triggered => self.reserve_triggered,
            AllocationRole::Reserve => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PointsOrigin {
    Schedule,
    Manual,
    Adjustment,
}

impl PointsOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Manual => "manual",
            Self::Adjustment => "adjustment",
        }
    }

    pub fn parse(value: &str) -> RotaResult<Self> {
        match value {
            "schedule" => Ok(Self::Schedule),
            "manual" => Ok(Self::Manual),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(anyhow::anyhow!("unknown points origin '{other}'").into()),
        }
    }
}

/// One ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointsEntry {
    pub allocation_id: Option<AllocationId>,
    pub person_id: PersonId,
    pub category: DayCategory,
    pub origin: PointsOrigin,
    pub points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShiftKind;
    use chrono::NaiveDate;

    fn record(day: u32, role: AllocationRole) -> AllocationRecord {
        let date = NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
        AllocationRecord::new(date, DayCategory::for_date(date), ShiftKind::Early, "ana".into(), role)
    }

    #[test]
    fn friday_titular_is_worth_more() {
        let policy = PointsPolicy::default();
        assert_eq!(policy.on_allocation(&record(19, AllocationRole::Titular)), 1);
        assert_eq!(policy.on_allocation(&record(23, AllocationRole::Titular)), 2);
        assert_eq!(policy.on_allocation(&record(23, AllocationRole::Reserve)), 0);
    }

    #[test]
    fn close_out_reflects_flags() {
        let policy = PointsPolicy::default();
        let mut standby = record(24, AllocationRole::Standby);
        assert_eq!(policy.on_close(&standby), 1);
        standby.triggered = true;
        assert_eq!(policy.on_close(&standby), 10);

        let mut titular = record(20, AllocationRole::Titular);
        titular.substituted = true;
        assert_eq!(policy.on_close(&titular), 0);
    }
}
