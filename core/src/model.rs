//! Domain records shared by the allocator, the store and the simulator.

use crate::{
    calendar::DayCategory,
    error::{RotaError, RotaResult},
    types::{AllocationId, PersonId, QualificationCode, ScopeId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── People ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Supervisor,
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Supervisor => "supervisor",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> RotaResult<Self> {
        match value {
            "operator" => Ok(Self::Operator),
            "supervisor" => Ok(Self::Supervisor),
            "other" => Ok(Self::Other),
            other => Err(anyhow::anyhow!("unknown role '{other}'").into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub scope: ScopeId,
    pub role: Role,
    #[serde(default)]
    pub qualifications: BTreeSet<QualificationCode>,
}

impl Person {
    pub fn holds(&self, code: &str) -> bool {
        self.qualifications.contains(code)
    }

    /// Supervisors are never placed on a rota.
    pub fn ensure_allocatable(&self) -> RotaResult<()> {
        if self.role == Role::Supervisor {
            return Err(RotaError::IneligibleRole {
                person_id: self.id.clone(),
                reason: "supervisors cannot be allocated".into(),
            });
        }
        Ok(())
    }
}

/// A closed interval during which a person cannot be allocated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unavailability {
    pub person_id: PersonId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

impl Unavailability {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ── Shifts and allocations ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    Early,
    Late,
    Standby,
}

impl ShiftKind {
    /// Shift kinds created on every REGULAR/SPECIAL day, in creation order.
    pub const WORKING: [ShiftKind; 2] = [ShiftKind::Early, ShiftKind::Late];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Late => "late",
            Self::Standby => "standby",
        }
    }

    pub fn parse(value: &str) -> RotaResult<Self> {
        match value {
            "early" => Ok(Self::Early),
            "late" => Ok(Self::Late),
            "standby" => Ok(Self::Standby),
            other => Err(anyhow::anyhow!("unknown shift kind '{other}'").into()),
        }
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AllocationRole {
    Titular,
    Reserve,
    Standby,
}

impl AllocationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Titular => "titular",
            Self::Reserve => "reserve",
            Self::Standby => "standby",
        }
    }

    pub fn parse(value: &str) -> RotaResult<Self> {
        match value {
            "titular" => Ok(Self::Titular),
            "reserve" => Ok(Self::Reserve),
            "standby" => Ok(Self::Standby),
            other => Err(anyhow::anyhow!("unknown allocation role '{other}'").into()),
        }
    }

    /// Roles bound by the one-duty-per-person-per-date rule.
    pub fn is_daily_exclusive(&self) -> bool {
        matches!(self, Self::Titular | Self::Reserve)
    }
}

/// One person placed on one shift in one role.
///
/// Immutable once committed, except `triggered` and `substituted`,
/// which later workflows may set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationRecord {
    pub id: Option<AllocationId>,
    pub date: NaiveDate,
    /// Category of the planned day, which is not always the weekday's:
    /// a standby day is OFF whatever date it falls on.
    pub category: DayCategory,
    pub shift_kind: ShiftKind,
    pub person_id: PersonId,
    pub role: AllocationRole,
    pub triggered: bool,
    pub substituted: bool,
}

impl AllocationRecord {
    pub fn new(
        date: NaiveDate,
        category: DayCategory,
        shift_kind: ShiftKind,
        person_id: PersonId,
        role: AllocationRole,
    ) -> Self {
        Self {
            id: None,
            date,
            category,
            shift_kind,
            person_id,
            role,
            triggered: false,
            substituted: false,
        }
    }
}

// ── Schedules ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Normal,
    Standby,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Standby => "standby",
        }
    }

    pub fn parse(value: &str) -> RotaResult<Self> {
        match value {
            "normal" => Ok(Self::Normal),
            "standby" => Ok(Self::Standby),
            other => Err(anyhow::anyhow!("unknown schedule kind '{other}'").into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Draft,
    Published,
    Closed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> RotaResult<Self> {
        match value {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "closed" => Ok(Self::Closed),
            other => Err(anyhow::anyhow!("unknown schedule status '{other}'").into()),
        }
    }
}

// ── Tunable weights ──────────────────────────────────────────────────────────

/// Coefficients ranking operators by historical load:
/// `points*points_weight + special*special_weight + standby*standby_weight`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    pub points_weight: f64,
    pub special_weight: f64,
    pub standby_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            points_weight: 1.0,
            special_weight: 1.5,
            standby_weight: 0.5,
        }
    }
}

impl ScoreWeights {
    pub fn weigh(&self, points: f64, special: f64, standby: f64) -> f64 {
        points * self.points_weight + special * self.special_weight + standby * self.standby_weight
    }
}
