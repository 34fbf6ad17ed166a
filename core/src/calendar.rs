//! Calendar rules: day classification and week skeletons.
//!
//! Mon–Thu are REGULAR, Fri is SPECIAL, Sat/Sun are OFF.
//! OFF days never receive EARLY/LATE shifts; they are standby-only.

use crate::error::{RotaError, RotaResult};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: i64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DayCategory {
    Regular,
    Special,
    Off,
}

impl DayCategory {
    pub fn for_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu => Self::Regular,
            Weekday::Fri => Self::Special,
            Weekday::Sat | Weekday::Sun => Self::Off,
        }
    }

    /// True for days that carry EARLY/LATE shifts.
    pub fn has_shifts(&self) -> bool {
        !matches!(self, Self::Off)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Special => "special",
            Self::Off => "off",
        }
    }

    pub fn parse(value: &str) -> RotaResult<Self> {
        match value {
            "regular" => Ok(Self::Regular),
            "special" => Ok(Self::Special),
            "off" => Ok(Self::Off),
            other => Err(anyhow::anyhow!("unknown day category '{other}'").into()),
        }
    }
}

/// The 7 consecutive dates starting at `start`.
pub fn week_dates(start: NaiveDate) -> Vec<NaiveDate> {
    (0..DAYS_PER_WEEK).map(|i| start + Duration::days(i)).collect()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> RotaResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| RotaError::InvalidDate {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekdays_map_to_categories() {
        // 2026-10-19 is a Monday.
        let cats: Vec<_> = week_dates(d(2026, 10, 19))
            .into_iter()
            .map(DayCategory::for_date)
            .collect();
        assert_eq!(
            cats,
            vec![
                DayCategory::Regular,
                DayCategory::Regular,
                DayCategory::Regular,
                DayCategory::Regular,
                DayCategory::Special,
                DayCategory::Off,
                DayCategory::Off,
            ]
        );
    }

    #[test]
    fn dates_round_trip_through_text() {
        let date = d(2026, 2, 28);
        assert_eq!(parse_date(&format_date(date)).unwrap(), date);
        assert!(matches!(parse_date("28/02/2026"), Err(RotaError::InvalidDate { .. })));
    }
}
