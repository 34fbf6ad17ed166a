//! Single-shift suggestion without running a full week.
//!
//! load_score = 0.5 * weighted historical load
//!            + 2   * assignments within the trailing window (default 7 days)
//!            - 0.3 * days since the last assignment
//!
//! Lowest score wins; ties keep the first person seen (no random draw).

use crate::{
    error::RotaResult,
    model::{Person, Role, ScoreWeights, ShiftKind},
    ports::{AvailabilityOracle, OperatorDirectory, ServiceHistoryProvider},
    types::PersonId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Days-since-last for someone who has never served.
pub const NEVER_SERVED_DAYS: i64 = 999;

const LOAD_FACTOR: f64 = 0.5;
const STREAK_FACTOR: f64 = 2.0;
const REST_FACTOR: f64 = 0.3;

/// One past duty, as seen by the suggester.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceEntry {
    pub date: NaiveDate,
    pub kind: ShiftKind,
    pub triggered: bool,
}

impl ServiceEntry {
    pub fn weight(&self) -> f64 {
        match self.kind {
            ShiftKind::Early => 3.0,
            ShiftKind::Late => 2.0,
            ShiftKind::Standby if self.triggered => 10.0,
            ShiftKind::Standby => 1.0,
        }
    }
}

/// A person's full duty history, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ServiceHistory {
    entries: Vec<ServiceEntry>,
}

impl ServiceHistory {
    pub fn new(mut entries: Vec<ServiceEntry>) -> Self {
        entries.sort_by_key(|e| e.date);
        Self { entries }
    }

    pub fn weighted_load(&self) -> f64 {
        self.entries.iter().map(ServiceEntry::weight).sum()
    }

    pub fn days_since_last(&self, today: NaiveDate) -> i64 {
        self.entries
            .last()
            .map_or(NEVER_SERVED_DAYS, |e| (today - e.date).num_days())
    }

    /// Most recent entries falling within `window_days` of `today`,
    /// counted backwards until the first older one.
    pub fn recent_streak(&self, today: NaiveDate, window_days: i64) -> usize {
        self.entries
            .iter()
            .rev()
            .take_while(|e| (today - e.date).num_days() <= window_days)
            .count()
    }

    pub fn load_score(&self, today: NaiveDate, window_days: i64) -> f64 {
        LOAD_FACTOR * self.weighted_load() + STREAK_FACTOR * self.recent_streak(today, window_days) as f64
            - REST_FACTOR * self.days_since_last(today) as f64
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Suggestion {
    pub person_id: PersonId,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftSuggester {
    window_days: i64,
}

impl ShiftSuggester {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    /// Pick the lowest load score among people available on `date`.
    pub fn suggest(
        &self,
        people: &[Person],
        histories: &HashMap<PersonId, Vec<ServiceEntry>>,
        date: NaiveDate,
        today: NaiveDate,
        availability: &dyn AvailabilityOracle,
    ) -> Option<Suggestion> {
        let mut best: Option<Suggestion> = None;
        for person in people {
            if !availability.is_available(&person.id, date) {
                continue;
            }
            let history = ServiceHistory::new(histories.get(&person.id).cloned().unwrap_or_default());
            let score = history.load_score(today, self.window_days);
            log::debug!("suggest {date}: {} -> {score:.2}", person.id);

            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(Suggestion {
                    person_id: person.id.clone(),
                    score,
                });
            }
        }
        best
    }

    /// Load operators, their histories and availability for `scope`, then suggest.
    /// `weights` order the candidates, so they decide who wins a tie.
    pub fn suggest_for_scope<S>(
        &self,
        source: &S,
        scope: &str,
        weights: &ScoreWeights,
        date: NaiveDate,
        today: NaiveDate,
    ) -> RotaResult<Option<Suggestion>>
    where
        S: OperatorDirectory + ServiceHistoryProvider,
    {
        let people = source.list_eligible(scope, Role::Operator, weights)?;
        let histories = source.service_history(scope)?;
        let calendar = source.availability_calendar(scope)?;
        Ok(self.suggest(&people, &histories, date, today, &calendar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::UnavailabilityCalendar;
    use crate::model::Unavailability;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn entry(d: u32, kind: ShiftKind) -> ServiceEntry {
        ServiceEntry {
            date: day(d),
            kind,
            triggered: false,
        }
    }

    fn operator(id: &str) -> Person {
        Person {
            id: id.into(),
            name: id.into(),
            scope: "ops".into(),
            role: Role::Operator,
            qualifications: Default::default(),
        }
    }

    #[test]
    fn triggered_standby_weighs_most() {
        let mut standby = entry(1, ShiftKind::Standby);
        assert_eq!(standby.weight(), 1.0);
        standby.triggered = true;
        assert_eq!(standby.weight(), 10.0);
        assert_eq!(entry(1, ShiftKind::Early).weight(), 3.0);
        assert_eq!(entry(1, ShiftKind::Late).weight(), 2.0);
    }

    #[test]
    fn empty_history_scores_as_long_rested() {
        let history = ServiceHistory::default();
        assert_eq!(history.days_since_last(day(20)), NEVER_SERVED_DAYS);
        assert!((history.load_score(day(20), 7) - (-0.3 * 999.0)).abs() < 1e-9);
    }

    #[test]
    fn streak_stops_at_first_old_entry() {
        // 1st is outside the window, 15th and 18th inside
        let history = ServiceHistory::new(vec![
            entry(18, ShiftKind::Early),
            entry(1, ShiftKind::Late),
            entry(15, ShiftKind::Late),
        ]);
        assert_eq!(history.recent_streak(day(20), 7), 2);
        assert_eq!(history.days_since_last(day(20)), 2);
        // 0.5*7 + 2*2 - 0.3*2
        assert!((history.load_score(day(20), 7) - 6.9).abs() < 1e-9);
    }

    #[test]
    fn suggests_least_loaded_available_person() {
        let people = vec![operator("ana"), operator("bia"), operator("caio")];
        let mut histories = HashMap::new();
        histories.insert("ana".to_string(), vec![entry(19, ShiftKind::Early)]);
        histories.insert("bia".to_string(), vec![entry(2, ShiftKind::Late)]);

        let calendar = UnavailabilityCalendar::new([Unavailability {
            person_id: "caio".into(),
            start: day(20),
            end: day(25),
            reason: "leave".into(),
        }]);

        let pick = ShiftSuggester::new(7)
            .suggest(&people, &histories, day(21), day(20), &calendar)
            .unwrap();
        assert_eq!(pick.person_id, "bia");
    }

    #[test]
    fn ties_keep_first_seen() {
        let people = vec![operator("bia"), operator("ana")];
        let calendar = UnavailabilityCalendar::default();
        let pick = ShiftSuggester::new(7)
            .suggest(&people, &HashMap::new(), day(21), day(20), &calendar)
            .unwrap();
        assert_eq!(pick.person_id, "bia");
    }
}
