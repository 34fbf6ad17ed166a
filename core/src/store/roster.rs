use super::{text_column, RotaStore};
use crate::{
    availability::UnavailabilityCalendar,
    error::{RotaError, RotaResult},
    model::{Person, Role, ScoreWeights, Unavailability},
    ports::OperatorDirectory,
    types::{PersonId, QualificationCode},
};
use rusqlite::{params, OptionalExtension};
use std::collections::{BTreeSet, HashMap};

/// Historical load used to order the base queue.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LoadProfile {
    points: i64,
    special_entries: i64,
    standby_count: i64,
}

fn person_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        scope: row.get(2)?,
        role: text_column(row, 3, Role::parse)?,
        qualifications: BTreeSet::new(),
    })
}

impl RotaStore {
    // ── People ───────────────────────────────────────────────────────────────

    /// Insert or update a person and replace their qualification set.
    pub fn upsert_person(&self, person: &Person) -> RotaResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO person (person_id, name, scope, role) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(person_id) DO UPDATE SET
                name = excluded.name, scope = excluded.scope, role = excluded.role",
            params![&person.id, &person.name, &person.scope, person.role.as_str()],
        )?;
        tx.execute(
            "DELETE FROM person_qualification WHERE person_id = ?1",
            params![&person.id],
        )?;
        for code in &person.qualifications {
            tx.execute(
                "INSERT INTO person_qualification (person_id, code) VALUES (?1, ?2)",
                params![&person.id, code],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn person(&self, person_id: &str) -> RotaResult<Option<Person>> {
        let person = self
            .conn
            .query_row(
                "SELECT person_id, name, scope, role FROM person WHERE person_id = ?1",
                params![person_id],
                person_row_mapper,
            )
            .optional()?;
        let Some(mut person) = person else {
            return Ok(None);
        };
        let mut stmt = self
            .conn
            .prepare("SELECT code FROM person_qualification WHERE person_id = ?1 ORDER BY code")?;
        let codes = stmt.query_map(params![person_id], |row| row.get::<_, String>(0))?;
        person.qualifications = codes.collect::<Result<_, _>>()?;
        Ok(Some(person))
    }

    /// Everyone in `scope`, ordered by id.
    pub fn people(&self, scope: &str) -> RotaResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_id, name, scope, role FROM person WHERE scope = ?1 ORDER BY person_id",
        )?;
        let rows = stmt.query_map(params![scope], person_row_mapper)?;
        let mut people = rows.collect::<Result<Vec<_>, _>>()?;
        let mut qualifications = self.qualifications_in(scope)?;
        for person in &mut people {
            person.qualifications = qualifications.remove(&person.id).unwrap_or_default();
        }
        Ok(people)
    }

    fn qualifications_in(&self, scope: &str) -> RotaResult<HashMap<PersonId, BTreeSet<QualificationCode>>> {
        let mut stmt = self.conn.prepare(
            "SELECT q.person_id, q.code FROM person_qualification q
             JOIN person p ON p.person_id = q.person_id
             WHERE p.scope = ?1",
        )?;
        let rows = stmt.query_map(params![scope], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out: HashMap<PersonId, BTreeSet<QualificationCode>> = HashMap::new();
        for row in rows {
            let (person_id, code) = row?;
            out.entry(person_id).or_default().insert(code);
        }
        Ok(out)
    }

    fn load_profiles(&self, scope: &str, role: Role) -> RotaResult<Vec<(Person, LoadProfile)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.person_id, p.name, p.scope, p.role,
                    COALESCE((SELECT SUM(pe.points) FROM points_entry pe
                              WHERE pe.person_id = p.person_id), 0),
                    (SELECT COUNT(*) FROM points_entry pe
                     WHERE pe.person_id = p.person_id AND pe.category = 'special'),
                    (SELECT COUNT(*) FROM allocation a
                     WHERE a.person_id = p.person_id AND a.role = 'standby')
             FROM person p
             WHERE p.scope = ?1 AND p.role = ?2",
        )?;
        let rows = stmt.query_map(params![scope, role.as_str()], |row| {
            Ok((
                person_row_mapper(row)?,
                LoadProfile {
                    points: row.get(4)?,
                    special_entries: row.get(5)?,
                    standby_count: row.get(6)?,
                },
            ))
        })?;
        let mut profiles = rows.collect::<Result<Vec<_>, _>>()?;
        let mut qualifications = self.qualifications_in(scope)?;
        for (person, _) in &mut profiles {
            person.qualifications = qualifications.remove(&person.id).unwrap_or_default();
        }
        Ok(profiles)
    }

    // ── Unavailability ───────────────────────────────────────────────────────

    pub fn add_unavailability(&self, interval: &Unavailability) -> RotaResult<i64> {
        self.conn.execute(
            "INSERT INTO unavailability (person_id, start_date, end_date, reason)
             VALUES (?1, ?2, ?3, ?4)",
            params![&interval.person_id, interval.start, interval.end, &interval.reason],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl OperatorDirectory for RotaStore {
    fn list_eligible(&self, scope: &str, role: Role, weights: &ScoreWeights) -> RotaResult<Vec<Person>> {
        if role == Role::Supervisor {
            return Err(RotaError::IneligibleRole {
                person_id: format!("{scope}/*"),
                reason: "supervisors are never placed in a rotating queue".into(),
            });
        }
        let mut scored: Vec<(f64, Person)> = self
            .load_profiles(scope, role)?
            .into_iter()
            .map(|(person, load)| {
                let score = weights.weigh(
                    load.points as f64,
                    load.special_entries as f64,
                    load.standby_count as f64,
                );
                (score, person)
            })
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        Ok(scored.into_iter().map(|(_, person)| person).collect())
    }

    fn list_standby_rotation(&self, scope: &str) -> RotaResult<Vec<Person>> {
        let mut profiles = self.load_profiles(scope, Role::Operator)?;
        profiles.sort_by(|a, b| {
            a.1.standby_count
                .cmp(&b.1.standby_count)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        Ok(profiles.into_iter().map(|(person, _)| person).collect())
    }

    fn availability_calendar(&self, scope: &str) -> RotaResult<UnavailabilityCalendar> {
        let mut stmt = self.conn.prepare(
            "SELECT u.person_id, u.start_date, u.end_date, u.reason FROM unavailability u
             JOIN person p ON p.person_id = u.person_id
             WHERE p.scope = ?1",
        )?;
        let rows = stmt.query_map(params![scope], |row| {
            Ok(Unavailability {
                person_id: row.get(0)?,
                start: row.get(1)?,
                end: row.get(2)?,
                reason: row.get(3)?,
            })
        })?;
        Ok(UnavailabilityCalendar::new(rows.collect::<Result<Vec<_>, _>>()?))
    }
}
