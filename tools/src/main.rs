//! rota-runner: command-line driver for the duty rota.
//!
//! Usage:
//!   rota-runner import   --db rota.db [--file data/roster.json]
//!   rota-runner generate --db rota.db --scope ops --week 2026-10-19 --seed 7
//!   rota-runner standby  --db rota.db --scope ops --date 2026-10-24 --quantity 1
//!   rota-runner publish  --db rota.db --schedule <id>
//!   rota-runner close    --db rota.db --schedule <id>
//!   rota-runner suggest  --db rota.db --scope ops --date 2026-10-21
//!   rota-runner tune     --db rota.db --scope ops [--week 2026-10-19]
//!
//! Common flags: --db (rota.db), --scope (ops), --seed (42), --data-dir (./data).

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use rota_core::{
    allocator::ShiftAllocator,
    calendar::{format_date, parse_date},
    config::{JsonParameterStore, RotaConfig},
    locks::ScopeLocks,
    model::{AllocationRole, Person, Unavailability},
    plan::CommittedWeek,
    ports::{OperatorDirectory, ParameterStore, RotaPorts},
    rng::{RngBank, RngStream},
    standby::plan_standby_day,
    store::RotaStore,
    suggestion::ShiftSuggester,
    tuner::ParameterTuner,
};
use std::env;

/// Roster file accepted by `import`.
#[derive(serde::Deserialize)]
struct RosterFile {
    people: Vec<Person>,
    #[serde(default)]
    unavailability: Vec<Unavailability>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        bail!("usage: rota-runner <import|generate|standby|publish|close|suggest|tune> [--flag value]...");
    };
    let seed = parse_arg(&args, "--seed", 42u64);
    let db = flag(&args, "--db").unwrap_or("rota.db");
    let scope = flag(&args, "--scope").unwrap_or("ops");
    let data_dir = flag(&args, "--data-dir").unwrap_or("./data");

    let config = RotaConfig::load(data_dir)?;
    let store = RotaStore::open(db)?.with_points_policy(config.points);
    store.migrate()?;

    println!("rota-runner {command}");
    println!("  db:        {db}");
    println!("  scope:     {scope}");
    println!("  data_dir:  {data_dir}");
    println!();

    match command {
        "import" => {
            let default_file = format!("{data_dir}/roster.json");
            import_roster(&store, flag(&args, "--file").unwrap_or(&default_file))
        }
        "generate" => {
            let week = date_arg(&args, "--week")?;
            let weights = JsonParameterStore::in_data_dir(data_dir).load()?;
            let allocator = ShiftAllocator::new(config.clone(), weights);
            let ports = RotaPorts::from_store(&store);
            let bank = RngBank::new(seed);
            println!("  seed:      {}", bank.master_seed());
            let mut rng = bank.for_stream(RngStream::TieBreak);
            let locks = ScopeLocks::new();
            let committed =
                allocator.generate_week_locked(&locks, &ports, scope, week, config.titulars, &mut rng)?;
            print_week(&committed);
            Ok(())
        }
        "standby" => {
            let date = date_arg(&args, "--date")?;
            let quantity = parse_arg(&args, "--quantity", 1usize);
            let committed = plan_standby_day(&RotaPorts::from_store(&store), scope, date, quantity)?;
            print_week(&committed);
            Ok(())
        }
        "publish" => {
            let schedule = flag(&args, "--schedule").context("--schedule is required")?;
            store.publish_schedule(schedule)?;
            println!("published {schedule}");
            Ok(())
        }
        "close" => {
            let schedule = flag(&args, "--schedule").context("--schedule is required")?;
            store.close_schedule(schedule)?;
            print_points(&store, scope)
        }
        "suggest" => {
            let date = date_arg(&args, "--date")?;
            let today = Local::now().date_naive();
            let weights = JsonParameterStore::in_data_dir(data_dir).load()?;
            let suggester = ShiftSuggester::new(config.suggestion_window_days);
            match suggester.suggest_for_scope(&store, scope, &weights, date, today)? {
                Some(pick) => println!("suggested: {} (score {:.2})", pick.person_id, pick.score),
                None => println!("no available operator on {date}"),
            }
            Ok(())
        }
        "tune" => tune(&store, &config, scope, data_dir, seed, &args),
        other => bail!("unknown command '{other}'"),
    }
}

fn import_roster(store: &RotaStore, file: &str) -> Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Cannot read {file}"))?;
    let roster: RosterFile =
        serde_json::from_str(&content).with_context(|| format!("Cannot parse {file}"))?;

    for person in &roster.people {
        store.upsert_person(person)?;
        log::debug!("imported {} ({})", person.id, person.role.as_str());
    }
    for interval in &roster.unavailability {
        store.add_unavailability(interval)?;
    }
    println!(
        "imported {} people, {} unavailability interval(s)",
        roster.people.len(),
        roster.unavailability.len()
    );
    Ok(())
}

fn tune(
    store: &RotaStore,
    config: &RotaConfig,
    scope: &str,
    data_dir: &str,
    seed: u64,
    args: &[String],
) -> Result<()> {
    let start = horizon_start(args, Local::now().date_naive())?;
    let roster = store.people(scope)?;
    let calendar = store.availability_calendar(scope)?;
    let params = JsonParameterStore::in_data_dir(data_dir);
    let baseline = params.load()?;

    let tuner = ParameterTuner::new(&roster, &config.requirements, &calendar, config.tuning.clone(), start);
    let mut rng = RngBank::new(seed).for_stream(RngStream::Mutation);
    let report = tuner.tune(baseline, &mut rng);

    println!("=== TUNING SUMMARY ===");
    println!("  run_id:       {}", report.run_id);
    println!("  generations:  {}", report.history.len());
    println!("  improvements: {}", report.improvements());
    println!("  baseline:     {:.5}  {:?}", report.baseline_injustice, report.baseline);
    println!("  best:         {:.5}  {:?}", report.best_injustice, report.best);

    params.save(&report.best)?;
    Ok(())
}

fn print_week(committed: &CommittedWeek) {
    println!("=== SCHEDULE {} ===", committed.schedule_id);
    for day in &committed.plan.days {
        let mut line = format!("  {} {:<8}", format_date(day.date), day.category.as_str());
        for record in committed.on(day.date) {
            let tag = match record.role {
                AllocationRole::Titular => "",
                AllocationRole::Reserve => " (reserve)",
                AllocationRole::Standby => " (standby)",
            };
            line.push_str(&format!(" | {} {}{tag}", record.shift_kind, record.person_id));
        }
        println!("{line}");
    }
}

fn print_points(store: &RotaStore, scope: &str) -> Result<()> {
    println!("=== POINTS ===");
    for person in store.people(scope)? {
        println!("  {:<12} {:>4}", person.id, store.points_total(&person.id)?);
    }
    Ok(())
}

/// `--week` if given, otherwise the horizon starts `today`.
fn horizon_start(args: &[String], today: NaiveDate) -> Result<NaiveDate> {
    match flag(args, "--week") {
        Some(value) => Ok(parse_date(value)?),
        None => Ok(today),
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].as_str())
}

fn date_arg(args: &[String], name: &str) -> Result<NaiveDate> {
    let value = flag(args, name).with_context(|| format!("{name} YYYY-MM-DD is required"))?;
    Ok(parse_date(value)?)
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn horizon_defaults_to_today() {
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
        let start = horizon_start(&args(&["rota-runner", "tune"]), thursday).unwrap();
        assert_eq!(start, thursday);

        let given = horizon_start(&args(&["rota-runner", "tune", "--week", "2026-11-02"]), thursday).unwrap();
        assert_eq!(given, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert!(horizon_start(&args(&["rota-runner", "tune", "--week", "soon"]), thursday).is_err());
    }
}
