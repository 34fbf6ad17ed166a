//! Offline weight tuning by stochastic hill-climbing.
//!
//! Each generation mutates the best-known weights, simulates `weeks`
//! synthetic weeks with them and keeps the mutation only if injustice
//! strictly improves. Greedy, non-restarting, no convergence guarantee.
//!
//! The baseline is evaluated first, so the result is never worse than it.
//! Every evaluation replays the same standby-activation stream, so
//! candidates are compared on common random numbers.

use crate::{
    config::{ShiftRequirements, TuningConfig},
    metric::injustice_of,
    model::{Person, ScoreWeights},
    ports::AvailabilityOracle,
    rng::{RandomSource, RngBank, RngStream},
    simulation::SimulationEngine,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::{
    convert::Infallible,
    sync::atomic::{AtomicBool, Ordering},
};

/// Add an independent uniform draw in [-intensity, +intensity] to each weight.
pub fn mutate(weights: &ScoreWeights, intensity: f64, rng: &mut dyn RandomSource) -> ScoreWeights {
    ScoreWeights {
        points_weight: weights.points_weight + rng.uniform(-intensity, intensity),
        special_weight: weights.special_weight + rng.uniform(-intensity, intensity),
        standby_weight: weights.standby_weight + rng.uniform(-intensity, intensity),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub generation: usize,
    pub candidate: ScoreWeights,
    pub injustice: f64,
    pub improved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TuningReport {
    pub run_id: String,
    pub baseline: ScoreWeights,
    pub baseline_injustice: f64,
    pub best: ScoreWeights,
    pub best_injustice: f64,
    pub history: Vec<GenerationResult>,
}

impl TuningReport {
    pub fn injustice_history(&self) -> Vec<f64> {
        self.history.iter().map(|g| g.injustice).collect()
    }

    pub fn improvements(&self) -> usize {
        self.history.iter().filter(|g| g.improved).count()
    }
}

pub struct ParameterTuner<'a> {
    roster: &'a [Person],
    requirements: &'a ShiftRequirements,
    availability: &'a dyn AvailabilityOracle,
    config: TuningConfig,
    start: NaiveDate,
}

impl<'a> ParameterTuner<'a> {
    /// `start` is the first synthetic week's first day (usually today).
    pub fn new(
        roster: &'a [Person],
        requirements: &'a ShiftRequirements,
        availability: &'a dyn AvailabilityOracle,
        config: TuningConfig,
        start: NaiveDate,
    ) -> Self {
        Self {
            roster,
            requirements,
            availability,
            config,
            start,
        }
    }

    /// Injustice of one weight set over the configured horizon.
    pub fn evaluate(&self, weights: &ScoreWeights) -> f64 {
        let mut engine = SimulationEngine::new(self.roster, *weights, self.requirements, self.availability);
        if self.config.simulate_standby {
            engine = engine.with_standby(self.config.standby_activation_probability);
        }
        let mut standby_rng = RngBank::new(self.config.seed).for_stream(RngStream::StandbyActivation);
        let outcome = engine.run(self.start, self.config.weeks, &mut standby_rng);
        injustice_of(&outcome.loads)
    }

    pub fn tune(&self, baseline: ScoreWeights, rng: &mut dyn RandomSource) -> TuningReport {
        match self.climb(baseline, rng, |_| Ok::<(), Infallible>(())) {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    /// Returns `None` if `cancel` is raised; the best-so-far is discarded.
    pub fn tune_with_cancel(
        &self,
        baseline: ScoreWeights,
        rng: &mut dyn RandomSource,
        cancel: &AtomicBool,
    ) -> Option<TuningReport> {
        self.climb(baseline, rng, |generation| {
            if cancel.load(Ordering::Relaxed) {
                log::info!("tuner cancelled at generation {generation}");
                return Err(());
            }
            Ok(())
        })
        .ok()
    }

    /// `before_generation` runs ahead of every generation; an error stops the climb.
    fn climb<E>(
        &self,
        baseline: ScoreWeights,
        rng: &mut dyn RandomSource,
        mut before_generation: impl FnMut(usize) -> Result<(), E>,
    ) -> Result<TuningReport, E> {
        let baseline_injustice = self.evaluate(&baseline);
        log::info!("tuner baseline {baseline:?} -> injustice {baseline_injustice:.5}");

        let mut best = baseline;
        let mut best_injustice = baseline_injustice;
        let mut history = Vec::with_capacity(self.config.generations);

        for generation in 0..self.config.generations {
            before_generation(generation)?;

            let candidate = mutate(&best, self.config.intensity, rng);
            let injustice = self.evaluate(&candidate);
            let improved = injustice < best_injustice;

            log::debug!("generation {generation} -> injustice {injustice:.5}");
            if improved {
                log::info!("generation {generation}: new best {candidate:?} ({injustice:.5})");
                best = candidate;
                best_injustice = injustice;
            }

            history.push(GenerationResult {
                generation,
                candidate,
                injustice,
                improved,
            });
        }

        Ok(TuningReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            baseline,
            baseline_injustice,
            best,
            best_injustice,
            history,
        })
    }
}
