use crate::{
    error::RotaResult,
    ledger::PointsPolicy,
    model::{ScoreWeights, ShiftKind},
    ports::ParameterStore,
    queue::SelectionStrategy,
    scoring::FairnessCoefficients,
    stats::DEFAULT_WINDOW_DAYS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Qualification codes the shift kinds depend on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftRequirements {
    /// Every EARLY assignee must hold this.
    pub early_qualification: String,
    /// Every LATE shift needs at least one titular holding this.
    pub late_qualification: String,
}

impl Default for ShiftRequirements {
    fn default() -> Self {
        Self {
            early_qualification: "FLOOR".into(),
            late_qualification: "MAINT".into(),
        }
    }
}

impl ShiftRequirements {
    /// Qualification every individual assignee of `kind` must hold.
    pub fn mandatory_for(&self, kind: ShiftKind) -> Option<&str> {
        match kind {
            ShiftKind::Early => Some(&self.early_qualification),
            ShiftKind::Late | ShiftKind::Standby => None,
        }
    }

    /// Qualification the simplified simulator requires per assignee.
    pub fn simulated_for(&self, kind: ShiftKind) -> Option<&str> {
        match kind {
            ShiftKind::Early => Some(&self.early_qualification),
            ShiftKind::Late => Some(&self.late_qualification),
            ShiftKind::Standby => None,
        }
    }
}

/// How many titulars each working shift receives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitularCounts {
    pub early: usize,
    pub late: usize,
}

impl Default for TitularCounts {
    fn default() -> Self {
        Self { early: 2, late: 2 }
    }
}

impl TitularCounts {
    pub fn for_kind(&self, kind: ShiftKind) -> usize {
        match kind {
            ShiftKind::Early => self.early,
            ShiftKind::Late => self.late,
            ShiftKind::Standby => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TuningConfig {
    pub generations: usize,
    pub weeks: usize,
    /// Half-width of the uniform mutation applied to each weight.
    pub intensity: f64,
    pub seed: u64,
    pub simulate_standby: bool,
    pub standby_activation_probability: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            generations: 30,
            weeks: 100,
            intensity: 0.2,
            seed: 42,
            simulate_standby: false,
            standby_activation_probability: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RotaConfig {
    pub stats_window_days: i64,
    pub suggestion_window_days: i64,
    pub requirements: ShiftRequirements,
    pub titulars: TitularCounts,
    pub strategy: SelectionStrategy,
    pub coefficients: FairnessCoefficients,
    pub points: PointsPolicy,
    pub tuning: TuningConfig,
}

impl Default for RotaConfig {
    fn default() -> Self {
        Self {
            stats_window_days: DEFAULT_WINDOW_DAYS,
            suggestion_window_days: 7,
            requirements: ShiftRequirements::default(),
            titulars: TitularCounts::default(),
            strategy: SelectionStrategy::FairnessScored,
            coefficients: FairnessCoefficients::default(),
            points: PointsPolicy::default(),
            tuning: TuningConfig::default(),
        }
    }
}

impl RotaConfig {
    /// Load from the data/ directory.
    /// In tests, use RotaConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/rota.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RotaConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        anyhow::ensure!(config.stats_window_days > 0, "stats_window_days must be positive");
        anyhow::ensure!(config.tuning.intensity >= 0.0, "tuning.intensity must be non-negative");
        Ok(config)
    }

    /// Config with hardcoded defaults and a short tuning horizon for tests.
    pub fn default_test() -> Self {
        Self {
            tuning: TuningConfig {
                generations: 8,
                weeks: 12,
                seed: 0xC0FFEE,
                ..TuningConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Active weights kept as a JSON file next to the config.
#[derive(Debug, Clone)]
pub struct JsonParameterStore {
    path: PathBuf,
}

impl JsonParameterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_data_dir(data_dir: &str) -> Self {
        Self::new(Path::new(data_dir).join("weights.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ParameterStore for JsonParameterStore {
    /// A missing file means nothing has been tuned yet.
    fn load(&self) -> RotaResult<ScoreWeights> {
        if !self.path.exists() {
            return Ok(ScoreWeights::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, weights: &ScoreWeights) -> RotaResult<()> {
        let json = serde_json::to_string_pretty(weights)?;
        std::fs::write(&self.path, json)?;
        log::info!("weights saved to {}", self.path.display());
        Ok(())
    }
}
