//! Run configuration: decision parameters and the sensitivity sweep.
//!
//! Every field has a default, so a run with no configuration at all
//! behaves exactly like `RunConfig::default()`.

use crate::error::{RetentionError, RetentionResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_INTERVENTION_COST: f64 = 50.0;
pub const DEFAULT_CHURN_THRESHOLD:   f64 = 0.5;
pub const DEFAULT_MARGIN:            f64 = 0.3;
pub const DEFAULT_SENSITIVITY_COSTS: [f64; 3] = [20.0, 50.0, 100.0];

/// Operating ranges the retention team tunes within.
/// Values outside are accepted but logged.
pub const RECOMMENDED_COST_RANGE:      (f64, f64) = (10.0, 150.0);
pub const RECOMMENDED_THRESHOLD_RANGE: (f64, f64) = (0.3, 0.7);

// ── Decision parameters ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionParams {
    /// Fixed cost of attempting to retain one customer.
    pub intervention_cost: f64,
    /// Customers with churn probability below this are `Loyal`.
    pub churn_threshold:   f64,
    /// Fraction of gross remaining revenue counted as value.
    pub margin:            f64,
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            intervention_cost: DEFAULT_INTERVENTION_COST,
            churn_threshold:   DEFAULT_CHURN_THRESHOLD,
            margin:            DEFAULT_MARGIN,
        }
    }
}

impl DecisionParams {
    pub fn with_cost(self, intervention_cost: f64) -> Self {
        Self { intervention_cost, ..self }
    }

    pub fn with_threshold(self, churn_threshold: f64) -> Self {
        Self { churn_threshold, ..self }
    }

    pub fn with_margin(self, margin: f64) -> Self {
        Self { margin, ..self }
    }

    /// Reject values outside the declared domain of the decision engine.
    pub fn validate(&self) -> RetentionResult<()> {
        if !self.intervention_cost.is_finite() || self.intervention_cost < 0.0 {
            return Err(RetentionError::InvalidConfig(format!(
                "intervention_cost must be a finite value >= 0, got {}",
                self.intervention_cost
            )));
        }
        if !(0.0..=1.0).contains(&self.churn_threshold) {
            return Err(RetentionError::InvalidConfig(format!(
                "churn_threshold must be in [0, 1], got {}",
                self.churn_threshold
            )));
        }
        if !(self.margin > 0.0 && self.margin <= 1.0) {
            return Err(RetentionError::InvalidConfig(format!(
                "margin must be in (0, 1], got {}",
                self.margin
            )));
        }
        Ok(())
    }

    /// Log a warning for each parameter outside its recommended range.
    /// Returns the number of warnings emitted.
    pub fn warn_if_unusual(&self) -> usize {
        let mut warnings = 0;
        let (lo, hi) = RECOMMENDED_COST_RANGE;
        if self.intervention_cost < lo || self.intervention_cost > hi {
            log::warn!(
                "intervention_cost={} is outside the recommended range {lo}-{hi}",
                self.intervention_cost
            );
            warnings += 1;
        }
        let (lo, hi) = RECOMMENDED_THRESHOLD_RANGE;
        if self.churn_threshold < lo || self.churn_threshold > hi {
            log::warn!(
                "churn_threshold={} is outside the recommended range {lo}-{hi}",
                self.churn_threshold
            );
            warnings += 1;
        }
        warnings
    }
}

// ── Run configuration file ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(flatten)]
    pub decision:          DecisionParams,
    pub sensitivity_costs: Vec<f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            decision:          DecisionParams::default(),
            sensitivity_costs: DEFAULT_SENSITIVITY_COSTS.to_vec(),
        }
    }
}

impl RunConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> RetentionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RetentionResult<()> {
        self.decision.validate()?;
        if let Some(bad) = self
            .sensitivity_costs
            .iter()
            .find(|c| !c.is_finite() || **c < 0.0)
        {
            return Err(RetentionError::InvalidConfig(format!(
                "sensitivity cost must be a finite value >= 0, got {bad}"
            )));
        }
        Ok(())
    }
}
