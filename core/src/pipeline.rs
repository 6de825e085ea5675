//! The decision pipeline: Loader → Predictor → Value/Decision → Aggregator.
//!
//! RULES:
//!   - Each stage consumes the prior stage's output and returns a new value.
//!   - The predictor runs exactly once per table; every decision or sweep
//!     after that is a pure re-computation over the same `ScoredTable`.
//!   - Nothing is carried between runs.

use crate::{
    config::{DecisionParams, RunConfig},
    decision::{self, DecisionRecord},
    error::RetentionResult,
    loader::CustomerTable,
    predictor::ChurnPredictor,
    summary::{self, BusinessSummary, SensitivityPoint},
};
use serde::Serialize;

/// Cleaned table plus its validated churn probabilities.
#[derive(Debug, Clone)]
pub struct ScoredTable {
    table:         CustomerTable,
    probabilities: Vec<f64>,
}

impl ScoredTable {
    /// Pair a table with externally produced probabilities, enforcing the
    /// predictor contract.
    pub fn new(table: CustomerTable, probabilities: Vec<f64>) -> RetentionResult<Self> {
        decision::validate_probabilities(&table, &probabilities)?;
        Ok(Self { table, probabilities })
    }

    pub fn table(&self) -> &CustomerTable { &self.table }

    pub fn probabilities(&self) -> &[f64] { &self.probabilities }

    pub fn decide(&self, params: &DecisionParams) -> RetentionResult<Vec<DecisionRecord>> {
        decision::decide(&self.table, &self.probabilities, params)
    }

    pub fn sensitivity(
        &self,
        costs: &[f64],
        params: &DecisionParams,
    ) -> RetentionResult<Vec<SensitivityPoint>> {
        summary::sensitivity_sweep(&self.table, &self.probabilities, costs, params)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub params:      DecisionParams,
    pub decisions:   Vec<DecisionRecord>,
    pub summary:     BusinessSummary,
    pub sensitivity: Vec<SensitivityPoint>,
}

pub struct DecisionPipeline {
    predictor: Box<dyn ChurnPredictor>,
}

impl DecisionPipeline {
    pub fn new(predictor: Box<dyn ChurnPredictor>) -> Self {
        Self { predictor }
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    /// Run the predictor once and validate its output.
    pub fn score(&self, table: CustomerTable) -> RetentionResult<ScoredTable> {
        let probabilities = self.predictor.predict(&table)?;
        log::info!(
            "pipeline: {} scored {} customers",
            self.predictor.name(),
            probabilities.len()
        );
        ScoredTable::new(table, probabilities)
    }

    /// Full run: score, decide, summarise, sweep.
    pub fn run(&self, table: CustomerTable, config: &RunConfig) -> RetentionResult<RunOutcome> {
        config.validate()?;
        config.decision.warn_if_unusual();

        let scored = self.score(table)?;
        let decisions = scored.decide(&config.decision)?;
        let summary = summary::summarize(&decisions);
        let sensitivity = scored.sensitivity(&config.sensitivity_costs, &config.decision)?;

        log::info!(
            "pipeline: saveable={} not_worth_saving={} loyal={} net_gain={:.2}",
            summary.saveable_customers,
            summary.not_worth_saving,
            summary.loyal_customers,
            summary.total_expected_net_gain,
        );

        Ok(RunOutcome {
            params: config.decision,
            decisions,
            summary,
            sensitivity,
        })
    }
}
