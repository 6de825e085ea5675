//! Summary aggregator: portfolio-level business metrics.
//!
//! Reductions here are counts and sums only. The net-gain sum runs over
//! values sorted by `f64::total_cmp`, so row order cannot change the
//! rounded total.

use crate::{
    config::DecisionParams,
    decision::{self, DecisionRecord, Segment},
    error::RetentionResult,
    loader::CustomerTable,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessSummary {
    #[serde(rename = "Total Customers")]
    pub total_customers:         usize,
    #[serde(rename = "Saveable Customers")]
    pub saveable_customers:      usize,
    #[serde(rename = "Not Worth Saving")]
    pub not_worth_saving:        usize,
    #[serde(rename = "Loyal Customers")]
    pub loyal_customers:         usize,
    #[serde(rename = "Total Expected Net Gain")]
    pub total_expected_net_gain: f64,
}

impl BusinessSummary {
    pub fn count(&self, segment: Segment) -> usize {
        match segment {
            Segment::Saveable       => self.saveable_customers,
            Segment::NotWorthSaving => self.not_worth_saving,
            Segment::Loyal          => self.loyal_customers,
        }
    }

    /// Percentage of all customers in `segment`; 0.0 for an empty portfolio.
    pub fn share(&self, segment: Segment) -> f64 {
        if self.total_customers == 0 {
            return 0.0;
        }
        self.count(segment) as f64 / self.total_customers as f64 * 100.0
    }
}

/// Round half away from zero to two decimal places. Never returns `-0.0`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

/// Unrounded sum of net gain over `Saveable` customers.
pub fn saveable_net_gain(decisions: &[DecisionRecord]) -> f64 {
    let mut gains: Vec<f64> = decisions
        .iter()
        .filter(|d| d.segment == Segment::Saveable)
        .map(|d| d.net_gain)
        .collect();
    gains.sort_by(f64::total_cmp);
    gains.iter().fold(0.0, |acc, g| acc + g)
}

pub fn summarize(decisions: &[DecisionRecord]) -> BusinessSummary {
    let mut summary = BusinessSummary {
        total_customers: decisions.len(),
        ..BusinessSummary::default()
    };
    for d in decisions {
        match d.segment {
            Segment::Saveable       => summary.saveable_customers += 1,
            Segment::NotWorthSaving => summary.not_worth_saving += 1,
            Segment::Loyal          => summary.loyal_customers += 1,
        }
    }
    summary.total_expected_net_gain = round2(saveable_net_gain(decisions));
    summary
}

// ── Sensitivity analysis ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub intervention_cost:  f64,
    pub saveable_customers: usize,
    pub total_net_gain:     f64,
}

/// Re-run the decision engine once per cost over the same scored table.
/// Threshold and margin come from `params`; each point is independent.
pub fn sensitivity_sweep(
    table: &CustomerTable,
    probabilities: &[f64],
    costs: &[f64],
    params: &DecisionParams,
) -> RetentionResult<Vec<SensitivityPoint>> {
    costs
        .iter()
        .map(|&cost| {
            let decisions = decision::decide(table, probabilities, &params.with_cost(cost))?;
            let summary = summarize(&decisions);
            log::debug!(
                "sensitivity: cost={cost} saveable={} net_gain={:.2}",
                summary.saveable_customers,
                summary.total_expected_net_gain,
            );
            Ok(SensitivityPoint {
                intervention_cost:  cost,
                saveable_customers: summary.saveable_customers,
                total_net_gain:     summary.total_expected_net_gain,
            })
        })
        .collect()
}
