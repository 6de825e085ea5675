//! Decision engine: expected net gain of intervention and segment assignment.
//!
//! For each customer:
//!   expected_revenue_saved = churn_probability × CLV
//!   net_gain               = expected_revenue_saved − intervention_cost
//!
//! Segment precedence (first match wins):
//!   1. churn_probability < threshold  → Loyal
//!   2. net_gain > 0                   → Saveable
//!   3. otherwise                      → Not Worth Saving
//!
//! A Loyal customer's net gain is never consulted.

use crate::{
    config::DecisionParams,
    error::{RetentionError, RetentionResult},
    loader::{CustomerRecord, CustomerTable},
    types::{CustomerId, Months},
    value,
};
use serde::{Deserialize, Serialize};
use std::{fmt, io::Write};

// ── Segment ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "Saveable")]
    Saveable,
    #[serde(rename = "Not Worth Saving")]
    NotWorthSaving,
    #[serde(rename = "Loyal")]
    Loyal,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Saveable, Segment::NotWorthSaving, Segment::Loyal];

    /// Pure, total segment rule over (probability, net gain, threshold).
    pub fn assign(churn_probability: f64, net_gain: f64, churn_threshold: f64) -> Self {
        match (churn_probability < churn_threshold, net_gain > 0.0) {
            (true, _)      => Segment::Loyal,
            (false, true)  => Segment::Saveable,
            (false, false) => Segment::NotWorthSaving,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Saveable       => "Saveable",
            Segment::NotWorthSaving => "Not Worth Saving",
            Segment::Loyal          => "Loyal",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Decision record ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(rename = "customerID")]
    pub customer_id:            CustomerId,
    #[serde(rename = "tenure")]
    pub tenure:                 Months,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges:        f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges:          f64,
    #[serde(rename = "P_churn")]
    pub churn_probability:      f64,
    #[serde(rename = "CLV")]
    pub clv:                    f64,
    #[serde(rename = "ExpectedRevenueSaved")]
    pub expected_revenue_saved: f64,
    #[serde(rename = "NetGain")]
    pub net_gain:               f64,
    #[serde(rename = "Segment")]
    pub segment:                Segment,
}

impl DecisionRecord {
    fn build(
        record: &CustomerRecord,
        churn_probability: f64,
        clv: f64,
        params: &DecisionParams,
    ) -> Self {
        let expected_revenue_saved = churn_probability * clv;
        let net_gain = expected_revenue_saved - params.intervention_cost;
        Self {
            customer_id: record.customer_id.clone(),
            tenure: record.tenure,
            monthly_charges: record.monthly_charges,
            total_charges: record.total_charges,
            churn_probability,
            clv,
            expected_revenue_saved,
            net_gain,
            segment: Segment::assign(churn_probability, net_gain, params.churn_threshold),
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Check the predictor's output against its contract: one finite
/// probability in [0, 1] per customer. Violations are fatal; values are
/// never clamped.
pub fn validate_probabilities(table: &CustomerTable, probabilities: &[f64]) -> RetentionResult<()> {
    if probabilities.len() != table.len() {
        return Err(RetentionError::PredictionCountMismatch {
            expected: table.len(),
            actual:   probabilities.len(),
        });
    }
    for (row, (record, &p)) in table.records.iter().zip(probabilities).enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(RetentionError::ProbabilityOutOfRange {
                row,
                customer_id: record.customer_id.clone(),
                value: p,
            });
        }
    }
    Ok(())
}

/// Produce one decision record per customer, in input order.
pub fn decide(
    table: &CustomerTable,
    probabilities: &[f64],
    params: &DecisionParams,
) -> RetentionResult<Vec<DecisionRecord>> {
    params.validate()?;
    validate_probabilities(table, probabilities)?;

    let clv = value::compute_clv(table, params.margin);
    let decisions = table
        .records
        .iter()
        .zip(probabilities)
        .zip(clv)
        .map(|((record, &p), clv)| DecisionRecord::build(record, p, clv, params))
        .collect::<Vec<_>>();

    log::debug!(
        "decision: {} records (cost={}, threshold={}, margin={})",
        decisions.len(),
        params.intervention_cost,
        params.churn_threshold,
        params.margin,
    );
    Ok(decisions)
}

/// Export the decision table as CSV with a header row.
pub fn write_decisions_csv<W: Write>(writer: W, decisions: &[DecisionRecord]) -> RetentionResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for decision in decisions {
        csv_writer.serialize(decision)?;
    }
    csv_writer.flush()?;
    Ok(())
}
