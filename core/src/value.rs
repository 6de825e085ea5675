//! Value estimator: batch-relative customer lifetime value.
//!
//! CLV here is a deliberate simplification, not a survival forecast:
//!
//!   remaining_months = max(1, avg_tenure − tenure)
//!   CLV              = monthly_charges × remaining_months × margin
//!
//! `avg_tenure` is computed over the whole batch, so the same customer can
//! have a different CLV in a different batch.

use crate::loader::{CustomerRecord, CustomerTable};

/// Remaining months never drop below this.
pub const MIN_REMAINING_MONTHS: f64 = 1.0;

/// Mean tenure across the table; 0.0 for an empty table.
pub fn average_tenure(table: &CustomerTable) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    let total: f64 = table.records.iter().map(|r| r.tenure as f64).sum();
    total / table.len() as f64
}

pub fn remaining_months(avg_tenure: f64, tenure: f64) -> f64 {
    (avg_tenure - tenure).max(MIN_REMAINING_MONTHS)
}

/// CLV of one customer given the batch average tenure.
pub fn customer_clv(record: &CustomerRecord, avg_tenure: f64, margin: f64) -> f64 {
    let gross_value = record.monthly_charges * remaining_months(avg_tenure, record.tenure as f64);
    gross_value * margin
}

/// CLV for every customer, in table order.
pub fn compute_clv(table: &CustomerTable, margin: f64) -> Vec<f64> {
    let avg_tenure = average_tenure(table);
    log::debug!("value: avg_tenure={avg_tenure:.2} over {} customers", table.len());
    table
        .records
        .iter()
        .map(|r| customer_clv(r, avg_tenure, margin))
        .collect()
}
