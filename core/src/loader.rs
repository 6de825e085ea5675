//! Data loader: reads raw customer records and produces the cleaned table.
//!
//! Cleaning policy:
//!   1. Total charges that do not parse as a finite number are treated as
//!      missing, and the whole row is excluded (never imputed).
//!   2. The churn label `Yes`/`No` is encoded as 1/0. Any other text, or
//!      an absent label column, leaves the label unset.
//!   3. Tenure and monthly charges must parse as finite numbers, or the
//!      load fails with `MalformedField`. Out-of-range values pass through
//!      untouched. Extra columns are carried along verbatim.

use crate::{
    error::{RetentionError, RetentionResult},
    types::{CustomerId, Months},
};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, path::Path};

pub const COL_CUSTOMER_ID:     &str = "customerID";
pub const COL_TENURE:          &str = "tenure";
pub const COL_MONTHLY_CHARGES: &str = "MonthlyCharges";
pub const COL_TOTAL_CHARGES:   &str = "TotalCharges";
pub const COL_CHURN:           &str = "Churn";

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id:     CustomerId,
    pub tenure:          Months,
    pub monthly_charges: f64,
    pub total_charges:   f64,
    /// 1 = churned, 0 = retained. `None` at inference time.
    pub churn:           Option<u8>,
    /// Values of the pass-through columns, parallel to `CustomerTable::extra_columns`.
    pub extras:          Vec<String>,
}

/// The cleaned customer table. Row order is the input file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerTable {
    pub extra_columns: Vec<String>,
    pub records:       Vec<CustomerRecord>,
}

impl CustomerTable {
    pub fn new(extra_columns: Vec<String>, records: Vec<CustomerRecord>) -> Self {
        Self { extra_columns, records }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Value of a pass-through column for one record, if the column exists.
    pub fn extra_value<'a>(&self, record: &'a CustomerRecord, column: &str) -> Option<&'a str> {
        self.extra_columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| record.extras.get(i))
            .map(String::as_str)
    }

    /// True when every record carries a churn label.
    pub fn is_labeled(&self) -> bool {
        self.records.iter().all(|r| r.churn.is_some())
    }
}

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows_read:     usize,
    pub rows_excluded: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_excluded
    }
}

// ── Loading ──────────────────────────────────────────────────────────────────

/// Load and clean the customer dataset at `path`.
pub fn load_customers(path: impl AsRef<Path>) -> RetentionResult<(CustomerTable, LoadReport)> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open customer dataset {}: {e}", path.display()))?;
    log::info!("loader: reading {}", path.display());
    load_customers_from_reader(file)
}

/// Load and clean customer records from any CSV source with a header row.
pub fn load_customers_from_reader<R: Read>(
    reader: R,
) -> RetentionResult<(CustomerTable, LoadReport)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let layout = ColumnLayout::resolve(&headers)?;

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (idx, row) in csv_reader.records().enumerate() {
        let row = row?;
        let row_no = idx + 1;
        report.rows_read += 1;

        let Some(total_charges) = parse_total_charges(field(&row, layout.total_charges)) else {
            log::debug!(
                "loader: row {row_no} excluded, {COL_TOTAL_CHARGES}='{}'",
                field(&row, layout.total_charges)
            );
            report.rows_excluded += 1;
            continue;
        };

        let tenure_raw = field(&row, layout.tenure).trim();
        let tenure: Months = tenure_raw.parse().map_err(|_| RetentionError::MalformedField {
            row:    row_no,
            column: COL_TENURE.into(),
            value:  tenure_raw.into(),
        })?;

        let monthly_raw = field(&row, layout.monthly_charges).trim();
        let monthly_charges = monthly_raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RetentionError::MalformedField {
                row:    row_no,
                column: COL_MONTHLY_CHARGES.into(),
                value:  monthly_raw.into(),
            })?;

        records.push(CustomerRecord {
            customer_id: field(&row, layout.customer_id).to_string(),
            tenure,
            monthly_charges,
            total_charges,
            churn: layout.churn.and_then(|i| encode_churn_label(field(&row, i))),
            extras: layout.extras.iter().map(|&i| field(&row, i).to_string()).collect(),
        });
    }

    if report.rows_excluded > 0 {
        log::warn!(
            "loader: excluded {} of {} rows with unparseable {COL_TOTAL_CHARGES}",
            report.rows_excluded,
            report.rows_read,
        );
    }
    log::info!("loader: {} customers kept", report.rows_kept());

    let extra_columns = layout.extras.iter().map(|&i| headers[i].to_string()).collect();
    Ok((CustomerTable::new(extra_columns, records), report))
}

/// Coerce the total-charges text to a number; `None` is the missing marker.
pub fn parse_total_charges(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `Yes` → 1, `No` → 0, anything else → unset.
pub fn encode_churn_label(raw: &str) -> Option<u8> {
    match raw.trim() {
        "Yes" => Some(1),
        "No"  => Some(0),
        _     => None,
    }
}

fn field(row: &csv::StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("")
}

struct ColumnLayout {
    customer_id:     usize,
    tenure:          usize,
    monthly_charges: usize,
    total_charges:   usize,
    churn:           Option<usize>,
    extras:          Vec<usize>,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> RetentionResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| RetentionError::MissingColumn { column: name.into() })
        };

        let customer_id     = require(COL_CUSTOMER_ID)?;
        let tenure          = require(COL_TENURE)?;
        let monthly_charges = require(COL_MONTHLY_CHARGES)?;
        let total_charges   = require(COL_TOTAL_CHARGES)?;
        let churn           = find(COL_CHURN);

        let known = [Some(customer_id), Some(tenure), Some(monthly_charges), Some(total_charges), churn];
        let extras = (0..headers.len())
            .filter(|i| !known.contains(&Some(*i)))
            .collect();

        Ok(Self { customer_id, tenure, monthly_charges, total_charges, churn, extras })
    }
}
