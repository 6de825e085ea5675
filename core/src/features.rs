//! Feature encoding and scaling for the churn predictor.
//!
//! Both the schema (which columns, which categorical levels) and the
//! scaler statistics are fitted once on the training table and persisted
//! with the model. Inference only ever calls `encode` and `transform`.

use crate::{
    error::{RetentionError, RetentionResult},
    loader::{CustomerTable, COL_MONTHLY_CHARGES, COL_TENURE, COL_TOTAL_CHARGES},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Scale used for zero-variance columns.
const UNIT_SCALE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub column: String,
    /// Sorted observed levels. The first is the dropped reference level.
    pub levels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Pass-through columns treated as numbers, after the three core columns.
    pub numeric_extras: Vec<String>,
    pub categorical:    Vec<CategoricalFeature>,
}

impl FeatureSchema {
    /// Derive the schema from a training table. A pass-through column is
    /// numeric when every one of its values parses as a finite number.
    pub fn fit(table: &CustomerTable) -> Self {
        let mut numeric_extras = Vec::new();
        let mut categorical = Vec::new();

        for (i, column) in table.extra_columns.iter().enumerate() {
            let values = || table.records.iter().map(move |r| r.extras[i].trim());
            let all_numeric = !table.is_empty()
                && values().all(|v| v.parse::<f64>().map(f64::is_finite).unwrap_or(false));

            if all_numeric {
                numeric_extras.push(column.clone());
            } else {
                let levels: BTreeSet<&str> = values().collect();
                categorical.push(CategoricalFeature {
                    column: column.clone(),
                    levels: levels.into_iter().map(String::from).collect(),
                });
            }
        }

        Self { numeric_extras, categorical }
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = [COL_TENURE, COL_MONTHLY_CHARGES, COL_TOTAL_CHARGES]
            .iter()
            .map(|s| s.to_string())
            .collect();
        names.extend(self.numeric_extras.iter().cloned());
        for cat in &self.categorical {
            names.extend(cat.levels.iter().skip(1).map(|l| format!("{}_{l}", cat.column)));
        }
        names
    }

    pub fn width(&self) -> usize {
        3 + self.numeric_extras.len()
            + self.categorical.iter().map(|c| c.levels.len().saturating_sub(1)).sum::<usize>()
    }

    /// Encode every row of `table` into a dense feature matrix.
    /// Unseen categorical levels encode as all zeros.
    pub fn encode(&self, table: &CustomerTable) -> RetentionResult<Vec<Vec<f64>>> {
        let position = |column: &str| {
            table
                .extra_columns
                .iter()
                .position(|c| c == column)
                .ok_or_else(|| {
                    RetentionError::SchemaMismatch(format!("feature column '{column}' missing from input"))
                })
        };
        let numeric_idx = self
            .numeric_extras
            .iter()
            .map(|c| position(c.as_str()))
            .collect::<RetentionResult<Vec<_>>>()?;
        let categorical_idx = self
            .categorical
            .iter()
            .map(|c| position(c.column.as_str()))
            .collect::<RetentionResult<Vec<_>>>()?;

        let mut matrix = Vec::with_capacity(table.len());
        for (row, record) in table.records.iter().enumerate() {
            let mut features = Vec::with_capacity(self.width());
            features.push(record.tenure as f64);
            features.push(record.monthly_charges);
            features.push(record.total_charges);

            for (column, &i) in self.numeric_extras.iter().zip(&numeric_idx) {
                let raw = record.extras[i].trim();
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        RetentionError::SchemaMismatch(format!(
                            "row {row}: numeric feature '{column}' has value '{raw}'"
                        ))
                    })?;
                features.push(value);
            }

            for (cat, &i) in self.categorical.iter().zip(&categorical_idx) {
                let raw = record.extras[i].trim();
                features.extend(
                    cat.levels
                        .iter()
                        .skip(1)
                        .map(|level| if level == raw { 1.0 } else { 0.0 }),
                );
            }

            matrix.push(features);
        }
        Ok(matrix)
    }
}

// ── Scaler ───────────────────────────────────────────────────────────────────

/// Per-column standardisation: (x − mean) / scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means:  Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on a training matrix using the population standard deviation.
    pub fn fit(matrix: &[Vec<f64>], width: usize) -> Self {
        let n = matrix.len() as f64;
        let mut means = vec![0.0; width];
        let mut scales = vec![UNIT_SCALE; width];
        if matrix.is_empty() {
            return Self { means, scales };
        }

        for row in matrix {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        for (j, scale) in scales.iter_mut().enumerate() {
            let var = matrix.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            *scale = if std > 1e-12 { std } else { UNIT_SCALE };
        }
        Self { means, scales }
    }

    pub fn transform_row(&self, row: &[f64]) -> RetentionResult<Vec<f64>> {
        if row.len() != self.means.len() {
            return Err(RetentionError::SchemaMismatch(format!(
                "scaler fitted on {} features, got {}",
                self.means.len(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn transform(&self, matrix: &[Vec<f64>]) -> RetentionResult<Vec<Vec<f64>>> {
        matrix.iter().map(|row| self.transform_row(row)).collect()
    }
}
