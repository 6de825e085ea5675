//! Churn predictor: the collaborator that turns a cleaned table into one
//! churn probability per customer.
//!
//! The predictor is built once from a persisted `ModelArtifact` and handed
//! to the pipeline. Nothing here reads from disk at prediction time, and
//! nothing is refitted per batch: schema and scaler come from training.

use crate::{
    error::{RetentionError, RetentionResult},
    features::{FeatureSchema, StandardScaler},
    loader::CustomerTable,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MODEL_FORMAT_VERSION: u32 = 1;

/// The contract every predictor must fulfill.
pub trait ChurnPredictor {
    /// Stable name used in logs and the run ledger.
    fn name(&self) -> &str;

    /// Return one probability in [0, 1] per row of `table`, in row order.
    fn predict(&self, table: &CustomerTable) -> RetentionResult<Vec<f64>>;
}

// ── Model artifact ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub schema:         FeatureSchema,
    pub scaler:         StandardScaler,
    pub weights:        Vec<f64>,
    pub intercept:      f64,
    pub trained_rows:   usize,
}

impl ModelArtifact {
    pub fn save(&self, path: impl AsRef<Path>) -> RetentionResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("Cannot write model artifact {}: {e}", path.display()))?;
        log::info!("model: artifact saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> RetentionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read model artifact {}: {e}", path.display()))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)?;
        artifact.check()?;
        Ok(artifact)
    }

    /// Internal consistency between schema, scaler and weights.
    pub fn check(&self) -> RetentionResult<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(RetentionError::SchemaMismatch(format!(
                "unsupported model format version {} (expected {MODEL_FORMAT_VERSION})",
                self.format_version
            )));
        }
        let width = self.schema.width();
        if self.weights.len() != width
            || self.scaler.means.len() != width
            || self.scaler.scales.len() != width
        {
            return Err(RetentionError::SchemaMismatch(format!(
                "schema has {width} features but weights={} means={} scales={}",
                self.weights.len(),
                self.scaler.means.len(),
                self.scaler.scales.len()
            )));
        }
        Ok(())
    }
}

// ── Logistic predictor ───────────────────────────────────────────────────────

pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

pub fn linear_score(weights: &[f64], intercept: f64, features: &[f64]) -> f64 {
    intercept + weights.iter().zip(features).map(|(w, x)| w * x).sum::<f64>()
}

pub struct LogisticPredictor {
    artifact: ModelArtifact,
}

impl LogisticPredictor {
    pub fn from_artifact(artifact: ModelArtifact) -> RetentionResult<Self> {
        artifact.check()?;
        Ok(Self { artifact })
    }

    /// Read the artifact once; the predictor is reused for every batch.
    pub fn load(path: impl AsRef<Path>) -> RetentionResult<Self> {
        let artifact = ModelArtifact::load(path)?;
        log::info!(
            "model: loaded logistic model ({} features, trained on {} rows)",
            artifact.weights.len(),
            artifact.trained_rows,
        );
        Ok(Self { artifact })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

impl ChurnPredictor for LogisticPredictor {
    fn name(&self) -> &str { "logistic" }

    fn predict(&self, table: &CustomerTable) -> RetentionResult<Vec<f64>> {
        let raw = self.artifact.schema.encode(table)?;
        let scaled = self.artifact.scaler.transform(&raw)?;
        Ok(scaled
            .iter()
            .map(|x| sigmoid(linear_score(&self.artifact.weights, self.artifact.intercept, x)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_customers_from_reader;

    fn artifact() -> ModelArtifact {
        ModelArtifact {
            format_version: MODEL_FORMAT_VERSION,
            schema: FeatureSchema { numeric_extras: vec![], categorical: vec![] },
            scaler: StandardScaler { means: vec![10.0, 50.0, 500.0], scales: vec![10.0, 25.0, 500.0] },
            weights: vec![-1.0, 0.5, 0.0],
            intercept: 0.0,
            trained_rows: 3,
        }
    }

    #[test]
    fn sigmoid_is_bounded_and_symmetric() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
    }

    #[test]
    fn predicts_with_persisted_scaler() {
        let predictor = LogisticPredictor::from_artifact(artifact()).unwrap();
        let csv = "customerID,tenure,MonthlyCharges,TotalCharges\nA,10,50,500\nB,0,100,0\n";
        let (table, _) = load_customers_from_reader(csv.as_bytes()).unwrap();
        let p = predictor.predict(&table).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0], 0.5);
        // z = -1 × (−1) + 0.5 × 2 = 2
        assert!((p[1] - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn inconsistent_artifact_is_rejected() {
        let mut a = artifact();
        a.weights.pop();
        assert!(matches!(LogisticPredictor::from_artifact(a), Err(RetentionError::SchemaMismatch(_))));

        let mut a = artifact();
        a.format_version = 99;
        assert!(a.check().is_err());
    }

    #[test]
    fn missing_artifact_file_is_fatal() {
        assert!(LogisticPredictor::load("/nonexistent/model.json").is_err());
    }
}
