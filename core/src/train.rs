//! Offline training of the logistic churn model.
//!
//! Fits the feature schema and scaler on the labeled table, then runs
//! mini-batch gradient descent on log-loss. Row order is reshuffled every
//! epoch from a seeded PCG stream, so the same seed gives the same model.

use crate::{
    error::{RetentionError, RetentionResult},
    features::{FeatureSchema, StandardScaler},
    loader::CustomerTable,
    predictor::{linear_score, sigmoid, ModelArtifact, MODEL_FORMAT_VERSION},
};
use rand::{seq::SliceRandom, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs:        usize,
    pub learning_rate: f64,
    /// L2 penalty on weights (not the intercept).
    pub l2:            f64,
    pub batch_size:    usize,
    pub seed:          u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs:        200,
            learning_rate: 0.1,
            l2:            0.0,
            batch_size:    64,
            seed:          42,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> RetentionResult<()> {
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(RetentionError::InvalidConfig(
                "epochs and batch_size must be > 0".into(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(RetentionError::InvalidConfig(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2 >= 0.0 && self.l2.is_finite()) {
            return Err(RetentionError::InvalidConfig(format!("l2 must be >= 0, got {}", self.l2)));
        }
        Ok(())
    }
}

/// Mean log-loss of a model over a scaled matrix.
pub fn log_loss(weights: &[f64], intercept: f64, matrix: &[Vec<f64>], labels: &[f64]) -> f64 {
    if matrix.is_empty() {
        return 0.0;
    }
    let eps = 1e-15;
    let total: f64 = matrix
        .iter()
        .zip(labels)
        .map(|(x, &y)| {
            let p = sigmoid(linear_score(weights, intercept, x)).clamp(eps, 1.0 - eps);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / matrix.len() as f64
}

pub fn train_logistic(table: &CustomerTable, config: &TrainConfig) -> RetentionResult<ModelArtifact> {
    config.validate()?;
    if table.is_empty() {
        return Err(RetentionError::InvalidConfig("cannot train on an empty table".into()));
    }
    let labels = table
        .records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            r.churn.map(f64::from).ok_or_else(|| {
                RetentionError::InvalidConfig(format!(
                    "row {row} (customer '{}') has no churn label",
                    r.customer_id
                ))
            })
        })
        .collect::<RetentionResult<Vec<f64>>>()?;

    let schema = FeatureSchema::fit(table);
    let width = schema.width();
    let raw = schema.encode(table)?;
    let scaler = StandardScaler::fit(&raw, width);
    let matrix = scaler.transform(&raw)?;

    let mut weights = vec![0.0; width];
    let mut intercept = 0.0;
    let mut order: Vec<usize> = (0..matrix.len()).collect();
    let mut rng = Pcg64Mcg::seed_from_u64(config.seed);

    log::info!(
        "train: {} rows, {width} features, {} epochs (lr={}, l2={}, batch={})",
        matrix.len(),
        config.epochs,
        config.learning_rate,
        config.l2,
        config.batch_size,
    );

    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);
        for batch in order.chunks(config.batch_size) {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for &i in batch {
                let err = sigmoid(linear_score(&weights, intercept, &matrix[i])) - labels[i];
                for (g, x) in grad_w.iter_mut().zip(&matrix[i]) {
                    *g += err * x;
                }
                grad_b += err;
            }
            let n = batch.len() as f64;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= config.learning_rate * (g / n + config.l2 * *w);
            }
            intercept -= config.learning_rate * grad_b / n;
        }

        if (epoch + 1) % 50 == 0 {
            log::debug!(
                "train: epoch {} loss={:.5}",
                epoch + 1,
                log_loss(&weights, intercept, &matrix, &labels)
            );
        }
    }

    log::info!(
        "train: final loss={:.5}",
        log_loss(&weights, intercept, &matrix, &labels)
    );

    Ok(ModelArtifact {
        format_version: MODEL_FORMAT_VERSION,
        schema,
        scaler,
        weights,
        intercept,
        trained_rows: matrix.len(),
    })
}
