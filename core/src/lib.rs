//! Churn retention decisioning.
//!
//! Estimates which customers are likely to churn and decides, per customer,
//! whether a retention intervention is financially worthwhile.

pub mod config;
pub mod decision;
pub mod error;
pub mod features;
pub mod loader;
pub mod pipeline;
pub mod predictor;
pub mod store;
pub mod summary;
pub mod train;
pub mod types;
pub mod value;

pub use config::{DecisionParams, RunConfig};
pub use decision::{DecisionRecord, Segment};
pub use error::{RetentionError, RetentionResult};
pub use loader::{CustomerRecord, CustomerTable, LoadReport};
pub use pipeline::{DecisionPipeline, RunOutcome, ScoredTable};
pub use predictor::{ChurnPredictor, LogisticPredictor, ModelArtifact};
pub use summary::{BusinessSummary, SensitivityPoint};
