//! Command-line interface definitions and argument parsing

use clap::{Args, Parser, Subcommand};
use retention_core::{train::TrainConfig, RetentionResult, RunConfig};
use std::path::PathBuf;

/// Churn intervention decisions: who to save, and whether it pays
#[derive(Parser, Debug)]
#[command(name = "retention", version, about, long_about = None)]
pub struct Cli {
    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score customers and decide who is worth a retention intervention
    Decide(DecideArgs),
    /// Fit the churn model offline and save its artifact
    Train(TrainArgs),
    /// List runs recorded in a ledger database
    Runs {
        #[arg(long)]
        db: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct DecideArgs {
    /// Path to the customer CSV file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to the trained model artifact (JSON)
    #[arg(short, long, default_value = "models/churn_model.json")]
    pub model: PathBuf,

    /// Optional JSON run configuration; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Intervention cost per customer (recommended 10-150)
    #[arg(long)]
    pub cost: Option<f64>,

    /// Churn risk threshold (recommended 0.3-0.7)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Margin applied to gross remaining revenue, in (0, 1]
    #[arg(long)]
    pub margin: Option<f64>,

    /// Comma-separated intervention costs for the sensitivity table
    /// Example: --sweep "20,50,100"
    #[arg(long, value_delimiter = ',')]
    pub sweep: Option<Vec<f64>>,

    /// Write the decision table to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Record the run in this SQLite ledger
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Print the first N decisions
    #[arg(long, default_value = "0")]
    pub sample: usize,
}

impl DecideArgs {
    /// Defaults, then the config file, then flags.
    pub fn resolve_config(&self) -> RetentionResult<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(cost) = self.cost {
            config.decision.intervention_cost = cost;
        }
        if let Some(threshold) = self.threshold {
            config.decision.churn_threshold = threshold;
        }
        if let Some(margin) = self.margin {
            config.decision.margin = margin;
        }
        if let Some(sweep) = &self.sweep {
            config.sensitivity_costs = sweep.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the labeled customer CSV file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the model artifact
    #[arg(short, long, default_value = "models/churn_model.json")]
    pub output: PathBuf,

    #[arg(long, default_value_t = TrainConfig::default().epochs)]
    pub epochs: usize,

    #[arg(long, default_value_t = TrainConfig::default().learning_rate)]
    pub learning_rate: f64,

    /// L2 penalty on weights
    #[arg(long, default_value_t = TrainConfig::default().l2)]
    pub l2: f64,

    #[arg(long, default_value_t = TrainConfig::default().batch_size)]
    pub batch_size: usize,

    /// Seed for the per-epoch row shuffle
    #[arg(long, default_value_t = TrainConfig::default().seed)]
    pub seed: u64,
}
