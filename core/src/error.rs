use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Required column '{column}' not found in input header")]
    MissingColumn { column: String },

    #[error("Row {row}: cannot parse {column} value '{value}'")]
    MalformedField { row: usize, column: String, value: String },

    #[error("Predictor returned {actual} probabilities for {expected} customers")]
    PredictionCountMismatch { expected: usize, actual: usize },

    #[error("Predictor returned probability {value} for row {row} (customer '{customer_id}'); expected a value in [0, 1]")]
    ProbabilityOutOfRange { row: usize, customer_id: String, value: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Run '{run_id}' not found")]
    RunNotFound { run_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RetentionResult<T> = Result<T, RetentionError>;
