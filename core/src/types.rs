//! Shared primitive types used across the pipeline.

/// Stable, unique customer identifier as it appears in the input file.
pub type CustomerId = String;

/// Identifier of one recorded pipeline invocation in the run ledger.
pub type RunId = String;

/// Tenure in months. Signed: the loader accepts out-of-range values as-is.
pub type Months = i64;
