//! SQLite run ledger.
//!
//! RULE: Only the store talks to the database.
//! The ledger is write-mostly audit history. The pipeline never reads a
//! previous run back as input; every run recomputes from the dataset.

use crate::{
    error::{RetentionError, RetentionResult},
    loader::LoadReport,
    pipeline::RunOutcome,
    types::RunId,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod decision;

pub struct RunStore {
    conn: Connection,
}

/// Context of a run that is not part of the pipeline output.
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub input_path: String,
    pub predictor:  String,
    pub load:       LoadReport,
}

/// One row of the `run` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id:                  RunId,
    pub created_at:              String,
    pub input_path:              String,
    pub predictor:               String,
    pub intervention_cost:       f64,
    pub churn_threshold:         f64,
    pub margin:                  f64,
    pub rows_read:               i64,
    pub rows_excluded:           i64,
    pub total_customers:         i64,
    pub saveable_customers:      i64,
    pub not_worth_saving:        i64,
    pub loyal_customers:         i64,
    pub total_expected_net_gain: f64,
}

const RUN_COLUMNS: &str = "run_id, created_at, input_path, predictor,
    intervention_cost, churn_threshold, margin, rows_read, rows_excluded,
    total_customers, saveable_customers, not_worth_saving, loyal_customers,
    total_expected_net_gain";

fn run_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        run_id:                  row.get(0)?,
        created_at:              row.get(1)?,
        input_path:              row.get(2)?,
        predictor:               row.get(3)?,
        intervention_cost:       row.get(4)?,
        churn_threshold:         row.get(5)?,
        margin:                  row.get(6)?,
        rows_read:               row.get(7)?,
        rows_excluded:           row.get(8)?,
        total_customers:         row.get(9)?,
        saveable_customers:      row.get(10)?,
        not_worth_saving:        row.get(11)?,
        loyal_customers:         row.get(12)?,
        total_expected_net_gain: row.get(13)?,
    })
}

impl RunStore {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: impl AsRef<Path>) -> RetentionResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RetentionResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RetentionResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_runs.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    /// Persist one complete run atomically. Returns the new run id.
    pub fn record_run(&self, meta: &RunMeta, outcome: &RunOutcome) -> RetentionResult<RunId> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let s = &outcome.summary;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("INSERT INTO run ({RUN_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"),
            params![
                run_id,
                created_at,
                meta.input_path,
                meta.predictor,
                outcome.params.intervention_cost,
                outcome.params.churn_threshold,
                outcome.params.margin,
                meta.load.rows_read as i64,
                meta.load.rows_excluded as i64,
                s.total_customers as i64,
                s.saveable_customers as i64,
                s.not_worth_saving as i64,
                s.loyal_customers as i64,
                s.total_expected_net_gain,
            ],
        )?;
        decision::insert_decisions(&tx, &run_id, &outcome.decisions)?;
        decision::insert_sensitivity(&tx, &run_id, &outcome.sensitivity)?;
        tx.commit()?;

        log::info!(
            "store: recorded run {run_id} ({} decisions)",
            outcome.decisions.len()
        );
        Ok(run_id)
    }

    pub fn run_summary(&self, run_id: &str) -> RetentionResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM run WHERE run_id = ?1"),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or_else(|| RetentionError::RunNotFound { run_id: run_id.into() })
    }

    /// All recorded runs, oldest first.
    pub fn list_runs(&self) -> RetentionResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM run ORDER BY created_at ASC, rowid ASC"
        ))?;
        let runs = stmt
            .query_map([], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}
