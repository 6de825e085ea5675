use super::RunStore;
use crate::{
    decision::{DecisionRecord, Segment},
    error::RetentionResult,
    summary::SensitivityPoint,
};
use rusqlite::{params, Connection};

pub(super) fn insert_decisions(
    conn: &Connection,
    run_id: &str,
    decisions: &[DecisionRecord],
) -> RetentionResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO decision (
            run_id, row_idx, customer_id, churn_probability, clv,
            expected_revenue_saved, net_gain, segment
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (idx, d) in decisions.iter().enumerate() {
        stmt.execute(params![
            run_id,
            idx as i64,
            d.customer_id,
            d.churn_probability,
            d.clv,
            d.expected_revenue_saved,
            d.net_gain,
            d.segment.label(),
        ])?;
    }
    Ok(())
}

pub(super) fn insert_sensitivity(
    conn: &Connection,
    run_id: &str,
    points: &[SensitivityPoint],
) -> RetentionResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO sensitivity (run_id, intervention_cost, saveable_customers, total_net_gain)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for p in points {
        stmt.execute(params![
            run_id,
            p.intervention_cost,
            p.saveable_customers as i64,
            p.total_net_gain,
        ])?;
    }
    Ok(())
}

impl RunStore {
    // ── Decisions ──────────────────────────────────────────────

    pub fn decision_count(&self, run_id: &str) -> RetentionResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM decision WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn segment_count(&self, run_id: &str, segment: Segment) -> RetentionResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM decision WHERE run_id = ?1 AND segment = ?2",
            params![run_id, segment.label()],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Sum of stored net gain for `Saveable` rows, unrounded.
    pub fn saveable_net_gain(&self, run_id: &str) -> RetentionResult<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(net_gain), 0.0) FROM decision
             WHERE run_id = ?1 AND segment = ?2",
            params![run_id, Segment::Saveable.label()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub fn sensitivity_for_run(&self, run_id: &str) -> RetentionResult<Vec<SensitivityPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT intervention_cost, saveable_customers, total_net_gain
             FROM sensitivity WHERE run_id = ?1
             ORDER BY rowid ASC",
        )?;
        let points = stmt
            .query_map(params![run_id], |row| {
                Ok(SensitivityPoint {
                    intervention_cost:  row.get(0)?,
                    saveable_customers: row.get::<_, i64>(1)? as usize,
                    total_net_gain:     row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }
}
