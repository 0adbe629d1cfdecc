use crate::db::connection::Database;
use crate::errors::Result;
use rusqlite::params;

#[derive(Debug)]
pub struct IngestRun {
    pub id: i64,
    pub location_id: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub pages_fetched: Option<i64>,
    pub records_fetched: Option<i64>,
    pub rows_merged: Option<i64>,
    pub outliers_dropped: Option<i64>,
    pub rows_rejected: Option<i64>,
    pub used_fallback: bool,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Counters recorded when a run finishes.
#[derive(Debug, Default, Clone)]
pub struct RunOutcome {
    pub pages_fetched: usize,
    pub records_fetched: usize,
    pub rows_merged: usize,
    pub outliers_dropped: usize,
    pub rows_rejected: usize,
    pub used_fallback: bool,
}

pub fn start_ingest_run(db: &Database, location_id: &str, now: i64) -> Result<i64> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO ingest_runs (location_id, started_at, success) VALUES (?, ?, 0)",
            params![location_id, now],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn end_ingest_run(
    db: &Database,
    run_id: i64,
    now: i64,
    outcome: &RunOutcome,
    error: Option<String>,
) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE ingest_runs SET finished_at = ?, pages_fetched = ?, records_fetched = ?, rows_merged = ?, outliers_dropped = ?, rows_rejected = ?, used_fallback = ?, success = ?, error_message = ? WHERE id = ?",
            params![
                now,
                outcome.pages_fetched,
                outcome.records_fetched,
                outcome.rows_merged,
                outcome.outliers_dropped,
                outcome.rows_rejected,
                outcome.used_fallback,
                error.is_none(),
                error,
                run_id
            ],
        )?;
        Ok(())
    })
}

pub fn get_recent_runs(db: &Database) -> Result<Vec<IngestRun>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, location_id, started_at, finished_at, pages_fetched, records_fetched, rows_merged, outliers_dropped, rows_rejected, used_fallback, success, error_message FROM ingest_runs ORDER BY id DESC LIMIT 50",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(IngestRun {
                id: row.get(0)?,
                location_id: row.get(1)?,
                started_at: row.get(2)?,
                finished_at: row.get(3)?,
                pages_fetched: row.get(4)?,
                records_fetched: row.get(5)?,
                rows_merged: row.get(6)?,
                outliers_dropped: row.get(7)?,
                rows_rejected: row.get(8)?,
                used_fallback: row.get(9)?,
                success: row.get(10)?,
                error_message: row.get(11)?,
            })
        })?;

        let mut runs = Vec::new();
        for r in rows {
            runs.push(r?);
        }
        Ok(runs)
    })
}
