//! Result cache backed by a DuckDB file in the workspace
//!
//! Every operation opens its own connection and drops it before returning,
//! so no handle outlives the call that needed it.

use crate::error::{Result, TabcompareError};
use crate::report::ComparisonReport;
use chrono::Utc;
use duckdb::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS comparison_results (
    id VARCHAR PRIMARY KEY,
    fingerprint VARCHAR NOT NULL,
    created_at VARCHAR NOT NULL,
    base_source VARCHAR NOT NULL,
    compare_source VARCHAR NOT NULL,
    base_rows BIGINT NOT NULL,
    compare_rows BIGINT NOT NULL,
    common_rows BIGINT NOT NULL,
    base_only_rows BIGINT NOT NULL,
    compare_only_rows BIGINT NOT NULL,
    match_rate DOUBLE NOT NULL,
    total_mismatches BIGINT NOT NULL,
    columns_compared BIGINT NOT NULL,
    dtype_mismatches BIGINT NOT NULL,
    results_json VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS mismatch_details (
    comparison_id VARCHAR NOT NULL,
    position BIGINT NOT NULL,
    row_key VARCHAR NOT NULL,
    column_name VARCHAR NOT NULL,
    base_value VARCHAR,
    compare_value VARCHAR,
    mismatch_type VARCHAR NOT NULL
);
";

/// Summary row of a cached comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    pub fingerprint: String,
    pub created_at: String,
    pub base_source: String,
    pub compare_source: String,
    pub base_rows: u64,
    pub compare_rows: u64,
    pub common_rows: u64,
    pub match_rate: f64,
    pub total_mismatches: u64,
}

/// Labels for the two inputs of a stored comparison
#[derive(Debug, Clone, Default)]
pub struct SourceLabels {
    pub base: String,
    pub compare: String,
}

impl SourceLabels {
    pub fn new(base: impl Into<String>, compare: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            compare: compare.into(),
        }
    }
}

/// Comparison result cache
pub struct ResultCache {
    path: PathBuf,
}

impl ResultCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection> {
        let connection = Connection::open(&self.path)?;
        connection.execute_batch(SCHEMA)?;
        Ok(connection)
    }

    /// Store a report and return its new id
    pub fn store(
        &self,
        report: &ComparisonReport,
        fingerprint: &str,
        labels: &SourceLabels,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let results_json = serde_json::to_string(report)?;
        let summary = &report.summary;
        let partition = &report.row_partition;

        let mut connection = self.open()?;
        let tx = connection.transaction()?;

        tx.execute(
            "INSERT INTO comparison_results VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                fingerprint,
                Utc::now().to_rfc3339(),
                labels.base,
                labels.compare,
                summary.total_rows_a as i64,
                summary.total_rows_b as i64,
                partition.matched_count as i64,
                partition.only_in_a_count as i64,
                partition.only_in_b_count as i64,
                report.overall_match_rate,
                summary.total_mismatches as i64,
                summary.compared_columns.len() as i64,
                report.schema_diff.type_mismatches.len() as i64,
                results_json,
            ],
        )?;

        {
            let mut insert = tx.prepare("INSERT INTO mismatch_details VALUES (?, ?, ?, ?, ?, ?, ?)")?;
            for (position, mismatch) in report.mismatches.iter().enumerate() {
                insert.execute(params![
                    id,
                    position as i64,
                    crate::value::format_key(&mismatch.key),
                    mismatch.column,
                    display_or_null(&mismatch.value_a),
                    display_or_null(&mismatch.value_b),
                    mismatch.kind.as_str(),
                ])?;
            }
        }

        tx.commit()?;
        log::debug!(
            "Cached comparison {} ({} mismatches) in {}",
            id,
            report.mismatches.len(),
            self.path.display()
        );
        Ok(id)
    }

    /// Load a stored report by id or unique id prefix
    pub fn retrieve(&self, id: &str) -> Result<ComparisonReport> {
        let connection = self.open()?;
        let id = resolve_id(&connection, id)?;

        let json: String = connection.query_row(
            "SELECT results_json FROM comparison_results WHERE id = ?",
            params![id],
            |row| row.get(0),
        )?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Most recent stored report with this fingerprint
    pub fn lookup(&self, fingerprint: &str) -> Result<Option<String>> {
        let connection = self.open()?;
        let mut stmt = connection.prepare(
            "SELECT id FROM comparison_results WHERE fingerprint = ? ORDER BY created_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query(params![fingerprint])?;
        let id = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        Ok(id)
    }

    /// All stored comparisons, newest first
    pub fn list(&self) -> Result<Vec<CacheEntry>> {
        let connection = self.open()?;
        let mut stmt = connection.prepare(
            "SELECT id, fingerprint, created_at, base_source, compare_source,
                    base_rows, compare_rows, common_rows, match_rate, total_mismatches
             FROM comparison_results
             ORDER BY created_at DESC, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CacheEntry {
                id: row.get(0)?,
                fingerprint: row.get(1)?,
                created_at: row.get(2)?,
                base_source: row.get(3)?,
                compare_source: row.get(4)?,
                base_rows: row.get::<_, i64>(5)?.max(0) as u64,
                compare_rows: row.get::<_, i64>(6)?.max(0) as u64,
                common_rows: row.get::<_, i64>(7)?.max(0) as u64,
                match_rate: row.get(8)?,
                total_mismatches: row.get::<_, i64>(9)?.max(0) as u64,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Delete a stored report and its mismatch rows. Returns the full id.
    pub fn remove(&self, id: &str) -> Result<String> {
        let mut connection = self.open()?;
        let id = resolve_id(&connection, id)?;

        let tx = connection.transaction()?;
        tx.execute("DELETE FROM mismatch_details WHERE comparison_id = ?", params![id])?;
        tx.execute("DELETE FROM comparison_results WHERE id = ?", params![id])?;
        tx.commit()?;

        log::debug!("Removed cached comparison {}", id);
        Ok(id)
    }

    /// Number of mismatch rows stored for a report
    pub fn mismatch_count(&self, id: &str) -> Result<u64> {
        let connection = self.open()?;
        let id = resolve_id(&connection, id)?;
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM mismatch_details WHERE comparison_id = ?",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

/// Expand an id prefix to the single stored id it names
fn resolve_id(connection: &Connection, id: &str) -> Result<String> {
    let prefix = id.trim();
    if prefix.is_empty() {
        return Err(TabcompareError::invalid_input("report id must not be empty"));
    }

    let mut stmt = connection.prepare(
        "SELECT id FROM comparison_results WHERE starts_with(id, ?) ORDER BY id LIMIT 2",
    )?;
    let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
    let mut matches = Vec::new();
    for row in rows {
        matches.push(row?);
    }

    match matches.len() {
        0 => Err(TabcompareError::report_not_found(prefix)),
        1 => Ok(matches.remove(0)),
        _ => Err(TabcompareError::invalid_input(format!(
            "report id '{}' is ambiguous",
            prefix
        ))),
    }
}

fn display_or_null(value: &crate::value::Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value.to_string())
    }
}
