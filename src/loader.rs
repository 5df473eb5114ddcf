//! Dataset loading through an in-memory DuckDB connection

use crate::dataset::{Column, Dataset};
use crate::error::{Result, TabcompareError};
use crate::sql::{is_sql_file, parse_sql_file, SqlFile};
use crate::value::{DataType, Value};
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a dataset comes from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDescriptor {
    /// A csv, tsv, parquet, json or jsonl file
    File(PathBuf),
    /// A parsed `.sql` file
    Sql(SqlFile),
}

impl SourceDescriptor {
    /// Detect the source kind from a path
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TabcompareError::invalid_input(format!(
                "File not found: {}",
                path.display()
            )));
        }

        if is_sql_file(path) {
            return Ok(Self::Sql(parse_sql_file(path)?));
        }

        if !DatasetLoader::is_supported_format(path) {
            return Err(TabcompareError::invalid_input(format!(
                "Unsupported file format: {} (expected csv, tsv, parquet, json, jsonl or sql)",
                path.display()
            )));
        }

        Ok(Self::File(path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Sql(sql) => &sql.source_path,
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// Loads sources into [`Dataset`]s
pub struct DatasetLoader {
    connection: Connection,
}

impl DatasetLoader {
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        // Row order is part of the dataset contract
        connection.execute("SET preserve_insertion_order=true", [])?;
        Ok(Self { connection })
    }

    /// Check if file format is supported
    pub fn is_supported_format(file_path: &Path) -> bool {
        file_extension(file_path)
            .map(|ext| matches!(ext.as_str(), "csv" | "tsv" | "parquet" | "json" | "jsonl"))
            .unwrap_or(false)
    }

    /// Load a dataset from a path, detecting the source kind
    pub fn load_path(&self, path: &Path) -> Result<Dataset> {
        self.load(&SourceDescriptor::from_path(path)?)
    }

    pub fn load(&self, source: &SourceDescriptor) -> Result<Dataset> {
        match source {
            SourceDescriptor::File(path) => self.create_file_view(path)?,
            SourceDescriptor::Sql(sql) => self.create_sql_view(sql)?,
        }

        let described = self.describe()?;
        let projection: Vec<String> = described
            .iter()
            .map(|(name, type_name)| project_column(name, type_name))
            .collect();
        let declared: Vec<DataType> = described
            .iter()
            .map(|(_, type_name)| map_duckdb_type(type_name))
            .collect();

        let rows = self.read_rows(&projection, &described)?;
        let columns = described
            .into_iter()
            .zip(declared)
            .enumerate()
            .map(|(idx, ((name, _), declared))| {
                let data_type = reconcile_type(&name, declared, &rows, idx);
                let nullable = rows.iter().any(|row| row[idx].is_null());
                Column::new(name, data_type, nullable)
            })
            .collect();

        let dataset = Dataset::new(columns, rows)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.row_count(),
            dataset.column_count(),
            source
        );
        Ok(dataset)
    }

    fn create_file_view(&self, path: &Path) -> Result<()> {
        let literal = quote_literal(&path.to_string_lossy());
        let reader = match file_extension(path).as_deref() {
            Some("parquet") => format!("read_parquet({})", literal),
            Some("json") | Some("jsonl") => format!("read_json_auto({})", literal),
            Some("tsv") => format!("read_csv_auto({}, delim='\\t')", literal),
            _ => format!("read_csv_auto({})", literal),
        };

        let create_view_sql = format!("CREATE OR REPLACE VIEW data_view AS SELECT * FROM {}", reader);
        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| convert_duckdb_error(e, path))?;
        Ok(())
    }

    fn create_sql_view(&self, sql: &SqlFile) -> Result<()> {
        if let Some(attach) = sql.resolved_connection()? {
            log::debug!("Attaching database for {}", sql.source_path.display());
            self.connection
                .execute_batch(&attach)
                .map_err(|e| convert_duckdb_error(e, &sql.source_path))?;
        }

        for statement in &sql.setup {
            self.connection
                .execute_batch(statement)
                .map_err(|e| convert_duckdb_error(e, &sql.source_path))?;
        }

        let create_view_sql = format!("CREATE OR REPLACE VIEW data_view AS {}", sql.query);
        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| convert_duckdb_error(e, &sql.source_path))?;
        Ok(())
    }

    /// Column names and DuckDB type names of the current view
    fn describe(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.connection.prepare("DESCRIBE data_view")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    fn read_rows(&self, projection: &[String], described: &[(String, String)]) -> Result<Vec<Vec<Value>>> {
        if projection.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM data_view", projection.join(", "));
        let mut stmt = self.connection.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(projection.len());
            for (idx, (name, _)) in described.iter().enumerate() {
                values.push(convert_value(row.get_ref(idx)?, name)?);
            }
            data.push(values);
        }
        Ok(data)
    }
}

/// Map a DuckDB column type name onto the six comparison kinds
pub fn map_duckdb_type(type_name: &str) -> DataType {
    let upper = type_name.trim().to_uppercase();
    let base = upper.split('(').next().unwrap_or("").trim();

    match base {
        "TINYINT" | "SMALLINT" | "INTEGER" | "INT" | "BIGINT" | "HUGEINT" | "UTINYINT"
        | "USMALLINT" | "UINTEGER" | "UBIGINT" => DataType::Integer,
        "FLOAT" | "REAL" | "DOUBLE" | "DECIMAL" | "NUMERIC" => DataType::Float,
        "BOOLEAN" | "BOOL" => DataType::Boolean,
        "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR" => DataType::String,
        _ if base == "DATE" || base.starts_with("TIMESTAMP") => DataType::DateTime,
        _ => DataType::Unknown,
    }
}

/// Select expression for a column. Types without a native mapping are read as text.
fn project_column(name: &str, type_name: &str) -> String {
    let ident = quote_ident(name);
    match map_duckdb_type(type_name) {
        DataType::Unknown => format!("CAST({} AS VARCHAR) AS {}", ident, ident),
        _ => ident,
    }
}

/// Keep the declared type unless the data contradicts it (e.g. HUGEINT values
/// beyond the i64 range)
fn reconcile_type(name: &str, declared: DataType, rows: &[Vec<Value>], idx: usize) -> DataType {
    let declared = match declared {
        DataType::Unknown => DataType::String,
        other => other,
    };

    if rows.iter().all(|row| declared.accepts(&row[idx])) {
        return declared;
    }

    let inferred = DataType::infer(rows.iter().map(|row| &row[idx]));
    log::debug!(
        "Column '{}' declared {} but holds other values; using {}",
        name,
        declared,
        inferred
    );
    inferred
}

fn convert_value(value: ValueRef<'_>, column: &str) -> Result<Value> {
    let converted = match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Boolean(b),
        ValueRef::TinyInt(i) => Value::Integer(i as i64),
        ValueRef::SmallInt(i) => Value::Integer(i as i64),
        ValueRef::Int(i) => Value::Integer(i as i64),
        ValueRef::BigInt(i) => Value::Integer(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Value::Integer)
            .unwrap_or(Value::Float(i as f64)),
        ValueRef::UTinyInt(i) => Value::Integer(i as i64),
        ValueRef::USmallInt(i) => Value::Integer(i as i64),
        ValueRef::UInt(i) => Value::Integer(i as i64),
        ValueRef::UBigInt(i) => i64::try_from(i)
            .map(Value::Integer)
            .unwrap_or(Value::Float(i as f64)),
        ValueRef::Float(f) => Value::Float(f as f64),
        ValueRef::Double(f) => Value::Float(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| {
                TabcompareError::invalid_input(format!(
                    "Cannot read decimal in column '{}': {}",
                    column, e
                ))
            })?,
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Value::DateTime)
            .ok_or_else(|| out_of_range(column))?,
        ValueRef::Timestamp(unit, raw) => timestamp_value(unit, raw).ok_or_else(|| out_of_range(column))?,
        other => {
            return Err(TabcompareError::invalid_input(format!(
                "Unsupported value {:?} in column '{}'",
                other,
                column
            )))
        }
    };
    Ok(converted)
}

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn timestamp_value(unit: TimeUnit, raw: i64) -> Option<Value> {
    let micros = match unit {
        TimeUnit::Second => raw.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => raw.checked_mul(1_000)?,
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw.div_euclid(1_000),
    };
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos).map(|dt| Value::DateTime(dt.naive_utc()))
}

fn out_of_range(column: &str) -> TabcompareError {
    TabcompareError::invalid_input(format!("Date/time out of range in column '{}'", column))
}

fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Convert DuckDB errors to input errors where the cause is the source file
fn convert_duckdb_error(error: duckdb::Error, file_path: &Path) -> TabcompareError {
    let error_msg = error.to_string();

    if error_msg.contains("CSV Error")
        || error_msg.contains("Could not convert")
        || error_msg.contains("Invalid CSV")
        || error_msg.contains("Unterminated quoted field")
    {
        TabcompareError::invalid_input(format!(
            "Malformed CSV file '{}': {}",
            file_path.display(),
            error_msg
        ))
    } else if error_msg.contains("JSON") {
        TabcompareError::invalid_input(format!(
            "Malformed JSON file '{}': {}",
            file_path.display(),
            error_msg
        ))
    } else if error_msg.contains("No files found") || error_msg.contains("does not exist") {
        TabcompareError::invalid_input(format!("File not found: {}", file_path.display()))
    } else if error_msg.contains("Permission denied") {
        TabcompareError::invalid_input(format!(
            "Permission denied accessing file: {}",
            file_path.display()
        ))
    } else {
        TabcompareError::DuckDb(error)
    }
}
