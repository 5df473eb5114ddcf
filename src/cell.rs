//! Cell-level comparison of matched row pairs

use crate::config::ComparisonConfig;
use crate::error::{Result, TabcompareError};
use crate::schema::ColumnPair;
use crate::value::{format_key, DataType, Value};
use serde::{Deserialize, Serialize};

/// Why two cells disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Same kind, different value
    Value,
    /// Exactly one side is null
    Null,
    /// Values of incomparable kinds
    Type,
}

impl MismatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MismatchKind::Value => "value",
            MismatchKind::Null => "null",
            MismatchKind::Type => "type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    Match,
    Mismatch(MismatchKind),
}

impl CellOutcome {
    pub fn is_match(self) -> bool {
        self == CellOutcome::Match
    }
}

/// Tolerance and case rules applied to each cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellComparator {
    absolute_tolerance: f64,
    relative_tolerance: f64,
    case_sensitive: bool,
}

impl CellComparator {
    pub fn new(absolute_tolerance: f64, relative_tolerance: f64, case_sensitive: bool) -> Self {
        Self {
            absolute_tolerance,
            relative_tolerance,
            case_sensitive,
        }
    }

    pub fn from_config(config: &ComparisonConfig) -> Self {
        Self::new(
            config.absolute_tolerance,
            config.relative_tolerance,
            config.case_sensitive,
        )
    }

    /// Compare one matched pair over the selected columns.
    ///
    /// Returns one outcome per column, in column order. A value that does not
    /// fit its column's declared type is an error carrying the column and key.
    pub fn compare_row(
        &self,
        row_a: &[Value],
        row_b: &[Value],
        columns: &[ColumnPair],
        key: &[Value],
    ) -> Result<Vec<CellOutcome>> {
        columns
            .iter()
            .map(|column| {
                let value_a = &row_a[column.index_a];
                let value_b = &row_b[column.index_b];
                check_declared(column.type_a, value_a, column, key)?;
                check_declared(column.type_b, value_b, column, key)?;
                Ok(self.compare_values(value_a, value_b))
            })
            .collect()
    }

    /// Decide equality of two cells
    pub fn compare_values(&self, a: &Value, b: &Value) -> CellOutcome {
        let equal = match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => {
                return CellOutcome::Mismatch(MismatchKind::Null)
            }
            (Value::Integer(x), Value::Integer(y)) => self.integers_equal(*x, *y),
            (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i))
                if !self.has_tolerance() =>
            {
                integer_equals_float(*i, *f)
            }
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => self.floats_equal(x, y),
                    _ => false,
                }
            }
            (Value::String(x), Value::String(y)) => self.strings_equal(x, y),
            (Value::Boolean(x), Value::Boolean(y)) => x == y,
            (Value::DateTime(x), Value::DateTime(y)) => x == y,
            _ => return CellOutcome::Mismatch(MismatchKind::Type),
        };

        if equal {
            CellOutcome::Match
        } else {
            CellOutcome::Mismatch(MismatchKind::Value)
        }
    }

    fn has_tolerance(&self) -> bool {
        self.absolute_tolerance > 0.0 || self.relative_tolerance > 0.0
    }

    fn integers_equal(&self, x: i64, y: i64) -> bool {
        if x == y {
            return true;
        }
        if !self.has_tolerance() {
            return false;
        }
        // i128 keeps the difference exact across the full i64 range
        let diff = (x as i128 - y as i128).unsigned_abs() as f64;
        let scale = x.unsigned_abs().max(y.unsigned_abs()) as f64;
        diff <= self.absolute_tolerance + self.relative_tolerance * scale
    }

    fn floats_equal(&self, x: f64, y: f64) -> bool {
        if x == y || (x.is_nan() && y.is_nan()) {
            return true;
        }
        if x.is_infinite() || y.is_infinite() {
            return false;
        }
        (x - y).abs() <= self.absolute_tolerance + self.relative_tolerance * x.abs().max(y.abs())
    }

    fn strings_equal(&self, x: &str, y: &str) -> bool {
        if self.case_sensitive {
            x == y
        } else {
            x == y || x.to_lowercase() == y.to_lowercase()
        }
    }
}

/// Exact comparison; only an integral float inside the i64 range can match
fn integer_equals_float(i: i64, f: f64) -> bool {
    // 2^63 is exactly representable; i64::MAX as f64 rounds up to it
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if !f.is_finite() || f.fract() != 0.0 || f < -LIMIT || f >= LIMIT {
        return false;
    }
    f as i64 == i
}

fn check_declared(declared: DataType, value: &Value, column: &ColumnPair, key: &[Value]) -> Result<()> {
    if declared.accepts(value) {
        return Ok(());
    }
    let kind = value.data_type().unwrap_or(DataType::Unknown);
    Err(TabcompareError::comparison_at(
        format!(
            "{} value '{}' in a column declared {}",
            kind, value, declared
        ),
        column.name.clone(),
        Some(format_key(key)),
    ))
}
