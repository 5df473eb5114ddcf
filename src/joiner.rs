//! Key-based row partitioning of two datasets

use crate::config::NullKeyPolicy;
use crate::dataset::Dataset;
use crate::schema::ColumnPair;
use crate::value::{cmp_keys, Value};
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// Hashable form of a key component
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Null,
    Integer(i64),
    Float(u64),
    String(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl KeyPart {
    fn from_value(value: &Value, case_sensitive: bool) -> Self {
        match value {
            Value::Null => KeyPart::Null,
            Value::Integer(i) => KeyPart::Integer(*i),
            Value::Float(f) => float_key(*f),
            Value::String(s) if case_sensitive => KeyPart::String(s.clone()),
            Value::String(s) => KeyPart::String(s.to_lowercase()),
            Value::Boolean(b) => KeyPart::Boolean(*b),
            Value::DateTime(dt) => KeyPart::DateTime(*dt),
        }
    }
}

/// Integral floats join with integers; `-0.0` joins `0` and all NaNs are one key
fn float_key(f: f64) -> KeyPart {
    if f.is_nan() {
        return KeyPart::Float(f64::NAN.to_bits());
    }
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return KeyPart::Integer(f as i64);
    }
    KeyPart::Float(f.to_bits())
}

type KeyTuple = Vec<KeyPart>;

/// One row of each dataset paired by key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedPair {
    pub index_a: usize,
    pub index_b: usize,
    /// Position of this pair within its duplicate-key group (0 for unique keys)
    pub ordinal: usize,
}

/// Result of the join phase, expressed as row indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinResult {
    /// Ordered by the first dataset's row index
    pub pairs: Vec<MatchedPair>,
    /// Ascending row indices
    pub only_in_a: Vec<usize>,
    pub only_in_b: Vec<usize>,
    pub duplicate_keys_a: Vec<Vec<Value>>,
    pub duplicate_keys_b: Vec<Vec<Value>>,
    /// Rows whose key has a null component
    pub null_key_rows_a: usize,
    pub null_key_rows_b: usize,
    /// Rows left out of the partition under `NullKeyPolicy::Drop`
    pub dropped_a: usize,
    pub dropped_b: usize,
}

/// Rows of one dataset grouped by key, in first-occurrence order
struct KeyIndex {
    groups: IndexMap<KeyTuple, Vec<usize>>,
    unmatched_nulls: Vec<usize>,
    null_rows: usize,
    dropped: usize,
}

/// Key joiner
pub struct KeyJoiner<'a> {
    key_columns: &'a [ColumnPair],
    case_sensitive: bool,
    null_key_policy: NullKeyPolicy,
}

impl<'a> KeyJoiner<'a> {
    pub fn new(
        key_columns: &'a [ColumnPair],
        case_sensitive: bool,
        null_key_policy: NullKeyPolicy,
    ) -> Self {
        Self {
            key_columns,
            case_sensitive,
            null_key_policy,
        }
    }

    /// Original key values of a row in the first dataset
    pub fn key_values_a(&self, dataset: &Dataset, row: usize) -> Vec<Value> {
        self.key_values(dataset, row, |pair| pair.index_a)
    }

    /// Original key values of a row in the second dataset
    pub fn key_values_b(&self, dataset: &Dataset, row: usize) -> Vec<Value> {
        self.key_values(dataset, row, |pair| pair.index_b)
    }

    fn key_values(
        &self,
        dataset: &Dataset,
        row: usize,
        column: impl Fn(&ColumnPair) -> usize,
    ) -> Vec<Value> {
        match dataset.row(row) {
            Some(values) => self
                .key_columns
                .iter()
                .map(|pair| values[column(pair)].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Partition rows into matched pairs and rows unique to either side.
    ///
    /// Rows sharing a key are paired positionally: the i-th row of a group in
    /// `a` (by row index) pairs with the i-th row of the same group in `b`, and
    /// overflow rows are unique to their side. This tie-break is the only
    /// part of the result that depends on row order.
    pub fn join(&self, a: &Dataset, b: &Dataset) -> JoinResult {
        let by_key_a = self.build_index(a, |pair| pair.index_a);
        let by_key_b = self.build_index(b, |pair| pair.index_b);

        let mut result = JoinResult {
            null_key_rows_a: by_key_a.null_rows,
            null_key_rows_b: by_key_b.null_rows,
            dropped_a: by_key_a.dropped,
            dropped_b: by_key_b.dropped,
            ..JoinResult::default()
        };

        result.duplicate_keys_a = self.duplicate_keys(&by_key_a, a, |pair| pair.index_a);
        result.duplicate_keys_b = self.duplicate_keys(&by_key_b, b, |pair| pair.index_b);

        for (key, rows_a) in &by_key_a.groups {
            match by_key_b.groups.get(key) {
                Some(rows_b) => {
                    // Groups are built in row order, so both sides are already sorted
                    for (ordinal, (&index_a, &index_b)) in rows_a.iter().zip(rows_b).enumerate() {
                        result.pairs.push(MatchedPair {
                            index_a,
                            index_b,
                            ordinal,
                        });
                    }
                    result.only_in_a.extend(rows_a.iter().skip(rows_b.len()));
                    result.only_in_b.extend(rows_b.iter().skip(rows_a.len()));
                }
                None => result.only_in_a.extend(rows_a),
            }
        }

        for (key, rows_b) in &by_key_b.groups {
            if !by_key_a.groups.contains_key(key) {
                result.only_in_b.extend(rows_b);
            }
        }

        result.only_in_a.extend(by_key_a.unmatched_nulls);
        result.only_in_b.extend(by_key_b.unmatched_nulls);

        result.pairs.sort_by_key(|pair| pair.index_a);
        result.only_in_a.sort_unstable();
        result.only_in_b.sort_unstable();

        log::debug!(
            "Join produced {} pairs, {} rows only in A, {} rows only in B",
            result.pairs.len(),
            result.only_in_a.len(),
            result.only_in_b.len()
        );

        result
    }

    fn build_index(&self, dataset: &Dataset, column: impl Fn(&ColumnPair) -> usize) -> KeyIndex {
        let mut index = KeyIndex {
            groups: IndexMap::new(),
            unmatched_nulls: Vec::new(),
            null_rows: 0,
            dropped: 0,
        };

        for (row_idx, row) in dataset.rows().iter().enumerate() {
            let key: KeyTuple = self
                .key_columns
                .iter()
                .map(|pair| KeyPart::from_value(&row[column(pair)], self.case_sensitive))
                .collect();

            if key.contains(&KeyPart::Null) {
                index.null_rows += 1;
                match self.null_key_policy {
                    NullKeyPolicy::Unmatched => {
                        index.unmatched_nulls.push(row_idx);
                        continue;
                    }
                    NullKeyPolicy::Drop => {
                        index.dropped += 1;
                        continue;
                    }
                    NullKeyPolicy::MatchNulls => {}
                }
            }

            index.groups.entry(key).or_default().push(row_idx);
        }

        if index.dropped > 0 {
            log::warn!("Dropped {} rows with null join keys", index.dropped);
        }

        index
    }

    fn duplicate_keys(
        &self,
        index: &KeyIndex,
        dataset: &Dataset,
        column: impl Fn(&ColumnPair) -> usize,
    ) -> Vec<Vec<Value>> {
        let mut keys: Vec<Vec<Value>> = index
            .groups
            .values()
            .filter(|rows| rows.len() > 1)
            .filter_map(|rows| {
                // Smallest spelling of the key so the listing ignores row order
                rows.iter()
                    .map(|&row| self.key_values(dataset, row, &column))
                    .min_by(|x, y| cmp_keys(x, y))
            })
            .collect();
        keys.sort_by(|x, y| cmp_keys(x, y));
        keys
    }
}
