//! Comparison report types and the report builder

use crate::cell::{CellOutcome, MismatchKind};
use crate::dataset::Dataset;
use crate::joiner::{JoinResult, MatchedPair};
use crate::schema::{ColumnPair, SchemaDiff, SchemaMatch, TypeMismatch};
use crate::value::{cmp_keys, DataType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Complete result of comparing two datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub schema_diff: SchemaDiff,
    pub row_partition: RowPartition,
    /// Every common column, in the first dataset's order
    pub per_column_stats: IndexMap<String, ColumnStats>,
    pub mismatches: Vec<Mismatch>,
    pub overall_match_rate: f64,
    pub summary: ReportSummary,
}

/// Row-level partition produced by the key joiner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowPartition {
    pub matched_count: usize,
    pub only_in_a_count: usize,
    pub only_in_b_count: usize,
    pub only_in_a_rows: Vec<IndexMap<String, Value>>,
    pub only_in_b_rows: Vec<IndexMap<String, Value>>,
    pub duplicate_keys_a: Vec<Vec<Value>>,
    pub duplicate_keys_b: Vec<Vec<Value>>,
    pub null_key_rows_a: usize,
    pub null_key_rows_b: usize,
    /// Null-key rows excluded from the partition
    pub dropped_rows_a: usize,
    pub dropped_rows_b: usize,
}

/// Per-column profile. Counts and rate are `None` for columns that were not
/// cell-compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub match_count: Option<usize>,
    pub mismatch_count: Option<usize>,
    /// Subset of `mismatch_count` where exactly one side was null
    pub null_mismatch_count: Option<usize>,
    pub match_rate: Option<f64>,
    pub base_nulls: usize,
    pub compare_nulls: usize,
    pub base_dtype: DataType,
    pub compare_dtype: DataType,
    pub dtype_match: bool,
}

impl ColumnStats {
    pub fn is_compared(&self) -> bool {
        self.match_count.is_some()
    }
}

/// One disagreeing cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub key: Vec<Value>,
    pub column: String,
    pub value_a: Value,
    pub value_b: Value,
    pub kind: MismatchKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_rows_a: usize,
    pub total_rows_b: usize,
    pub join_columns: Vec<String>,
    pub compared_columns: Vec<String>,
    pub total_mismatches: usize,
    pub rows_with_mismatches: usize,
    pub null_mismatch_count: usize,
    pub type_mismatch_count: usize,
}

impl ComparisonReport {
    /// True when the datasets agree on schema, rows and every compared cell
    pub fn is_identical(&self) -> bool {
        !self.schema_diff.has_changes()
            && self.row_partition.only_in_a_count == 0
            && self.row_partition.only_in_b_count == 0
            && self.mismatches.is_empty()
    }

    pub fn mismatches_for<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Mismatch> {
        self.mismatches.iter().filter(move |m| m.column == column)
    }
}

/// Cell outcomes for one matched pair
#[derive(Debug, Clone)]
pub struct PairResult {
    pub pair: MatchedPair,
    pub key: Vec<Value>,
    /// One outcome per compare column
    pub outcomes: Vec<CellOutcome>,
}

#[derive(Default, Clone, Copy)]
struct Tally {
    matches: usize,
    mismatches: usize,
    null_mismatches: usize,
}

/// Folds schema, join and cell results into a report
pub struct ReportBuilder<'a> {
    a: &'a Dataset,
    b: &'a Dataset,
    join_columns: &'a [ColumnPair],
    compare_columns: &'a [ColumnPair],
}

impl<'a> ReportBuilder<'a> {
    pub fn new(
        a: &'a Dataset,
        b: &'a Dataset,
        join_columns: &'a [ColumnPair],
        compare_columns: &'a [ColumnPair],
    ) -> Self {
        Self {
            a,
            b,
            join_columns,
            compare_columns,
        }
    }

    pub fn build(
        &self,
        schema: SchemaMatch,
        join: JoinResult,
        results: Vec<PairResult>,
    ) -> ComparisonReport {
        let SchemaMatch {
            diff: mut schema_diff,
            pairs: common,
            ..
        } = schema;

        let mut tallies = vec![Tally::default(); self.compare_columns.len()];
        let mut observed_kinds: Vec<Option<(DataType, DataType)>> =
            vec![None; self.compare_columns.len()];
        let mut ordered = Vec::new();
        let mut rows_with_mismatches = 0;

        for result in &results {
            let row_a = &self.a.rows()[result.pair.index_a];
            let row_b = &self.b.rows()[result.pair.index_b];
            let mut row_differs = false;

            for (position, (column, outcome)) in
                self.compare_columns.iter().zip(&result.outcomes).enumerate()
            {
                let tally = &mut tallies[position];
                let kind = match outcome {
                    CellOutcome::Match => {
                        tally.matches += 1;
                        continue;
                    }
                    CellOutcome::Mismatch(kind) => *kind,
                };

                tally.mismatches += 1;
                row_differs = true;

                let value_a = &row_a[column.index_a];
                let value_b = &row_b[column.index_b];
                match kind {
                    MismatchKind::Null => tally.null_mismatches += 1,
                    MismatchKind::Type => {
                        if let (Some(kind_a), Some(kind_b)) = (value_a.data_type(), value_b.data_type()) {
                            let seen = &mut observed_kinds[position];
                            if seen.map_or(true, |current| (kind_a, kind_b) < current) {
                                *seen = Some((kind_a, kind_b));
                            }
                        }
                    }
                    MismatchKind::Value => {}
                }

                ordered.push((
                    result.pair.ordinal,
                    position,
                    Mismatch {
                        key: result.key.clone(),
                        column: column.name.clone(),
                        value_a: value_a.clone(),
                        value_b: value_b.clone(),
                        kind,
                    },
                ));
            }

            if row_differs {
                rows_with_mismatches += 1;
            }
        }

        ordered.sort_by(|(ord_x, pos_x, x), (ord_y, pos_y, y)| {
            cmp_keys(&x.key, &y.key)
                .then(ord_x.cmp(ord_y))
                .then(pos_x.cmp(pos_y))
        });
        let mismatches: Vec<Mismatch> = ordered.into_iter().map(|(_, _, m)| m).collect();

        for (column, observed) in self.compare_columns.iter().zip(&observed_kinds) {
            if let Some((type_a, type_b)) = observed {
                schema_diff
                    .type_mismatches
                    .entry(column.name.clone())
                    .or_insert(TypeMismatch {
                        type_a: *type_a,
                        type_b: *type_b,
                    });
            }
        }

        let per_column_stats = self.column_stats(&common, &tallies, results.len());
        let row_partition = self.row_partition(join);
        let overall_match_rate = match_rate(
            row_partition.matched_count,
            self.a.row_count().max(self.b.row_count()),
        );

        let summary = ReportSummary {
            total_rows_a: self.a.row_count(),
            total_rows_b: self.b.row_count(),
            join_columns: self.join_columns.iter().map(|c| c.name.clone()).collect(),
            compared_columns: self.compare_columns.iter().map(|c| c.name.clone()).collect(),
            total_mismatches: mismatches.len(),
            rows_with_mismatches,
            null_mismatch_count: count_kind(&mismatches, MismatchKind::Null),
            type_mismatch_count: count_kind(&mismatches, MismatchKind::Type),
        };

        log::debug!(
            "Aggregated {} mismatches across {} compared columns",
            summary.total_mismatches,
            summary.compared_columns.len()
        );

        ComparisonReport {
            schema_diff,
            row_partition,
            per_column_stats,
            mismatches,
            overall_match_rate,
            summary,
        }
    }

    fn column_stats(
        &self,
        common: &[ColumnPair],
        tallies: &[Tally],
        pair_count: usize,
    ) -> IndexMap<String, ColumnStats> {
        common
            .iter()
            .map(|column| {
                let tally = self
                    .compare_columns
                    .iter()
                    .position(|c| c.name == column.name)
                    .map(|position| tallies[position]);

                let stats = ColumnStats {
                    match_count: tally.map(|t| t.matches),
                    mismatch_count: tally.map(|t| t.mismatches),
                    null_mismatch_count: tally.map(|t| t.null_mismatches),
                    match_rate: tally.map(|t| match_rate(t.matches, pair_count)),
                    base_nulls: self.a.null_count(column.index_a),
                    compare_nulls: self.b.null_count(column.index_b),
                    base_dtype: column.type_a,
                    compare_dtype: column.type_b,
                    dtype_match: column.type_a == column.type_b,
                };
                (column.name.clone(), stats)
            })
            .collect()
    }

    fn row_partition(&self, join: JoinResult) -> RowPartition {
        RowPartition {
            matched_count: join.pairs.len(),
            only_in_a_count: join.only_in_a.len(),
            only_in_b_count: join.only_in_b.len(),
            only_in_a_rows: join.only_in_a.iter().map(|&i| self.a.row_map(i)).collect(),
            only_in_b_rows: join.only_in_b.iter().map(|&i| self.b.row_map(i)).collect(),
            duplicate_keys_a: join.duplicate_keys_a,
            duplicate_keys_b: join.duplicate_keys_b,
            null_key_rows_a: join.null_key_rows_a,
            null_key_rows_b: join.null_key_rows_b,
            dropped_rows_a: join.dropped_a,
            dropped_rows_b: join.dropped_b,
        }
    }
}

fn match_rate(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

fn count_kind(mismatches: &[Mismatch], kind: MismatchKind) -> usize {
    mismatches.iter().filter(|m| m.kind == kind).count()
}
