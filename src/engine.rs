//! The comparison pipeline: schema, join, cell compare, aggregate

use crate::cell::CellComparator;
use crate::config::ComparisonConfig;
use crate::dataset::Dataset;
use crate::error::{Result, TabcompareError};
use crate::joiner::KeyJoiner;
use crate::report::{ComparisonReport, PairResult, ReportBuilder};
use crate::schema::{ColumnPair, SchemaComparator, SchemaMatch};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Compare two datasets under `config`.
///
/// Returns a complete report or one of the configuration, schema or
/// comparison errors; panics raised while comparing are converted into
/// comparison errors.
pub fn compare(a: &Dataset, b: &Dataset, config: &ComparisonConfig) -> Result<ComparisonReport> {
    ComparisonEngine::new(config.clone()).run(a, b)
}

/// Cooperative cancellation shared between a caller and a running comparison
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Comparison engine
pub struct ComparisonEngine {
    config: ComparisonConfig,
    cancel: Option<CancelFlag>,
}

impl ComparisonEngine {
    pub fn new(config: ComparisonConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Check `flag` between phases and stop early once it is set
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Run the full pipeline
    pub fn run(&self, a: &Dataset, b: &Dataset) -> Result<ComparisonReport> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(a, b))) {
            Ok(result) => result.map_err(|e| {
                if e.is_engine_error() {
                    e
                } else {
                    TabcompareError::comparison(e.to_string())
                }
            }),
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("Comparison aborted: {}", detail);
                Err(TabcompareError::comparison(format!(
                    "internal failure during comparison: {}",
                    detail
                )))
            }
        }
    }

    fn run_pipeline(&self, a: &Dataset, b: &Dataset) -> Result<ComparisonReport> {
        let config = &self.config;
        config.validate()?;
        a.validate()?;
        b.validate()?;

        let schema = SchemaComparator::compare(a.columns(), b.columns(), config.case_sensitive);
        log::debug!(
            "Schema: {} common, {} only in A, {} only in B, {} type mismatches",
            schema.diff.common.len(),
            schema.diff.only_in_a.len(),
            schema.diff.only_in_b.len(),
            schema.diff.type_mismatches.len()
        );

        let join_columns = self.resolve_join_columns(&schema)?;
        let compare_columns = self.resolve_compare_columns(&schema, &join_columns);
        self.check_cancelled("before joining")?;

        let joiner = KeyJoiner::new(&join_columns, config.case_sensitive, config.null_key_policy);
        let join = joiner.join(a, b);
        self.check_cancelled("before cell comparison")?;

        let comparator = CellComparator::from_config(config);
        let results = join
            .pairs
            .par_iter()
            .map(|pair| {
                let key = joiner.key_values_a(a, pair.index_a);
                let outcomes = comparator.compare_row(
                    &a.rows()[pair.index_a],
                    &b.rows()[pair.index_b],
                    &compare_columns,
                    &key,
                )?;
                Ok(PairResult {
                    pair: *pair,
                    key,
                    outcomes,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "Compared {} matched pairs over {} columns",
            results.len(),
            compare_columns.len()
        );
        self.check_cancelled("before aggregation")?;

        let report = ReportBuilder::new(a, b, &join_columns, &compare_columns).build(schema, join, results);

        log::info!(
            "Compared {} vs {} rows: {} matched, {} only in A, {} only in B, {} mismatches",
            report.summary.total_rows_a,
            report.summary.total_rows_b,
            report.row_partition.matched_count,
            report.row_partition.only_in_a_count,
            report.row_partition.only_in_b_count,
            report.summary.total_mismatches
        );

        Ok(report)
    }

    fn resolve_join_columns(&self, schema: &SchemaMatch) -> Result<Vec<ColumnPair>> {
        let mut resolved = Vec::with_capacity(self.config.join_columns.len());
        let mut missing = Vec::new();

        for name in &self.config.join_columns {
            if schema.is_ambiguous(name) {
                return Err(TabcompareError::configuration(format!(
                    "join column '{}' matches more than one column when case_sensitive is false",
                    name
                )));
            }

            match schema.resolve(name) {
                Some(pair) if resolved.iter().any(|p: &ColumnPair| p.name == pair.name) => {
                    return Err(TabcompareError::configuration(format!(
                        "join column '{}' is listed more than once",
                        name
                    )));
                }
                Some(pair) => resolved.push(pair.clone()),
                None => missing.push(name.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(TabcompareError::configuration(format!(
                "join columns not present in both datasets: {}",
                missing.join(", ")
            )));
        }

        Ok(resolved)
    }

    fn resolve_compare_columns(
        &self,
        schema: &SchemaMatch,
        join_columns: &[ColumnPair],
    ) -> Vec<ColumnPair> {
        let is_join = |pair: &ColumnPair| join_columns.iter().any(|j| j.name == pair.name);

        if self.config.compare_columns.is_empty() {
            return schema.pairs.iter().filter(|p| !is_join(p)).cloned().collect();
        }

        let mut selected: Vec<ColumnPair> = Vec::new();
        for name in &self.config.compare_columns {
            match schema.resolve(name) {
                Some(pair) if is_join(pair) => {
                    log::debug!("Skipping join column '{}' from cell comparison", name);
                }
                Some(pair) if selected.iter().any(|s| s.name == pair.name) => {}
                Some(pair) => selected.push(pair.clone()),
                None => log::debug!("Skipping compare column '{}': not in both datasets", name),
            }
        }
        selected
    }

    fn check_cancelled(&self, phase: &str) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => {
                log::info!("Comparison cancelled {}", phase);
                Err(TabcompareError::comparison(format!(
                    "comparison cancelled {}",
                    phase
                )))
            }
            _ => Ok(()),
        }
    }
}
