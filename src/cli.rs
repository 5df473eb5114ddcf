//! Command-line interface for tabcompare

use crate::config::NullKeyPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabcompare")]
#[command(about = "Key-based comparison of two tabular datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Logging threshold selected by `--verbose`
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize tabcompare workspace
    Init {
        /// Rewrite the settings file even if the workspace exists
        #[arg(long)]
        force: bool,
    },

    /// Compare two datasets joined on key columns
    Compare {
        /// Base dataset (csv, tsv, parquet, json, jsonl or .sql)
        base: PathBuf,

        /// Dataset compared against the base
        compare: PathBuf,

        /// Join (key) columns, comma separated
        #[arg(long, short = 'j', value_delimiter = ',', required = true)]
        join: Vec<String>,

        /// Columns to compare; defaults to every common non-key column
        #[arg(long, short = 'c', value_delimiter = ',')]
        columns: Vec<String>,

        /// Absolute numeric tolerance
        #[arg(long, value_parser = parse_tolerance)]
        abs_tol: Option<f64>,

        /// Relative numeric tolerance
        #[arg(long, value_parser = parse_tolerance)]
        rel_tol: Option<f64>,

        /// Compare strings and keys case-insensitively
        #[arg(long)]
        ignore_case: bool,

        /// Null key handling: "unmatched", "drop", or "match"
        #[arg(long, value_parser = NullKeyPolicy::parse)]
        null_keys: Option<NullKeyPolicy>,

        /// Output format: "pretty", "json", "csv" (summary row only)
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Write the full report as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Do not store the result in the workspace cache
        #[arg(long)]
        no_cache: bool,

        /// Entries shown per section in pretty output
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a cached comparison report
    Show {
        /// Report id or unique id prefix
        id: String,

        /// Output format: "pretty", "json", "csv" (summary row only)
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Entries shown per section in pretty output
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List cached comparisons
    List {
        /// Output format: "pretty", "json", "csv"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Remove a cached comparison
    Forget {
        /// Report id or unique id prefix
        id: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Pretty,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!(
                "Invalid output format: {}. Use 'pretty', 'json' or 'csv'",
                s
            )),
        }
    }
}

/// Validate that a tolerance is a finite, non-negative number
fn parse_tolerance(s: &str) -> Result<f64, String> {
    let tolerance: f64 = s
        .parse()
        .map_err(|_| format!("Invalid tolerance: '{}'. Must be a number.", s))?;

    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(format!("Tolerance must be finite and non-negative: {}", s));
    }

    Ok(tolerance)
}
