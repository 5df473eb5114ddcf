//! Comparison configuration and persisted workspace settings

use crate::error::{Result, TabcompareError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How rows with a null join-key component take part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullKeyPolicy {
    /// Never matched; reported as rows unique to their dataset
    #[default]
    Unmatched,
    /// Left out of the row partition entirely
    Drop,
    /// Null equals null as a key component
    MatchNulls,
}

impl NullKeyPolicy {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "unmatched" => Ok(Self::Unmatched),
            "drop" => Ok(Self::Drop),
            "match" | "match_nulls" | "match-nulls" => Ok(Self::MatchNulls),
            _ => Err(format!(
                "Invalid null key policy: {}. Use 'unmatched', 'drop', or 'match'",
                s
            )),
        }
    }
}

/// Inputs that steer a single comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Ordered join (key) columns, required
    pub join_columns: Vec<String>,
    /// Columns to cell-compare; empty means every common non-key column
    pub compare_columns: Vec<String>,
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
    pub case_sensitive: bool,
    pub null_key_policy: NullKeyPolicy,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            join_columns: Vec::new(),
            compare_columns: Vec::new(),
            absolute_tolerance: 0.0,
            relative_tolerance: 0.0,
            case_sensitive: true,
            null_key_policy: NullKeyPolicy::default(),
        }
    }
}

impl ComparisonConfig {
    pub fn new<S: Into<String>>(join_columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            join_columns: join_columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_compare_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.compare_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_absolute_tolerance(mut self, tolerance: f64) -> Self {
        self.absolute_tolerance = tolerance;
        self
    }

    pub fn with_relative_tolerance(mut self, tolerance: f64) -> Self {
        self.relative_tolerance = tolerance;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_null_key_policy(mut self, policy: NullKeyPolicy) -> Self {
        self.null_key_policy = policy;
        self
    }

    /// Apply persisted defaults for everything except the column selections
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.absolute_tolerance = settings.absolute_tolerance;
        self.relative_tolerance = settings.relative_tolerance;
        self.case_sensitive = settings.case_sensitive;
        self.null_key_policy = settings.null_key_policy;
        self
    }

    /// Reject configurations that cannot drive a comparison
    pub fn validate(&self) -> Result<()> {
        if self.join_columns.is_empty() {
            return Err(TabcompareError::configuration(
                "at least one join column is required",
            ));
        }

        if self.join_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(TabcompareError::configuration(
                "join column names must not be empty",
            ));
        }

        check_tolerance("absolute_tolerance", self.absolute_tolerance)?;
        check_tolerance("relative_tolerance", self.relative_tolerance)?;

        Ok(())
    }
}

fn check_tolerance(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(TabcompareError::configuration(format!(
            "{} must be a finite, non-negative number (got {})",
            name, value
        )));
    }
    Ok(())
}

/// Defaults stored in the workspace `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
    pub case_sensitive: bool,
    pub null_key_policy: NullKeyPolicy,
    /// Store each comparison in the workspace result cache
    pub cache_results: bool,
    /// Rows shown per section by the pretty printer
    pub max_display_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            absolute_tolerance: 0.0,
            relative_tolerance: 0.0,
            case_sensitive: true,
            null_key_policy: NullKeyPolicy::default(),
            cache_results: true,
            max_display_rows: crate::DEFAULT_DISPLAY_ROWS,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            TabcompareError::workspace(format!(
                "Invalid settings file '{}': {}",
                path.display(),
                e
            ))
        })?;

        check_tolerance("absolute_tolerance", settings.absolute_tolerance)?;
        check_tolerance("relative_tolerance", settings.relative_tolerance)?;

        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
