//! Error types for tabcompare operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabcompareError>;

#[derive(Error, Debug)]
pub enum TabcompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Schema incompatible: {message}")]
    SchemaIncompatible { message: String },

    #[error("Comparison error: {message}{}", describe_context(.column, .key))]
    Comparison {
        message: String,
        column: Option<String>,
        key: Option<String>,
    },

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Report not found: {id}")]
    ReportNotFound { id: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl TabcompareError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn schema_incompatible(msg: impl Into<String>) -> Self {
        Self::SchemaIncompatible {
            message: msg.into(),
        }
    }

    pub fn comparison(msg: impl Into<String>) -> Self {
        Self::Comparison {
            message: msg.into(),
            column: None,
            key: None,
        }
    }

    /// Comparison failure tied to a specific cell
    pub fn comparison_at(
        msg: impl Into<String>,
        column: impl Into<String>,
        key: Option<String>,
    ) -> Self {
        Self::Comparison {
            message: msg.into(),
            column: Some(column.into()),
            key,
        }
    }

    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn report_not_found(id: impl Into<String>) -> Self {
        Self::ReportNotFound { id: id.into() }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// True for the three kinds the comparison engine is allowed to return
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::SchemaIncompatible { .. } | Self::Comparison { .. }
        )
    }
}

fn describe_context(column: &Option<String>, key: &Option<String>) -> String {
    match (column, key) {
        (Some(column), Some(key)) => format!(" (column '{}', key {})", column, key),
        (Some(column), None) => format!(" (column '{}')", column),
        (None, Some(key)) => format!(" (key {})", key),
        (None, None) => String::new(),
    }
}
