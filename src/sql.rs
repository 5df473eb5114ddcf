//! `.sql` source files: an optional ATTACH comment, setup statements and a SELECT

use crate::error::{Result, TabcompareError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// A parsed SQL source file
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFile {
    /// `ATTACH ...` statement taken from a leading comment, if any
    pub connection_string: Option<String>,
    /// Statements that run before the query (`USE`, `CREATE`, ...)
    pub setup: Vec<String>,
    pub query: String,
    pub source_path: PathBuf,
}

impl SqlFile {
    /// The ATTACH statement with `{VAR}` placeholders filled from the environment
    pub fn resolved_connection(&self) -> Result<Option<String>> {
        self.connection_string
            .as_deref()
            .map(substitute_env_vars)
            .transpose()
    }
}

/// Parse a SQL file into its connection comment, setup statements and query
pub fn parse_sql_file(file_path: &Path) -> Result<SqlFile> {
    let content = fs::read_to_string(file_path).map_err(|e| {
        TabcompareError::invalid_input(format!(
            "Failed to read SQL file '{}': {}",
            file_path.display(),
            e
        ))
    })?;

    let mut connection_string = None;
    let mut setup_lines = Vec::new();
    let mut query_lines = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(comment) = trimmed
            .strip_prefix("--")
            .or_else(|| trimmed.strip_prefix("//"))
        {
            let comment = comment.trim();
            if connection_string.is_none() && is_attach_statement(comment) {
                connection_string = Some(comment.to_string());
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        if !query_lines.is_empty() || trimmed.to_uppercase().starts_with("SELECT") {
            query_lines.push(line);
        } else {
            setup_lines.push(trimmed);
        }
    }

    if query_lines.is_empty() {
        return Err(TabcompareError::invalid_input(format!(
            "No SELECT query found in file '{}'",
            file_path.display()
        )));
    }

    let query = query_lines
        .join("\n")
        .trim()
        .trim_end_matches(';')
        .trim_end()
        .to_string();

    Ok(SqlFile {
        connection_string,
        setup: split_statements(&setup_lines.join("\n")),
        query,
        source_path: file_path.to_path_buf(),
    })
}

fn is_attach_statement(comment: &str) -> bool {
    let upper = comment.to_uppercase();
    upper.starts_with("ATTACH")
        && (upper.contains("MYSQL")
            || upper.contains("POSTGRES")
            || upper.contains("SQLITE")
            || upper.contains("TYPE"))
}

fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Substitute `{VAR_NAME}` placeholders with environment variables
pub fn substitute_env_vars(connection_string: &str) -> Result<String> {
    let mut result = connection_string.to_string();

    let mut start = 0;
    while let Some(open_pos) = result[start..].find('{') {
        let open_pos = start + open_pos;
        match result[open_pos..].find('}') {
            Some(close_pos) => {
                let close_pos = open_pos + close_pos;
                let var_name = &result[open_pos + 1..close_pos];

                let var_value = env::var(var_name).map_err(|_| {
                    TabcompareError::invalid_input(format!(
                        "Environment variable '{}' not found",
                        var_name
                    ))
                })?;

                result.replace_range(open_pos..=close_pos, &var_value);
                start = open_pos + var_value.len();
            }
            None => break,
        }
    }

    Ok(result)
}

/// Check if a file is a SQL file
pub fn is_sql_file(file_path: &Path) -> bool {
    file_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("sql"))
        .unwrap_or(false)
}
