//! Common test utilities and helpers

use std::fs;
use std::path::{Path, PathBuf};
use tabcompare::{Result, TabcompareWorkspace};
use tempfile::TempDir;

/// Test fixture manager for creating temporary test environments
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub workspace: TabcompareWorkspace,
}

impl TestFixture {
    /// Create a new test fixture with initialized workspace
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let workspace = TabcompareWorkspace::create_new(temp_dir.path().to_path_buf())?;

        Ok(Self { temp_dir, workspace })
    }

    /// Create a new test fixture without touching the filesystem
    pub fn new_empty() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let workspace = TabcompareWorkspace::from_root(temp_dir.path().to_path_buf());

        Ok(Self { temp_dir, workspace })
    }

    /// Get the root path of the test fixture
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a test CSV file with sample data
    pub fn create_csv(&self, name: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let mut content = String::new();
        for row in data {
            content.push_str(&row.join(","));
            content.push('\n');
        }
        self.create_csv_raw(name, &content)
    }

    /// Create a test file with raw string content
    pub fn create_csv_raw(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.root().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a test JSON file with sample data
    pub fn create_json(&self, name: &str, data: &serde_json::Value) -> Result<PathBuf> {
        let path = self.root().join(name);
        fs::write(&path, serde_json::to_string_pretty(data)?)?;
        Ok(path)
    }
}

/// Helper for running CLI commands in tests
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    /// Run a tabcompare command and return the result
    pub fn run_command(&self, args: &[&str]) -> Result<()> {
        use clap::Parser;
        use tabcompare::cli::Cli;
        use tabcompare::commands::execute_command;

        let mut cmd_args = vec!["tabcompare"];
        cmd_args.extend(args);

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| tabcompare::TabcompareError::invalid_input(e.to_string()))?;

        // Default to the fixture root when no --workspace flag is given
        let workspace_path = cli.workspace.as_deref().or(Some(self.fixture.root()));
        execute_command(cli.command, workspace_path)
    }

    /// Run a command and expect it to succeed
    pub fn expect_success(&self, args: &[&str]) {
        self.run_command(args).expect("Command should succeed");
    }

    /// Run a command and expect it to fail
    pub fn expect_failure(&self, args: &[&str]) -> tabcompare::TabcompareError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// Sample data generators for testing
pub mod sample_data {
    use tabcompare::{Dataset, Value};

    pub fn base_csv_data() -> Vec<Vec<&'static str>> {
        vec![
            vec!["id", "name", "price"],
            vec!["1", "Apple", "1.50"],
            vec!["2", "Banana", "0.75"],
            vec!["3", "Cherry", "2.00"],
        ]
    }

    pub fn updated_csv_data() -> Vec<Vec<&'static str>> {
        vec![
            vec!["id", "name", "price"],
            vec!["1", "Apple", "1.60"], // Price changed
            vec!["2", "Banana", "0.75"],
            vec!["4", "Date", "3.00"], // New row, Cherry removed
        ]
    }

    /// `{id:1,val:10}, {id:2,val:20}`
    pub fn scenario_a() -> Dataset {
        Dataset::from_rows(
            vec!["id", "val"],
            vec![
                vec![Value::Integer(1), Value::Integer(10)],
                vec![Value::Integer(2), Value::Integer(20)],
            ],
        )
        .unwrap()
    }

    /// `{id:1,val:10.0000001}, {id:3,val:30}`
    pub fn scenario_b() -> Dataset {
        Dataset::from_rows(
            vec!["id", "val"],
            vec![
                vec![Value::Integer(1), Value::Float(10.0000001)],
                vec![Value::Integer(3), Value::Float(30.0)],
            ],
        )
        .unwrap()
    }

    /// Mixed-kind dataset with unique integer keys
    pub fn people(rows: usize) -> Dataset {
        let names = ["Ada", "grace", "ALAN", "Edsger", "barbara"];
        let data = (0..rows)
            .map(|i| {
                vec![
                    Value::Integer(i as i64),
                    Value::from(names[i % names.len()]),
                    Value::Float(i as f64 * 1.25),
                    Value::Boolean(i % 2 == 0),
                    if i % 3 == 0 { Value::Null } else { Value::Integer(i as i64 * 7) },
                ]
            })
            .collect();
        Dataset::from_rows(vec!["id", "name", "score", "active", "bonus"], data).unwrap()
    }
}

/// Assertion helpers for test validation
pub mod assertions {
    use std::path::Path;
    use tabcompare::Result;

    /// Assert that a file exists and is not empty
    pub fn assert_file_exists_and_not_empty(path: &Path) {
        assert!(path.exists(), "File should exist: {}", path.display());
        let metadata = std::fs::metadata(path).expect("Should be able to read file metadata");
        assert!(metadata.len() > 0, "File should not be empty: {}", path.display());
    }

    /// Assert that a directory exists
    pub fn assert_dir_exists(path: &Path) {
        assert!(path.exists(), "Directory should exist: {}", path.display());
        assert!(path.is_dir(), "Path should be a directory: {}", path.display());
    }

    /// Assert that a JSON file contains expected keys
    pub fn assert_json_contains_keys(path: &Path, keys: &[&str]) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&content)?;

        for key in keys {
            assert!(
                json.get(key).is_some(),
                "JSON should contain key '{}': {}",
                key,
                path.display()
            );
        }

        Ok(())
    }
}
