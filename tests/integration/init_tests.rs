//! Integration tests for the init command

use crate::common::{assertions, CliTestRunner};

#[test]
fn test_init_command_success() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);

    let fixture = runner.fixture();
    assertions::assert_dir_exists(&fixture.workspace.workspace_dir);
    assertions::assert_file_exists_and_not_empty(&fixture.workspace.config_path);
    assertions::assert_json_contains_keys(
        &fixture.workspace.config_path,
        &["absolute_tolerance", "relative_tolerance", "case_sensitive", "null_key_policy"],
    )
    .unwrap();

    let gitignore_path = fixture.workspace.root.join(".gitignore");
    assertions::assert_file_exists_and_not_empty(&gitignore_path);
}

#[test]
fn test_init_command_is_idempotent() {
    let runner = CliTestRunner::new().unwrap();

    runner.expect_success(&["init"]);
    runner.expect_success(&["init"]);

    let content = std::fs::read_to_string(runner.fixture().root().join(".gitignore")).unwrap();
    assert_eq!(content.matches(".tabcompare/").count(), 1);
}

#[test]
fn test_init_keeps_settings_without_force() {
    let runner = CliTestRunner::new().unwrap();
    let config_path = &runner.fixture().workspace.config_path;
    std::fs::write(config_path, r#"{"absolute_tolerance": 0.25}"#).unwrap();

    runner.expect_success(&["init"]);
    let settings = runner.fixture().workspace.load_settings().unwrap();
    assert_eq!(settings.absolute_tolerance, 0.25);

    runner.expect_success(&["init", "--force"]);
    let settings = runner.fixture().workspace.load_settings().unwrap();
    assert_eq!(settings.absolute_tolerance, 0.0);
}

#[test]
fn test_init_preserves_existing_gitignore() {
    let runner = CliTestRunner::new().unwrap();
    let gitignore_path = runner.fixture().root().join(".gitignore");
    std::fs::write(&gitignore_path, "# Existing content\n*.log\n").unwrap();

    runner.expect_success(&["init"]);

    let content = std::fs::read_to_string(&gitignore_path).unwrap();
    assert!(content.contains("# Existing content"));
    assert!(content.contains("*.log"));
    assert!(content.contains(".tabcompare/*.duckdb*"));
}

#[test]
fn test_init_in_explicit_workspace_directory() {
    let runner = CliTestRunner::new().unwrap();
    let nested = runner.fixture().root().join("nested");
    std::fs::create_dir_all(&nested).unwrap();

    runner.expect_success(&["--workspace", nested.to_str().unwrap(), "init"]);

    assertions::assert_dir_exists(&nested.join(".tabcompare"));
}
