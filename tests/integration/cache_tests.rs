//! Integration tests for the workspace result cache

use crate::common::{sample_data, CliTestRunner, TestFixture};
use tabcompare::cache::SourceLabels;
use tabcompare::fingerprint::comparison_fingerprint;
use tabcompare::loader::DatasetLoader;
use tabcompare::{compare, ComparisonConfig, TabcompareError};

#[test]
fn test_loaded_report_survives_cache_round_trip() {
    let fixture = TestFixture::new().unwrap();
    let base = fixture.create_csv("base.csv", &sample_data::base_csv_data()).unwrap();
    let updated = fixture.create_csv("updated.csv", &sample_data::updated_csv_data()).unwrap();

    let loader = DatasetLoader::new().unwrap();
    let a = loader.load_path(&base).unwrap();
    let b = loader.load_path(&updated).unwrap();
    let config = ComparisonConfig::new(["id"]);
    let report = compare(&a, &b, &config).unwrap();

    let cache = fixture.workspace.result_cache();
    let fingerprint = comparison_fingerprint(&a, &b, &config).unwrap();
    let id = cache
        .store(&report, &fingerprint, &SourceLabels::new("base.csv", "updated.csv"))
        .unwrap();

    assert_eq!(cache.retrieve(&id).unwrap(), report);
    assert_eq!(cache.lookup(&fingerprint).unwrap(), Some(id.clone()));
    assert_eq!(cache.mismatch_count(&id).unwrap(), report.mismatches.len() as u64);
    assert!(fixture.workspace.cache_path.exists());
}

#[test]
fn test_list_returns_every_stored_report() {
    let fixture = TestFixture::new().unwrap();
    let cache = fixture.workspace.result_cache();
    let report = compare(
        &sample_data::scenario_a(),
        &sample_data::scenario_b(),
        &ComparisonConfig::new(["id"]),
    )
    .unwrap();

    let first = cache.store(&report, "fp-1", &SourceLabels::new("a", "b")).unwrap();
    let second = cache.store(&report, "fp-2", &SourceLabels::new("c", "d")).unwrap();

    let entries = cache.list().unwrap();
    assert_eq!(entries.len(), 2);
    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert!(ids.contains(&first.as_str()));
    assert!(ids.contains(&second.as_str()));
    assert!(entries.iter().all(|e| e.match_rate == 0.5));
}

#[test]
fn test_cli_show_list_and_forget() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let base = fixture.create_csv("base.csv", &sample_data::base_csv_data()).unwrap();
    let updated = fixture.create_csv("updated.csv", &sample_data::updated_csv_data()).unwrap();

    runner.expect_success(&[
        "compare",
        base.to_str().unwrap(),
        updated.to_str().unwrap(),
        "--join",
        "id",
    ]);

    let cache = fixture.workspace.result_cache();
    let entries = cache.list().unwrap();
    assert_eq!(entries.len(), 1);
    let id = entries[0].id.clone();
    assert!(entries[0].base_source.ends_with("base.csv"));

    runner.expect_success(&["list"]);
    runner.expect_success(&["list", "--format", "json"]);
    runner.expect_success(&["show", &id]);
    runner.expect_success(&["show", &id[..8], "--format", "json"]);

    runner.expect_success(&["forget", &id]);
    assert!(cache.list().unwrap().is_empty());

    let err = runner.expect_failure(&["show", &id]);
    assert!(matches!(err, TabcompareError::ReportNotFound { .. }));
}

#[test]
fn test_repeated_compare_reuses_cached_report() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let base = fixture.create_csv("base.csv", &sample_data::base_csv_data()).unwrap();
    let updated = fixture.create_csv("updated.csv", &sample_data::updated_csv_data()).unwrap();
    let args = [
        "compare",
        base.to_str().unwrap(),
        updated.to_str().unwrap(),
        "--join",
        "id",
    ];

    runner.expect_success(&args);
    runner.expect_success(&args);
    assert_eq!(fixture.workspace.result_cache().list().unwrap().len(), 1);

    // A different tolerance is a different comparison
    let mut with_tolerance = args.to_vec();
    with_tolerance.extend(["--abs-tol", "0.5"]);
    runner.expect_success(&with_tolerance);
    assert_eq!(fixture.workspace.result_cache().list().unwrap().len(), 2);
}

#[test]
fn test_no_cache_flag_and_setting() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let base = fixture.create_csv("base.csv", &sample_data::base_csv_data()).unwrap();
    let updated = fixture.create_csv("updated.csv", &sample_data::updated_csv_data()).unwrap();
    let base = base.to_str().unwrap();
    let updated = updated.to_str().unwrap();

    runner.expect_success(&["compare", base, updated, "--join", "id", "--no-cache"]);
    assert!(fixture.workspace.result_cache().list().unwrap().is_empty());

    std::fs::write(&fixture.workspace.config_path, r#"{"cache_results": false}"#).unwrap();
    runner.expect_success(&["compare", base, updated, "--join", "id"]);
    assert!(fixture.workspace.result_cache().list().unwrap().is_empty());
}
