//! Worked comparison scenarios with fully known reports

use crate::common::sample_data::{scenario_a, scenario_b};
use tabcompare::cell::MismatchKind;
use tabcompare::{compare, ComparisonConfig, DataType, Value};

#[test]
fn test_within_tolerance_reports_no_mismatches() {
    let config = ComparisonConfig::new(["id"]).with_absolute_tolerance(0.001);
    let report = compare(&scenario_a(), &scenario_b(), &config).unwrap();

    let partition = &report.row_partition;
    assert_eq!(partition.matched_count, 1);
    assert_eq!(partition.only_in_a_count, 1);
    assert_eq!(partition.only_in_b_count, 1);

    assert_eq!(partition.only_in_a_rows.len(), 1);
    assert_eq!(partition.only_in_a_rows[0]["id"], Value::Integer(2));
    assert_eq!(partition.only_in_a_rows[0]["val"], Value::Integer(20));
    assert_eq!(partition.only_in_b_rows[0]["id"], Value::Integer(3));
    assert_eq!(partition.only_in_b_rows[0]["val"], Value::Float(30.0));

    assert!(report.mismatches.is_empty());
    assert_eq!(report.overall_match_rate, 0.5);

    let stats = &report.per_column_stats["val"];
    assert_eq!(stats.match_count, Some(1));
    assert_eq!(stats.mismatch_count, Some(0));
    assert_eq!(stats.match_rate, Some(1.0));
}

#[test]
fn test_zero_tolerance_reports_single_mismatch() {
    let config = ComparisonConfig::new(["id"]);
    let report = compare(&scenario_a(), &scenario_b(), &config).unwrap();

    assert_eq!(report.mismatches.len(), 1);
    let mismatch = &report.mismatches[0];
    assert_eq!(mismatch.key, vec![Value::Integer(1)]);
    assert_eq!(mismatch.column, "val");
    assert_eq!(mismatch.value_a, Value::Integer(10));
    assert_eq!(mismatch.value_b, Value::Float(10.0000001));
    assert_eq!(mismatch.kind, MismatchKind::Value);

    assert_eq!(report.summary.total_mismatches, 1);
    assert_eq!(report.summary.rows_with_mismatches, 1);
    assert_eq!(report.per_column_stats["val"].match_rate, Some(0.0));
    assert_eq!(report.overall_match_rate, 0.5);
}

#[test]
fn test_integer_float_column_is_a_type_difference_in_schema() {
    let report = compare(&scenario_a(), &scenario_b(), &ComparisonConfig::new(["id"])).unwrap();

    let diff = &report.schema_diff;
    assert_eq!(diff.common, vec!["id", "val"]);
    assert!(diff.only_in_a.is_empty());
    assert!(diff.only_in_b.is_empty());
    assert_eq!(diff.type_mismatches["val"].type_a, DataType::Integer);
    assert_eq!(diff.type_mismatches["val"].type_b, DataType::Float);

    let stats = &report.per_column_stats["val"];
    assert!(!stats.dtype_match);
    assert!(report.per_column_stats["id"].dtype_match);
    assert!(!report.per_column_stats["id"].is_compared());
}

#[test]
fn test_relative_tolerance_scales_with_magnitude() {
    let a = tabcompare::Dataset::from_rows(
        vec!["id", "amount"],
        vec![
            vec![Value::Integer(1), Value::Float(1000.0)],
            vec![Value::Integer(2), Value::Float(1.0)],
        ],
    )
    .unwrap();
    let b = tabcompare::Dataset::from_rows(
        vec!["id", "amount"],
        vec![
            vec![Value::Integer(1), Value::Float(1004.0)],
            vec![Value::Integer(2), Value::Float(1.5)],
        ],
    )
    .unwrap();

    let config = ComparisonConfig::new(["id"]).with_relative_tolerance(0.01);
    let report = compare(&a, &b, &config).unwrap();

    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].key, vec![Value::Integer(2)]);
}
