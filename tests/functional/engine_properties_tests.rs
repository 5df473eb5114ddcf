//! Properties every comparison must satisfy

use crate::common::sample_data;
use tabcompare::{compare, ComparisonConfig, ComparisonReport, Dataset, NullKeyPolicy, Value};

fn reversed(dataset: &Dataset) -> Dataset {
    let rows = dataset.rows().iter().rev().cloned().collect();
    Dataset::new(dataset.columns().to_vec(), rows).unwrap()
}

fn rotated(dataset: &Dataset, by: usize) -> Dataset {
    let mut rows = dataset.rows().to_vec();
    let len = rows.len().max(1);
    rows.rotate_left(by % len);
    Dataset::new(dataset.columns().to_vec(), rows).unwrap()
}

/// A report with its unique-row lists replaced by a sorted rendering
fn normalized(mut report: ComparisonReport) -> (ComparisonReport, Vec<String>, Vec<String>) {
    let mut only_a: Vec<String> = report
        .row_partition
        .only_in_a_rows
        .drain(..)
        .map(|row| format!("{:?}", row))
        .collect();
    let mut only_b: Vec<String> = report
        .row_partition
        .only_in_b_rows
        .drain(..)
        .map(|row| format!("{:?}", row))
        .collect();
    only_a.sort();
    only_b.sort();
    (report, only_a, only_b)
}

fn drifted(rows: usize) -> Dataset {
    let base = sample_data::people(rows);
    let data = base
        .rows()
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 7 != 3)
        .map(|(i, row)| {
            let mut row = row.clone();
            if let Value::Float(score) = row[2] {
                row[2] = Value::Float(score + (i % 4) as f64 * 0.004);
            }
            if i % 5 == 1 {
                row[1] = Value::from(row[1].to_string().to_uppercase());
            }
            row
        })
        .collect();
    Dataset::new(base.columns().to_vec(), data).unwrap()
}

#[test]
fn test_partition_counts_add_up_for_every_policy() {
    let a = Dataset::from_rows(
        vec!["k", "v"],
        vec![
            vec![Value::Integer(1), Value::Integer(1)],
            vec![Value::Null, Value::Integer(2)],
            vec![Value::Integer(3), Value::Integer(3)],
            vec![Value::Integer(3), Value::Integer(4)],
        ],
    )
    .unwrap();
    let b = Dataset::from_rows(
        vec!["k", "v"],
        vec![
            vec![Value::Null, Value::Integer(2)],
            vec![Value::Integer(3), Value::Integer(3)],
            vec![Value::Integer(5), Value::Integer(5)],
        ],
    )
    .unwrap();

    for policy in [NullKeyPolicy::Unmatched, NullKeyPolicy::Drop, NullKeyPolicy::MatchNulls] {
        let config = ComparisonConfig::new(["k"]).with_null_key_policy(policy);
        let report = compare(&a, &b, &config).unwrap();
        let p = &report.row_partition;

        assert_eq!(p.only_in_a_count + p.matched_count + p.dropped_rows_a, 4, "{:?}", policy);
        assert_eq!(p.only_in_b_count + p.matched_count + p.dropped_rows_b, 3, "{:?}", policy);
        assert_eq!(p.only_in_a_rows.len(), p.only_in_a_count);
        assert_eq!(p.only_in_b_rows.len(), p.only_in_b_count);
        assert_eq!(p.null_key_rows_a, 1);
        assert_eq!(p.null_key_rows_b, 1);
    }
}

#[test]
fn test_swapping_inputs_mirrors_the_partition() {
    let a = sample_data::people(30);
    let b = drifted(30);
    let config = ComparisonConfig::new(["id"]).with_absolute_tolerance(0.005);

    let forward = compare(&a, &b, &config).unwrap();
    let backward = compare(&b, &a, &config).unwrap();

    assert_eq!(forward.row_partition.matched_count, backward.row_partition.matched_count);
    assert_eq!(forward.row_partition.only_in_a_count, backward.row_partition.only_in_b_count);
    assert_eq!(forward.row_partition.only_in_b_count, backward.row_partition.only_in_a_count);
    assert_eq!(forward.mismatches.len(), backward.mismatches.len());
    assert_eq!(forward.overall_match_rate, backward.overall_match_rate);
}

#[test]
fn test_row_order_does_not_change_the_report() {
    let a = sample_data::people(25);
    let b = drifted(25);
    let config = ComparisonConfig::new(["id"]).with_absolute_tolerance(0.005);

    let expected = normalized(compare(&a, &b, &config).unwrap());

    for (pa, pb) in [
        (reversed(&a), b.clone()),
        (a.clone(), reversed(&b)),
        (rotated(&a, 7), rotated(&b, 11)),
    ] {
        assert_eq!(normalized(compare(&pa, &pb, &config).unwrap()), expected);
    }
}

#[test]
fn test_tolerance_never_increases_mismatches() {
    let a = sample_data::people(40);
    let b = drifted(40);
    let tolerances = [0.0, 0.001, 0.004, 0.008, 0.02, 1.0];

    let counts = |config_for: &dyn Fn(f64) -> ComparisonConfig| -> Vec<Vec<usize>> {
        tolerances
            .iter()
            .map(|&t| {
                let report = compare(&a, &b, &config_for(t)).unwrap();
                report
                    .per_column_stats
                    .values()
                    .filter_map(|stats| stats.mismatch_count)
                    .collect()
            })
            .collect()
    };

    let absolute = counts(&|t| ComparisonConfig::new(["id"]).with_absolute_tolerance(t));
    let relative = counts(&|t| ComparisonConfig::new(["id"]).with_relative_tolerance(t));

    for series in [absolute, relative] {
        for window in series.windows(2) {
            for (looser, tighter) in window[1].iter().zip(&window[0]) {
                assert!(looser <= tighter, "{:?}", series);
            }
        }
    }
}

#[test]
fn test_case_insensitive_self_compare_is_clean() {
    let a = sample_data::people(5);

    for join in ["id", "name"] {
        let config = ComparisonConfig::new([join]).with_case_sensitive(false);
        let report = compare(&a, &a, &config).unwrap();
        assert_eq!(report.overall_match_rate, 1.0);
        assert!(report.mismatches.is_empty());
    }
}

#[test]
fn test_self_compare_round_trip() {
    let a = sample_data::people(50);
    let all_columns: Vec<&str> = a.column_names();
    let config = ComparisonConfig::new(["id"]).with_compare_columns(all_columns);

    let report = compare(&a, &a, &config).unwrap();

    assert!(report.mismatches.is_empty());
    assert_eq!(report.row_partition.only_in_a_count, 0);
    assert_eq!(report.row_partition.only_in_b_count, 0);
    assert_eq!(report.row_partition.matched_count, 50);
    assert!(report.is_identical());
    assert_eq!(report.summary.compared_columns, vec!["name", "score", "active", "bonus"]);
}

#[test]
fn test_duplicate_keys_pair_deterministically() {
    let a = Dataset::from_rows(
        vec!["k", "v"],
        vec![
            vec![Value::from("k"), Value::Integer(1)],
            vec![Value::from("k"), Value::Integer(2)],
        ],
    )
    .unwrap();
    let b = Dataset::from_rows(vec!["k", "v"], vec![vec![Value::from("k"), Value::Integer(1)]])
        .unwrap();
    let config = ComparisonConfig::new(["k"]);

    let first = compare(&a, &b, &config).unwrap();
    for _ in 0..20 {
        assert_eq!(compare(&a, &b, &config).unwrap(), first);
    }

    assert_eq!(first.row_partition.matched_count, 1);
    assert!(first.mismatches.is_empty());
    assert_eq!(first.row_partition.only_in_a_rows.len(), 1);
    assert_eq!(first.row_partition.only_in_a_rows[0]["v"], Value::Integer(2));
    assert_eq!(first.row_partition.duplicate_keys_a, vec![vec![Value::from("k")]]);
    assert!(first.row_partition.duplicate_keys_b.is_empty());
}
