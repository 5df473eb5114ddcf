//! Output formatting utilities

use crate::cache::CacheEntry;
use crate::error::Result;
use crate::report::ComparisonReport;
use crate::value::{format_key, Value};
use indexmap::IndexMap;

/// Pretty printer for tabcompare output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a comparison report, showing at most `limit` entries per list
    pub fn print_report(report: &ComparisonReport, title: &str, limit: usize) {
        println!("{}", Self::render_report(report, title, limit));
    }

    pub fn render_report(report: &ComparisonReport, title: &str, limit: usize) -> String {
        let mut lines = vec![format!("🔍 Comparison: {}", title)];
        let partition = &report.row_partition;
        let summary = &report.summary;

        lines.push(format!(
            "├─ Rows: {} base, {} compare",
            summary.total_rows_a, summary.total_rows_b
        ));
        lines.push(format!("│  ├─ Matched: {}", partition.matched_count));
        lines.push(format!("│  ├─ Only in base: {}", partition.only_in_a_count));
        lines.push(format!("│  └─ Only in compare: {}", partition.only_in_b_count));
        lines.push(format!(
            "├─ Join columns: {}",
            summary.join_columns.join(", ")
        ));

        let diff = &report.schema_diff;
        if diff.has_changes() {
            lines.push("├─ ❌ Schema: differs".to_string());
            let mut details = Vec::new();
            if !diff.only_in_a.is_empty() {
                details.push(format!("Only in base: {}", diff.only_in_a.join(", ")));
            }
            if !diff.only_in_b.is_empty() {
                details.push(format!("Only in compare: {}", diff.only_in_b.join(", ")));
            }
            for (column, mismatch) in &diff.type_mismatches {
                details.push(format!(
                    "Type: {}: {} → {}",
                    column, mismatch.type_a, mismatch.type_b
                ));
            }
            push_items(&mut lines, "│  ", &details, details.len());
        } else if diff.common.is_empty() {
            lines.push("├─ ⚠️  Schema: no common columns".to_string());
        } else {
            lines.push(format!("├─ ✅ Schema: {} common columns", diff.common.len()));
        }

        let key_notes = key_notes(report);
        if !key_notes.is_empty() {
            lines.push("├─ ⚠️  Keys".to_string());
            push_items(&mut lines, "│  ", &key_notes, key_notes.len());
        }

        if !report.per_column_stats.is_empty() {
            lines.push("├─ Columns:".to_string());
            let column_lines: Vec<String> = report
                .per_column_stats
                .iter()
                .map(|(name, stats)| match (stats.match_count, stats.mismatch_count, stats.match_rate) {
                    (Some(matches), Some(mismatches), Some(rate)) => format!(
                        "{}: {} matched, {} mismatched ({})",
                        name,
                        matches,
                        mismatches,
                        format_rate(rate)
                    ),
                    _ => format!("{}: not compared", name),
                })
                .collect();
            push_items(&mut lines, "│  ", &column_lines, column_lines.len());
        }

        if report.mismatches.is_empty() {
            lines.push("├─ ✅ Mismatches: none".to_string());
        } else {
            lines.push(format!(
                "├─ ❌ Mismatches: {} in {} rows",
                summary.total_mismatches, summary.rows_with_mismatches
            ));
            let mismatch_lines: Vec<String> = report
                .mismatches
                .iter()
                .map(|m| {
                    format!(
                        "{} {}: {} → {} ({})",
                        format_key(&m.key),
                        m.column,
                        m.value_a,
                        m.value_b,
                        m.kind.as_str()
                    )
                })
                .collect();
            push_items(&mut lines, "│  ", &mismatch_lines, limit);
        }

        if !partition.only_in_a_rows.is_empty() {
            lines.push(format!("├─ Only in base ({}):", partition.only_in_a_count));
            let rows: Vec<String> = partition.only_in_a_rows.iter().map(format_row).collect();
            push_items(&mut lines, "│  ", &rows, limit);
        }

        if !partition.only_in_b_rows.is_empty() {
            lines.push(format!("├─ Only in compare ({}):", partition.only_in_b_count));
            let rows: Vec<String> = partition.only_in_b_rows.iter().map(format_row).collect();
            push_items(&mut lines, "│  ", &rows, limit);
        }

        lines.push(format!(
            "└─ Overall match rate: {}",
            format_rate(report.overall_match_rate)
        ));

        lines.join("\n")
    }

    /// Print the cached comparison list
    pub fn print_cache_list(entries: &[CacheEntry]) {
        if entries.is_empty() {
            println!("No cached comparisons found.");
            return;
        }

        println!("🗂️  Cached comparisons:");
        for (i, entry) in entries.iter().enumerate() {
            let prefix = if i == entries.len() - 1 { "└─" } else { "├─" };
            println!(
                "{} {}  {} → {}  {} matched, {} mismatches ({})  {}",
                prefix,
                short_id(&entry.id),
                entry.base_source,
                entry.compare_source,
                entry.common_rows,
                entry.total_mismatches,
                format_rate(entry.match_rate),
                entry.created_at
            );
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format a report together with the id it was cached under
    pub fn format_report(report: &ComparisonReport, report_id: Option<&str>) -> Result<String> {
        let json = serde_json::json!({
            "report_id": report_id,
            "report": report,
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}

/// Two-column CSV summary of a comparison
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn format_summary(report: &ComparisonReport) -> String {
        let partition = &report.row_partition;
        let rows = [
            ("Base Rows", report.summary.total_rows_a.to_string()),
            ("Compare Rows", report.summary.total_rows_b.to_string()),
            ("Common Rows", partition.matched_count.to_string()),
            ("Base Only Rows", partition.only_in_a_count.to_string()),
            ("Compare Only Rows", partition.only_in_b_count.to_string()),
            ("Match Rate", format_rate(report.overall_match_rate)),
        ];

        let mut csv = String::from("Metric,Value\n");
        for (metric, value) in rows {
            csv.push_str(&format!("{},{}\n", metric, value));
        }
        csv
    }

    /// One line per cached comparison
    pub fn format_cache_list(entries: &[CacheEntry]) -> String {
        let mut csv = String::from(
            "id,base_source,compare_source,common_rows,total_mismatches,match_rate,created_at\n",
        );
        for entry in entries {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                entry.id,
                csv_field(&entry.base_source),
                csv_field(&entry.compare_source),
                entry.common_rows,
                entry.total_mismatches,
                format_rate(entry.match_rate),
                csv_field(&entry.created_at)
            ));
        }
        csv
    }
}

/// Quote a field when it holds a separator, quote or line break
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Leading segment of a report id, enough to address it from the CLI
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn key_notes(report: &ComparisonReport) -> Vec<String> {
    let partition = &report.row_partition;
    let mut notes = Vec::new();

    if !partition.duplicate_keys_a.is_empty() {
        notes.push(format!(
            "Duplicate keys in base: {}",
            format_keys(&partition.duplicate_keys_a)
        ));
    }
    if !partition.duplicate_keys_b.is_empty() {
        notes.push(format!(
            "Duplicate keys in compare: {}",
            format_keys(&partition.duplicate_keys_b)
        ));
    }
    if partition.null_key_rows_a > 0 || partition.null_key_rows_b > 0 {
        notes.push(format!(
            "Rows with null keys: {} base, {} compare",
            partition.null_key_rows_a, partition.null_key_rows_b
        ));
    }
    if partition.dropped_rows_a > 0 || partition.dropped_rows_b > 0 {
        notes.push(format!(
            "Dropped: {} base, {} compare",
            partition.dropped_rows_a, partition.dropped_rows_b
        ));
    }

    notes
}

fn format_keys(keys: &[Vec<Value>]) -> String {
    const SHOWN: usize = 5;
    let mut text = keys
        .iter()
        .take(SHOWN)
        .map(|k| format_key(k))
        .collect::<Vec<_>>()
        .join(", ");
    if keys.len() > SHOWN {
        text.push_str(&format!(" ... ({} total)", keys.len()));
    }
    text
}

fn format_row(row: &IndexMap<String, Value>) -> String {
    let fields: Vec<String> = row
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// Append `items` as tree children, truncated to `limit` entries
fn push_items(lines: &mut Vec<String>, indent: &str, items: &[String], limit: usize) {
    let shown = items.len().min(limit);
    let truncated = items.len() > shown;

    for (i, item) in items.iter().take(shown).enumerate() {
        let last = i == shown - 1 && !truncated;
        let marker = if last { "└─" } else { "├─" };
        lines.push(format!("{}{} {}", indent, marker, item));
    }

    if truncated {
        lines.push(format!("{}└─ ... and {} more", indent, items.len() - shown));
    }
}

fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
