//! Custom assertion helpers for integration tests.

#![allow(dead_code)]

use lp_protocol::log_models::{LogEntry, LogLevel};
use lp_protocol::run_models::{PipelineRun, StepName};

/// Assert that every line of an NDJSON log is a valid entry carrying
/// `run_id`, and that source context is all-or-nothing.
pub fn assert_valid_log_lines(content: &str) -> Vec<serde_json::Value> {
    let mut values = Vec::new();
    for line in content.lines() {
        let value: serde_json::Value = serde_json::from_str(line)
            .unwrap_or_else(|err| panic!("Invalid JSON line {line:?}: {err}"));

        assert!(
            value.get("run_id").and_then(|v| v.as_str()).is_some(),
            "Entry without run_id: {line}"
        );

        let context_fields = ["source_file", "line_number", "function_name"]
            .iter()
            .filter(|field| value.get(**field).is_some())
            .count();
        assert!(
            context_fields == 0 || context_fields == 3,
            "Partial source context: {line}"
        );

        serde_json::from_str::<LogEntry>(line)
            .unwrap_or_else(|err| panic!("Line does not parse as LogEntry {line:?}: {err}"));
        values.push(value);
    }
    values
}

/// Count entries at `level` whose message contains `needle`.
pub fn count_entries(entries: &[LogEntry], level: LogLevel, needle: &str) -> usize {
    entries
        .iter()
        .filter(|entry| entry.level == level && entry.message.contains(needle))
        .count()
}

/// The `complete` summary entry; panics if missing.
pub fn summary_entry(entries: &[LogEntry]) -> &LogEntry {
    entries
        .iter()
        .rev()
        .find(|entry| entry.step == "complete")
        .expect("Run should end with a complete entry")
}

/// Assert that step results appear in non-decreasing pipeline order.
pub fn assert_results_in_order(run: &PipelineRun) {
    let orders: Vec<usize> = run.steps_executed.iter().map(|r| r.order).collect();
    let mut sorted = orders.clone();
    sorted.sort();
    assert_eq!(orders, sorted, "Step results out of order");
}

/// Assert that no step other than `allowed` has more than one result.
pub fn assert_no_duplicates_except(run: &PipelineRun, allowed: &[StepName]) {
    for name in StepName::PIPELINE {
        if allowed.contains(&name) {
            continue;
        }
        assert!(
            run.results_for(name).len() <= 1,
            "Duplicate results for {name}"
        );
    }
}
